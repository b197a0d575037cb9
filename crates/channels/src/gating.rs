/// Check whether any granted permission covers `requested`.
///
/// Grants are matched case-insensitively. A grant is either an exact name,
/// `*` (everything), or `prefix.*` (every permission under `prefix.`).
pub fn permission_granted(requested: &str, granted: &[String]) -> bool {
    let requested = requested.to_lowercase();
    granted
        .iter()
        .any(|grant| grant_covers(&grant.to_lowercase(), &requested))
}

fn grant_covers(grant: &str, requested: &str) -> bool {
    if grant == "*" {
        return true;
    }
    match grant.strip_suffix('*') {
        Some(prefix) if prefix.ends_with('.') => {
            requested.len() > prefix.len() && requested.starts_with(prefix)
        },
        _ => grant == requested,
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("user.ai", &["user.ai"], true)]
    #[case("user.ai", &["USER.AI"], true)]
    #[case("user.ai", &["user.*"], true)]
    #[case("user.ainocd", &["user.ai"], false)]
    #[case("admin.gpt", &["user.*"], false)]
    #[case("admin.gpt", &["*"], true)]
    #[case("user.ai", &[], false)]
    #[case("user.ai", &["user.a*"], false)]
    #[case("user.ai", &["*.ai"], false)]
    #[case("user", &["user.*"], false)]
    #[case("user.ai", &["admin.gpt", "USER.*"], true)]
    fn permission_matching(
        #[case] requested: &str,
        #[case] granted: &[&str],
        #[case] expected: bool,
    ) {
        let granted: Vec<String> = granted.iter().map(|s| s.to_string()).collect();
        assert_eq!(permission_granted(requested, &granted), expected);
    }

    #[rstest]
    #[case("user.*", "user.ai.chat", true)]
    #[case("user.*", "user.", false)]
    #[case("user.*", "users.ai", false)]
    #[case("abab", "abab", true)]
    fn grant_coverage(#[case] grant: &str, #[case] requested: &str, #[case] expected: bool) {
        assert_eq!(grant_covers(grant, requested), expected);
    }
}
