/// Replace `${ENV_VAR}` placeholders in raw config text.
///
/// Unresolvable variables are left as-is so API keys can also be given
/// literally.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' || chars.peek() != Some(&'{') {
            result.push(ch);
            continue;
        }
        chars.next();

        let mut var_name = String::new();
        let mut closed = false;
        for c in chars.by_ref() {
            if c == '}' {
                closed = true;
                break;
            }
            var_name.push(c);
        }

        match (closed, var_name.is_empty()) {
            (true, false) => match lookup(&var_name) {
                Some(val) => result.push_str(&val),
                None => {
                    result.push_str("${");
                    result.push_str(&var_name);
                    result.push('}');
                },
            },
            (true, true) => result.push_str("${}"),
            (false, _) => {
                result.push_str("${");
                result.push_str(&var_name);
            },
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "OPENROUTER_API_KEY" => Some("sk-or-test".to_string()),
            "PROXY_HOST" => Some("10.0.0.2".to_string()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_known_vars() {
        assert_eq!(
            substitute_env_with(
                "api_key = \"${OPENROUTER_API_KEY}\"\nhost = \"${PROXY_HOST}\"",
                lookup
            ),
            "api_key = \"sk-or-test\"\nhost = \"10.0.0.2\""
        );
    }

    #[test]
    fn leaves_unknown_var() {
        assert_eq!(
            substitute_env_with("${PARLEY_NONEXISTENT_XYZ}", lookup),
            "${PARLEY_NONEXISTENT_XYZ}"
        );
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        assert_eq!(substitute_env_with("key=${OPEN", lookup), "key=${OPEN");
        assert_eq!(substitute_env_with("cost $5 ${}", lookup), "cost $5 ${}");
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain text"), "plain text");
    }
}
