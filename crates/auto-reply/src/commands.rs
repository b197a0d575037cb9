/// A prefixed chat command split into its name and positional words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation<'a> {
    /// Lowercased command name without the prefix.
    pub name: String,
    pub args: Vec<&'a str>,
}

/// Parse `message` as a command when it starts with `prefix`.
///
/// A bare prefix or a blank prefix never parses.
#[must_use]
pub fn parse_command<'a>(prefix: &str, message: &'a str) -> Option<CommandInvocation<'a>> {
    if prefix.is_empty() {
        return None;
    }
    let rest = message.trim().strip_prefix(prefix)?;
    let mut words = rest.split_whitespace();
    let name = words.next().filter(|_| !rest.starts_with(char::is_whitespace))?;
    Some(CommandInvocation {
        name: name.to_lowercase(),
        args: words.collect(),
    })
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("!gptmode", Some(("gptmode", vec![])))]
    #[case("  !GPTM steve pirate ", Some(("gptm", vec!["steve", "pirate"])))]
    #[case("!mode   pirate", Some(("mode", vec!["pirate"])))]
    #[case("! mode", None)]
    #[case("!", None)]
    #[case("gptmode", None)]
    fn parses_prefixed_commands(#[case] message: &str, #[case] expected: Option<(&str, Vec<&str>)>) {
        let parsed = parse_command("!", message).map(|c| (c.name, c.args));
        assert_eq!(
            parsed,
            expected.map(|(name, args)| (name.to_string(), args))
        );
    }

    #[test]
    fn blank_prefix_disables_commands() {
        assert_eq!(parse_command("", "gptmode"), None);
    }

    #[test]
    fn multi_char_prefix() {
        let parsed = parse_command("//", "//mode pirate").unwrap_or_else(|| panic!("no parse"));
        assert_eq!(parsed.name, "mode");
        assert_eq!(parsed.args, vec!["pirate"]);
    }
}
