//! Post-processing of model output before it goes back into game chat.

use std::sync::LazyLock;

use regex::Regex;

/// Emoji (with their modifiers, joiners and variation selectors) and
/// Han/Kana/Hangul glyphs, which the game font cannot render. ASCII digits
/// carry the `Emoji_Component` property and are kept.
static BAD_SYMBOLS: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"[[\p{Emoji}\p{Emoji_Presentation}\p{Emoji_Modifier}\p{Emoji_Modifier_Base}\p{Emoji_Component}\u{200D}\p{Han}\p{Hiragana}\p{Katakana}\p{Hangul}]--[0-9]]",
    )
    .ok()
});

static WHITESPACE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s+").ok());

const ELLIPSIS: &str = "...";

/// Strip unrenderable symbols, collapse whitespace runs to one space and trim.
#[must_use]
pub fn clear_bad_symbols(text: &str) -> String {
    let stripped = match BAD_SYMBOLS.as_ref() {
        Some(re) => re.replace_all(text, ""),
        None => text.into(),
    };
    let collapsed = match WHITESPACE.as_ref() {
        Some(re) => re.replace_all(&stripped, " ").into_owned(),
        None => stripped.into_owned(),
    };
    collapsed.trim().to_string()
}

/// Cut `text` to at most `max_chars` characters, ending with `...` when cut.
#[must_use]
pub fn truncate_reply(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("Hello 👋 world", "Hello world")]
    #[case("  Привет,   мир!  ", "Привет, мир!")]
    #[case("你好 friend こんにちは 안녕", "friend")]
    #[case("Score: 10 points 🎉🎉", "Score: 10 points")]
    #[case("family 👨‍👩‍👧 time", "family time")]
    #[case("thumbs 👍🏽 up", "thumbs up")]
    #[case("line\nbreak\ttab", "line break tab")]
    #[case("", "")]
    fn strips_symbols_and_collapses_space(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(clear_bad_symbols(input), expected);
    }

    #[test]
    fn patterns_compile() {
        assert!(BAD_SYMBOLS.is_some());
        assert!(WHITESPACE.is_some());
    }

    #[test]
    fn short_reply_is_untouched() {
        assert_eq!(truncate_reply("short", 250), "short");
        let exact = "a".repeat(250);
        assert_eq!(truncate_reply(&exact, 250), exact);
    }

    #[test]
    fn long_reply_is_cut_to_limit() {
        let long = "б".repeat(300);
        let cut = truncate_reply(&long, 250);
        assert_eq!(cut.chars().count(), 250);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().filter(|c| *c == 'б').count(), 247);
    }
}
