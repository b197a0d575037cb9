/// Case-insensitive trigger word prefixes, checked in configured order.
#[derive(Debug, Clone, Default)]
pub struct TriggerWords {
    words: Vec<String>,
}

impl TriggerWords {
    /// Blank words are dropped; the rest are lowercased and otherwise kept
    /// as configured, so a trailing space requires a word boundary.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .filter(|w| !w.trim().is_empty())
                .collect(),
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Match the trimmed message against the triggers and return the prompt
    /// that follows the first matching trigger, trimmed. The prompt may be
    /// empty.
    #[must_use]
    pub fn strip<'a>(&self, message: &'a str) -> Option<&'a str> {
        let message = message.trim();
        let lowered = message.to_lowercase();
        let trigger = self.words.iter().find(|w| lowered.starts_with(w.as_str()))?;
        Some(message[prefix_end(message, trigger.len())..].trim())
    }
}

/// Byte offset in `message` covering the first `lowered_len` bytes of its
/// lowercase form. Lowercasing may change a char's byte length, so the offset
/// is found by walking the original chars.
fn prefix_end(message: &str, lowered_len: usize) -> usize {
    let mut consumed = 0;
    for (offset, c) in message.char_indices() {
        if consumed >= lowered_len {
            return offset;
        }
        consumed += c.to_lowercase().map(char::len_utf8).sum::<usize>();
    }
    message.len()
}
