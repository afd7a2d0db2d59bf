/// Maximum length of a Telegram message text, in characters.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Split a message into chunks of at most `max_chars` characters, preferring
/// paragraph, line, sentence and word boundaries, in that order.
pub fn split_long_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut result = Vec::new();
    let mut remaining = text;

    loop {
        // Byte offset just past the `max_chars`-th character.
        let Some((limit, _)) = remaining.char_indices().nth(max_chars) else {
            result.push(remaining.to_string());
            break;
        };

        let head = &remaining[..limit];
        let chunk_end = head
            .rfind("\n\n")
            .map(|pos| pos + 2)
            .or_else(|| head.rfind('\n').map(|pos| pos + 1))
            .or_else(|| head.rfind(['.', '!', '?']).map(|pos| pos + 1))
            .or_else(|| head.rfind(' ').map(|pos| pos + 1))
            .unwrap_or(limit);

        result.push(remaining[..chunk_end].to_string());
        remaining = &remaining[chunk_end..];
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_kept() {
        assert_eq!(split_long_message("hello", 10), vec!["hello"]);
        assert_eq!(split_long_message("", 10), vec![""]);
    }

    #[test]
    fn prefers_paragraph_breaks() {
        let text = "first line\nsecond\n\nthird paragraph";
        assert_eq!(
            split_long_message(text, 22),
            vec!["first line\nsecond\n\n", "third paragraph"]
        );
    }

    #[test]
    fn falls_back_to_words_then_hard_cut() {
        assert_eq!(
            split_long_message("aaa bbb ccc", 8),
            vec!["aaa bbb ", "ccc"]
        );
        assert_eq!(split_long_message("abcdefgh", 3), vec!["abc", "def", "gh"]);
    }

    #[test]
    fn limit_is_counted_in_characters() {
        let text = "я".repeat(10);
        let parts = split_long_message(&text, 4);
        assert_eq!(parts, vec!["яяяя", "яяяя", "яя"]);
        assert_eq!(parts.concat(), text);
    }
}
