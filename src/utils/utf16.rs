//! UTF-16 offset helpers
//!
//! Document positions are counted in UTF-16 code units while run text is
//! stored as Rust strings, so every split goes through these conversions.

/// Number of UTF-16 code units in `text`
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Byte offset of the UTF-16 offset `offset` in `text`
///
/// Returns `None` when the offset is past the end or falls between the two
/// halves of a surrogate pair.
pub fn byte_offset(text: &str, offset: usize) -> Option<usize> {
    let mut units = 0;
    for (byte, ch) in text.char_indices() {
        if units == offset {
            return Some(byte);
        }
        if units > offset {
            return None;
        }
        units += ch.len_utf16();
    }
    (units == offset).then_some(text.len())
}

/// Split `text` at a UTF-16 offset
pub fn split_at(text: &str, offset: usize) -> Option<(&str, &str)> {
    byte_offset(text, offset).map(|byte| text.split_at(byte))
}

/// Character starting at the UTF-16 offset `offset`
pub fn char_at(text: &str, offset: usize) -> Option<char> {
    let byte = byte_offset(text, offset)?;
    text[byte..].chars().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_offsets() {
        assert_eq!(utf16_len("hello"), 5);
        assert_eq!(byte_offset("hello", 0), Some(0));
        assert_eq!(byte_offset("hello", 5), Some(5));
        assert_eq!(byte_offset("hello", 6), None);
    }

    #[test]
    fn test_surrogate_pairs() {
        // U+1F600 is two UTF-16 units and four UTF-8 bytes
        let text = "a\u{1F600}b";
        assert_eq!(utf16_len(text), 4);
        assert_eq!(byte_offset(text, 1), Some(1));
        assert_eq!(byte_offset(text, 2), None);
        assert_eq!(byte_offset(text, 3), Some(5));
        assert_eq!(split_at(text, 3), Some(("a\u{1F600}", "b")));
    }

    #[test]
    fn test_char_at() {
        assert_eq!(char_at("ab\ncd", 2), Some('\n'));
        assert_eq!(char_at("ab", 2), None);
    }
}
