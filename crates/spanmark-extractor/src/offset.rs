//! Byte to character offset conversion
//!
//! Regex matches report byte offsets, entity spans use character offsets.
//! `CharIndex` is built once per text and answers lookups in O(1).

/// Byte offset -> character offset map for one text
pub struct CharIndex {
    byte_to_char: Vec<usize>,
    is_ascii: bool,
}

impl CharIndex {
    pub fn new(text: &str) -> Self {
        if text.is_ascii() {
            return Self {
                byte_to_char: Vec::new(),
                is_ascii: true,
            };
        }

        // One slot per byte plus the end position. Continuation bytes map to
        // the character they belong to.
        let mut byte_to_char = vec![0; text.len() + 1];
        for (char_idx, (byte_idx, ch)) in text.char_indices().enumerate() {
            for slot in &mut byte_to_char[byte_idx..byte_idx + ch.len_utf8()] {
                *slot = char_idx;
            }
        }
        byte_to_char[text.len()] = text.chars().count();

        Self {
            byte_to_char,
            is_ascii: false,
        }
    }

    /// Character offset of a byte offset on a char boundary
    pub fn char_offset(&self, byte_idx: usize) -> usize {
        if self.is_ascii {
            byte_idx
        } else {
            self.byte_to_char
                .get(byte_idx)
                .copied()
                .unwrap_or_else(|| self.byte_to_char.last().copied().unwrap_or(0))
        }
    }

    /// Convert a byte range to a character range
    pub fn char_range(&self, byte_start: usize, byte_end: usize) -> (usize, usize) {
        (self.char_offset(byte_start), self.char_offset(byte_end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_is_identity() {
        let index = CharIndex::new("hello world");
        assert_eq!(index.char_range(6, 11), (6, 11));
    }

    #[test]
    fn test_multibyte() {
        // "é" is 2 bytes, "€" is 3 bytes
        let text = "café costs €50";
        let index = CharIndex::new(text);

        let byte_start = text.find('€').unwrap();
        let byte_end = text.len();
        assert_eq!(index.char_range(byte_start, byte_end), (11, 14));
        assert_eq!(index.char_offset(text.find("costs").unwrap()), 5);
    }

    #[test]
    fn test_end_of_text() {
        let text = "naïve";
        let index = CharIndex::new(text);
        assert_eq!(index.char_offset(text.len()), 5);
    }
}
