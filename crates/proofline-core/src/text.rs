//! UTF-16 offset helpers and a rope-backed text buffer.
//!
//! Grammar services and the DOM both count text in UTF-16 code units, while
//! Rust strings are UTF-8. Everything that slices host text goes through
//! these conversions.

use ropey::Rope;
use smol_str::{SmolStr, ToSmolStr};

use crate::types::TextRange;

/// Length of `s` in UTF-16 code units.
pub fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

/// Convert a UTF-16 offset into a byte index of `s`.
///
/// Returns `None` when the offset lies past the end or between the two
/// halves of a surrogate pair.
pub fn utf16_to_byte(s: &str, utf16_offset: usize) -> Option<usize> {
    let mut units = 0;
    for (byte_idx, ch) in s.char_indices() {
        if units == utf16_offset {
            return Some(byte_idx);
        }
        units += ch.len_utf16();
        if units > utf16_offset {
            return None;
        }
    }
    (units == utf16_offset).then_some(s.len())
}

/// Slice `s` by a UTF-16 range.
pub fn slice_utf16(s: &str, range: TextRange) -> Option<&str> {
    let start = utf16_to_byte(s, range.start)?;
    let end = utf16_to_byte(s, range.end())?;
    s.get(start..end)
}

/// Rope-backed text addressed in UTF-16 code units.
///
/// Used as the storage of in-memory hosts so replacements stay O(log n)
/// regardless of where they land.
#[derive(Clone, Debug, Default)]
pub struct HostText {
    rope: Rope,
}

impl HostText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_str(s: &str) -> Self {
        Self {
            rope: Rope::from_str(s),
        }
    }

    pub fn len_utf16(&self) -> usize {
        self.rope.len_utf16_cu()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Char index for a UTF-16 offset, rejecting offsets inside a surrogate pair.
    fn char_index(&self, utf16_offset: usize) -> Option<usize> {
        if utf16_offset > self.rope.len_utf16_cu() {
            return None;
        }
        let char_idx = self.rope.utf16_cu_to_char(utf16_offset);
        (self.rope.char_to_utf16_cu(char_idx) == utf16_offset).then_some(char_idx)
    }

    /// Get a slice as SmolStr. Returns None if the range is invalid.
    pub fn slice(&self, range: TextRange) -> Option<SmolStr> {
        let start = self.char_index(range.start)?;
        let end = self.char_index(range.end())?;
        Some(self.rope.slice(start..end).to_smolstr())
    }

    /// Replace a UTF-16 range with `text`. Returns false if the range is invalid.
    pub fn replace(&mut self, range: TextRange, text: &str) -> bool {
        let (Some(start), Some(end)) = (self.char_index(range.start), self.char_index(range.end()))
        else {
            return false;
        };
        self.rope.remove(start..end);
        self.rope.insert(start, text);
        true
    }

    pub fn to_string(&self) -> String {
        self.rope.to_string()
    }
}

impl From<&str> for HostText {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}
