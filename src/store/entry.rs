//! Message Entry Types
//!
//! The immutable record held by the store, and its byte cost.

use std::fmt;
use std::sync::Arc;

/// Fixed per-entry cost charged for the stored timestamp
pub const OVERHEAD_BYTES: u64 = 8;

/// A single broadcast message.
///
/// Text is reference-counted so that copying entries out of the store for a
/// response does not duplicate message bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    timestamp: i64,
    text: Arc<str>,
}

impl Entry {
    /// Create a new entry
    pub fn new(timestamp: i64, text: impl Into<Arc<str>>) -> Self {
        Self {
            timestamp,
            text: text.into(),
        }
    }

    /// Milliseconds since the Unix epoch
    #[inline]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Message text
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte cost charged against the store budget
    #[inline]
    pub fn size(&self) -> u64 {
        entry_size(&self.text)
    }

    /// Wire form: `timestamp|text`
    pub fn to_record(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.timestamp, self.text)
    }
}

/// UTF-8 length of the text plus [`OVERHEAD_BYTES`]
#[inline]
pub fn entry_size(text: &str) -> u64 {
    text.len() as u64 + OVERHEAD_BYTES
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_size_counts_utf8_bytes() {
        assert_eq!(entry_size(""), 8);
        assert_eq!(entry_size("abc"), 11);
        // 'é' is two bytes, '€' is three
        assert_eq!(entry_size("é€"), 13);
    }

    #[test]
    fn test_entry_accessors() {
        let entry = Entry::new(1_700_000_000_000, "hello");
        assert_eq!(entry.timestamp(), 1_700_000_000_000);
        assert_eq!(entry.text(), "hello");
        assert_eq!(entry.size(), 13);
    }

    #[test]
    fn test_record_format() {
        let entry = Entry::new(42, "a|b");
        assert_eq!(entry.to_record(), "42|a|b");
        assert_eq!(Entry::new(-5, "").to_record(), "-5|");
    }

    #[test]
    fn test_clone_shares_text() {
        let entry = Entry::new(1, String::from("shared"));
        let copy = entry.clone();
        assert!(Arc::ptr_eq(&entry.text, &copy.text));
        assert_eq!(entry, copy);
    }
}
