//! Pattern Search Module
//!
//! Lazy iteration over keys matching a regular expression.

use crate::cache::envelope;
use crate::cache::Value;
use crate::error::Result;
use crate::raw::RawEntry;

// == Search ==
/// Lazy sequence of `(key, value)` pairs for keys matching a pattern.
///
/// With values enabled, each envelope is decoded only when its item is
/// pulled; otherwise the value is the key itself. Bound memory with
/// `take(n)` or by consuming incrementally.
pub struct Search<'a> {
    entries: Box<dyn Iterator<Item = RawEntry> + 'a>,
    include_values: bool,
}

impl<'a> Search<'a> {
    pub(crate) fn new(entries: Box<dyn Iterator<Item = RawEntry> + 'a>, include_values: bool) -> Self {
        Self {
            entries,
            include_values,
        }
    }

    /// Drops values and yields only the matching keys.
    pub fn keys(self) -> impl Iterator<Item = String> + 'a {
        self.entries.map(|entry| entry.key)
    }
}

impl Iterator for Search<'_> {
    type Item = Result<(String, Value)>;

    fn next(&mut self) -> Option<Self::Item> {
        for entry in self.entries.by_ref() {
            if !self.include_values {
                let value = Value::Str(entry.key.clone());
                return Some(Ok((entry.key, value)));
            }

            // Stores may omit values they can no longer read
            let Some(bytes) = entry.value else {
                continue;
            };
            return Some(
                envelope::decode_keyed(&entry.key, &bytes).map(|decoded| (entry.key, decoded.data)),
            );
        }
        None
    }
}
