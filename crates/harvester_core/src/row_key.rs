use crate::record::Record;

/// Number of leading non-empty fields that make up a row key.
pub const ROW_KEY_FIELDS: usize = 3;
/// Characters kept from each contributing field.
pub const ROW_KEY_PREFIX_CHARS: usize = 50;
pub const ROW_KEY_DELIMITER: char = '|';

/// Session-scoped identity of a record, used only for dedup.
///
/// Built from the first [`ROW_KEY_FIELDS`] non-empty values, each cut to
/// [`ROW_KEY_PREFIX_CHARS`] characters, so re-renders of the same row that
/// differ only in trailing content still collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey(String);

impl RowKey {
    pub fn from_record(record: &Record) -> Self {
        let mut key = String::new();
        let leading = record
            .values()
            .flatten()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .take(ROW_KEY_FIELDS);
        for (i, value) in leading.enumerate() {
            if i > 0 {
                key.push(ROW_KEY_DELIMITER);
            }
            key.extend(value.chars().take(ROW_KEY_PREFIX_CHARS));
        }
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
