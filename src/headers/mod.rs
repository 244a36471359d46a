//! Request headers as the user edits them and as the network sees them.
//!
//! The editor works on an ordered [`HeaderList`] in which keys may repeat and
//! rows may be disabled; requests consume the canonical [`HeaderMap`] derived
//! from it. Every operation here is a pure value transformation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

mod editor;
mod sensitive;

pub use editor::HeaderEditor;
pub use sensitive::{DEFAULT_SENSITIVE_HEADER, SensitiveHeaders};

/// Canonical header name to value map sent with requests
pub type HeaderMap = BTreeMap<String, String>;

/// Ordered, editable header rows
pub type HeaderList = Vec<HeaderEntry>;

const MASKED_VALUE: &str = "••••••••";

/// One editable header row
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub enabled: bool,
    pub key: String,
    pub value: String,
    /// Display-only: hides the value in the editor, never changes what is sent
    pub masked: bool,
}

impl HeaderEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> HeaderEntry {
        HeaderEntry {
            enabled: true,
            key: key.into(),
            value: value.into(),
            masked: false,
        }
    }

    /// The enabled, empty row that new headers are typed into
    pub fn blank() -> HeaderEntry {
        HeaderEntry::new("", "")
    }

    /// What the editor shows in the value column
    pub fn display_value(&self) -> &str {
        if self.masked { MASKED_VALUE } else { &self.value }
    }
}

/// A column of a [`HeaderEntry`] together with the value to write into it
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeaderCell {
    Enabled(bool),
    Key(String),
    Value(String),
    Masked(bool),
}

/// A row as the display layer lays it out.
///
/// Committed rows come first; the list always ends with exactly one `Draft`,
/// the blank row a new header is typed into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeaderRow {
    Committed(HeaderEntry),
    Draft,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderSetError {
    /// A row operation named a row that does not exist. This is a caller bug.
    #[error("header row {index} is out of range for a list of {len} rows")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Converts between [`HeaderList`] and [`HeaderMap`] and derives masking
/// from the configured [`SensitiveHeaders`].
#[derive(Clone, Debug, Default)]
pub struct HeaderSet {
    sensitive: SensitiveHeaders,
}

impl HeaderSet {
    pub const fn new(sensitive: SensitiveHeaders) -> HeaderSet {
        HeaderSet { sensitive }
    }

    pub const fn sensitive(&self) -> &SensitiveHeaders {
        &self.sensitive
    }

    pub fn is_sensitive(&self, key: &str) -> bool {
        self.sensitive.contains(key)
    }

    /// One enabled entry per map key in map order, masked when the key is sensitive.
    ///
    /// The blank row used to add headers is not part of the list; see [`HeaderSet::rows`].
    pub fn from_map(&self, headers: &HeaderMap) -> HeaderList {
        headers
            .iter()
            .map(|(key, value)| HeaderEntry {
                masked: self.is_sensitive(key),
                ..HeaderEntry::new(key.as_str(), value.as_str())
            })
            .collect()
    }

    /// Folds enabled, non-empty-key entries left to right; a later entry for a
    /// key overwrites an earlier one.
    pub fn to_map(list: &[HeaderEntry]) -> HeaderMap {
        list.iter()
            .filter(|entry| entry.enabled && !entry.key.is_empty())
            .fold(HeaderMap::new(), |mut headers, entry| {
                headers.insert(entry.key.clone(), entry.value.clone());
                headers
            })
    }

    /// Returns a copy of `list` with one cell of one row replaced.
    pub fn set_cell(
        list: &[HeaderEntry],
        row: usize,
        cell: HeaderCell,
    ) -> Result<HeaderList, HeaderSetError> {
        let mut edited = list.to_vec();
        let entry = edited
            .get_mut(row)
            .ok_or(HeaderSetError::IndexOutOfRange {
                index: row,
                len: list.len(),
            })?;
        match cell {
            HeaderCell::Enabled(enabled) => entry.enabled = enabled,
            HeaderCell::Key(key) => entry.key = key,
            HeaderCell::Value(value) => entry.value = value,
            HeaderCell::Masked(masked) => entry.masked = masked,
        }
        Ok(edited)
    }

    pub fn append_blank_row(list: &[HeaderEntry]) -> HeaderList {
        let mut appended = list.to_vec();
        appended.push(HeaderEntry::blank());
        appended
    }

    pub fn delete_row(list: &[HeaderEntry], row: usize) -> Result<HeaderList, HeaderSetError> {
        if row >= list.len() {
            return Err(HeaderSetError::IndexOutOfRange {
                index: row,
                len: list.len(),
            });
        }
        let mut remaining = list.to_vec();
        remaining.remove(row);
        Ok(remaining)
    }

    /// Masking follows the key: sensitive keys are masked, all others are not.
    pub fn recompute_masking(&self, entry: HeaderEntry) -> HeaderEntry {
        HeaderEntry {
            masked: self.is_sensitive(&entry.key),
            ..entry
        }
    }

    /// Whether the editor offers the reveal action for `entry`
    pub fn can_reveal(&self, entry: &HeaderEntry) -> bool {
        self.is_sensitive(&entry.key)
    }

    /// Flips masking without touching key or value
    pub fn reveal(entry: HeaderEntry) -> HeaderEntry {
        HeaderEntry {
            masked: !entry.masked,
            ..entry
        }
    }

    pub fn rows(list: &[HeaderEntry]) -> Vec<HeaderRow> {
        list.iter()
            .cloned()
            .map(HeaderRow::Committed)
            .chain(std::iter::once(HeaderRow::Draft))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use speculoos::prelude::*;

    use super::*;

    #[fixture]
    fn header_set() -> HeaderSet {
        HeaderSet::new(SensitiveHeaders::new([DEFAULT_SENSITIVE_HEADER]))
    }

    fn map(pairs: &[(&str, &str)]) -> HeaderMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[rstest]
    #[case::empty(&[])]
    #[case::single(&[("content-type", "application/json")])]
    #[case::with_secret(&[("x-hasura-admin-secret", "s3cr3t"), ("x-hasura-role", "user")])]
    #[case::empty_value(&[("x-trace", "")])]
    fn map_survives_a_round_trip(header_set: HeaderSet, #[case] pairs: &[(&str, &str)]) {
        let headers = map(pairs);
        let list = header_set.from_map(&headers);
        assert_eq!(HeaderSet::to_map(&list), headers);
    }

    #[rstest]
    fn from_map_masks_sensitive_keys(header_set: HeaderSet) {
        let list = header_set.from_map(&map(&[
            ("x-hasura-admin-secret", "s3cr3t"),
            ("x-hasura-role", "user"),
        ]));
        assert_eq!(
            list,
            vec![
                HeaderEntry {
                    masked: true,
                    ..HeaderEntry::new("x-hasura-admin-secret", "s3cr3t")
                },
                HeaderEntry::new("x-hasura-role", "user"),
            ]
        );
    }

    #[test]
    fn to_map_skips_disabled_and_empty_keys_and_keeps_the_last_value() {
        let list = vec![
            HeaderEntry::new("x-role", "admin"),
            HeaderEntry {
                enabled: false,
                ..HeaderEntry::new("x-disabled", "1")
            },
            HeaderEntry::new("", "orphan value"),
            HeaderEntry::new("x-role", "user"),
            HeaderEntry {
                enabled: false,
                ..HeaderEntry::new("x-role", "ignored")
            },
        ];
        assert_eq!(HeaderSet::to_map(&list), map(&[("x-role", "user")]));
    }

    #[rstest]
    #[case::masked_before(true)]
    #[case::unmasked_before(false)]
    fn masking_follows_the_key(header_set: HeaderSet, #[case] masked_before: bool) {
        let sensitive = HeaderEntry {
            masked: masked_before,
            ..HeaderEntry::new("x-hasura-admin-secret", "s3cr3t")
        };
        let plain = HeaderEntry {
            masked: masked_before,
            ..HeaderEntry::new("x-hasura-admin-secre", "s3cr3t")
        };
        assert_that!(header_set.recompute_masking(sensitive).masked).is_true();
        assert_that!(header_set.recompute_masking(plain).masked).is_false();
    }

    #[test]
    fn set_cell_leaves_the_input_untouched() {
        let list = vec![HeaderEntry::new("x-role", "admin")];
        let edited =
            HeaderSet::set_cell(&list, 0, HeaderCell::Value("user".to_string())).unwrap();
        assert_that!(list[0].value.as_str()).is_equal_to("admin");
        assert_that!(edited[0].value.as_str()).is_equal_to("user");
        assert_that!(edited[0].key.as_str()).is_equal_to("x-role");
    }

    #[rstest]
    #[case::enabled(HeaderCell::Enabled(false))]
    #[case::key(HeaderCell::Key("x-other".to_string()))]
    #[case::masked(HeaderCell::Masked(true))]
    fn set_cell_changes_exactly_one_field(#[case] cell: HeaderCell) {
        let list = vec![HeaderEntry::new("x-role", "admin")];
        let edited = HeaderSet::set_cell(&list, 0, cell.clone()).unwrap();
        let expected = match cell {
            HeaderCell::Enabled(enabled) => HeaderEntry {
                enabled,
                ..list[0].clone()
            },
            HeaderCell::Key(key) => HeaderEntry {
                key,
                ..list[0].clone()
            },
            HeaderCell::Value(value) => HeaderEntry {
                value,
                ..list[0].clone()
            },
            HeaderCell::Masked(masked) => HeaderEntry {
                masked,
                ..list[0].clone()
            },
        };
        assert_eq!(edited, vec![expected]);
    }

    #[test]
    fn row_operations_reject_missing_rows() {
        let list = vec![HeaderEntry::new("x-role", "admin")];
        assert_that!(HeaderSet::set_cell(&list, 1, HeaderCell::Enabled(false)))
            .is_err()
            .is_equal_to(HeaderSetError::IndexOutOfRange { index: 1, len: 1 });
        assert_that!(HeaderSet::delete_row(&list, 3))
            .is_err()
            .is_equal_to(HeaderSetError::IndexOutOfRange { index: 3, len: 1 });
    }

    #[test]
    fn delete_row_removes_only_that_row() {
        let list = vec![
            HeaderEntry::new("a", "1"),
            HeaderEntry::new("b", "2"),
            HeaderEntry::new("c", "3"),
        ];
        let remaining = HeaderSet::delete_row(&list, 1).unwrap();
        assert_eq!(
            remaining,
            vec![HeaderEntry::new("a", "1"), HeaderEntry::new("c", "3")]
        );
    }

    #[test]
    fn rows_always_end_with_a_single_draft() {
        assert_eq!(HeaderSet::rows(&[]), vec![HeaderRow::Draft]);
        let list = HeaderSet::append_blank_row(&[HeaderEntry::new("a", "1")]);
        assert_eq!(
            HeaderSet::rows(&list),
            vec![
                HeaderRow::Committed(HeaderEntry::new("a", "1")),
                HeaderRow::Committed(HeaderEntry::blank()),
                HeaderRow::Draft,
            ]
        );
    }

    #[rstest]
    fn reveal_flips_masking_only(header_set: HeaderSet) {
        let entry = header_set.recompute_masking(HeaderEntry::new("x-hasura-admin-secret", "s3cr3t"));
        assert_that!(entry.display_value()).is_equal_to(MASKED_VALUE);
        assert_that!(header_set.can_reveal(&entry)).is_true();

        let revealed = HeaderSet::reveal(entry.clone());
        assert_that!(revealed.display_value()).is_equal_to("s3cr3t");
        assert_eq!(HeaderSet::reveal(revealed), entry);

        assert_that!(header_set.can_reveal(&HeaderEntry::new("x-role", "user"))).is_false();
    }
}
