use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use super::{HeaderCell, HeaderEntry, HeaderList, HeaderRow, HeaderSet, HeaderSetError};
use crate::debounce::Debouncer;

/// Editing session over the request headers table.
///
/// Holds the committed rows plus the implicit draft row, and decides when an
/// edit is pushed outward: typing into a key or value is debounced and also
/// flushed when the field loses focus; toggling or deleting a row is pushed at
/// once. Outward updates carry the full [`HeaderList`]; the receiver commits
/// them through [`ConfigurationStore::commit_headers`](crate::ConfigurationStore::commit_headers).
///
/// Row indices are display indices: `0..len` are committed rows and `len` is the draft.
#[derive(Debug)]
pub struct HeaderEditor {
    header_set: HeaderSet,
    entries: HeaderList,
    sync_required: bool,
    debouncer: Debouncer<HeaderList>,
}

impl HeaderEditor {
    pub fn new(
        header_set: HeaderSet,
        entries: HeaderList,
        delay: Duration,
        sink: UnboundedSender<HeaderList>,
    ) -> HeaderEditor {
        HeaderEditor {
            header_set,
            entries,
            sync_required: false,
            debouncer: Debouncer::new(delay, sink),
        }
    }

    pub fn entries(&self) -> &[HeaderEntry] {
        &self.entries
    }

    pub fn rows(&self) -> Vec<HeaderRow> {
        HeaderSet::rows(&self.entries)
    }

    /// Index of the draft row
    pub fn draft_index(&self) -> usize {
        self.entries.len()
    }

    pub const fn sync_required(&self) -> bool {
        self.sync_required
    }

    /// Types into a key cell. Masking follows the new key as it is typed.
    pub fn edit_key(&mut self, row: usize, key: impl Into<String>) -> Result<(), HeaderSetError> {
        let row = self.promote_draft(row);
        let mut edited = HeaderSet::set_cell(&self.entries, row, HeaderCell::Key(key.into()))?;
        edited[row] = self.header_set.recompute_masking(edited[row].clone());
        self.entries = edited;
        self.edited();
        Ok(())
    }

    /// Types into a value cell
    pub fn edit_value(
        &mut self,
        row: usize,
        value: impl Into<String>,
    ) -> Result<(), HeaderSetError> {
        let row = self.promote_draft(row);
        self.entries = HeaderSet::set_cell(&self.entries, row, HeaderCell::Value(value.into()))?;
        self.edited();
        Ok(())
    }

    /// A key or value field lost focus
    pub fn blur(&mut self) {
        if self.sync_required {
            self.sync_required = false;
            self.debouncer.flush(self.entries.clone());
        }
    }

    pub fn set_enabled(&mut self, row: usize, enabled: bool) -> Result<(), HeaderSetError> {
        self.entries = HeaderSet::set_cell(&self.entries, row, HeaderCell::Enabled(enabled))?;
        self.sync_now();
        Ok(())
    }

    /// Removes a committed row. The draft row cannot be deleted.
    pub fn delete_row(&mut self, row: usize) -> Result<(), HeaderSetError> {
        self.entries = HeaderSet::delete_row(&self.entries, row)?;
        self.sync_now();
        Ok(())
    }

    /// Shows or hides the value of a row whose key is sensitive; other rows are left alone.
    /// Returns whether the row changed. Never propagates outward.
    pub fn reveal(&mut self, row: usize) -> Result<bool, HeaderSetError> {
        let entry = self
            .entries
            .get(row)
            .ok_or(HeaderSetError::IndexOutOfRange {
                index: row,
                len: self.entries.len(),
            })?;
        if !self.header_set.can_reveal(entry) {
            return Ok(false);
        }
        let masked = !entry.masked;
        self.entries = HeaderSet::set_cell(&self.entries, row, HeaderCell::Masked(masked))?;
        Ok(true)
    }

    /// Typing into the draft row turns it into a committed row; a new draft takes its place.
    fn promote_draft(&mut self, row: usize) -> usize {
        if row == self.draft_index() {
            self.entries = HeaderSet::append_blank_row(&self.entries);
        }
        row
    }

    fn edited(&mut self) {
        self.sync_required = true;
        self.debouncer.push(self.entries.clone());
    }

    fn sync_now(&mut self) {
        self.sync_required = false;
        self.debouncer.flush(self.entries.clone());
    }
}
