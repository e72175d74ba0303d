//! Attachment side-table
//!
//! Stores attachments separately from the run text, keyed by the position of
//! their placeholder character. Entries track position changes when text is
//! inserted or deleted, and are marked dead when their placeholder goes away
//! so that in-flight image work can tell it has been orphaned.

use super::cursor::SelectionRange;
use crate::models::{Attachment, AttachmentId};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag cleared when an attachment leaves the document
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    fn new(live: bool) -> Self {
        Self(Arc::new(AtomicBool::new(live)))
    }

    pub fn is_live(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn kill(&self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
pub struct AttachmentEntry {
    pub id: AttachmentId,
    pub attachment: Attachment,
    liveness: Liveness,
}

impl AttachmentEntry {
    /// Handle to this entry's liveness flag, for work that outlives the call
    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    pub fn is_live(&self) -> bool {
        self.liveness.is_live()
    }
}

impl Clone for AttachmentEntry {
    // A copied document must not share flags with the original: removing the
    // attachment from one copy would otherwise orphan fetches for both.
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            attachment: self.attachment.clone(),
            liveness: Liveness::new(self.liveness.is_live()),
        }
    }
}

/// Attachments by placeholder position
#[derive(Debug, Clone, Default)]
pub struct AttachmentTable {
    entries: BTreeMap<usize, AttachmentEntry>,
    next_id: u64,
}

impl AttachmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an attachment whose placeholder now sits at `pos`
    ///
    /// The caller has already shifted existing entries with [`Self::on_insert`].
    pub fn insert(&mut self, pos: usize, attachment: Attachment) -> AttachmentId {
        self.next_id += 1;
        let id = AttachmentId(self.next_id);
        let entry = AttachmentEntry {
            id,
            attachment,
            liveness: Liveness::new(true),
        };
        if let Some(replaced) = self.entries.insert(pos, entry) {
            log::warn!("Attachment {} replaced at position {}", replaced.id, pos);
            replaced.liveness.kill();
        }
        id
    }

    pub fn get(&self, pos: usize) -> Option<&AttachmentEntry> {
        self.entries.get(&pos)
    }

    /// Find an attachment by id, returning its position
    pub fn find(&self, id: AttachmentId) -> Option<(usize, &AttachmentEntry)> {
        self.entries
            .iter()
            .find(|(_, entry)| entry.id == id)
            .map(|(pos, entry)| (*pos, entry))
    }

    /// Entries in document order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &AttachmentEntry)> {
        self.entries.iter().map(|(pos, entry)| (*pos, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Called when `len` units are inserted at a position
    ///
    /// Shifts all attachments at or after the position to the right.
    pub fn on_insert(&mut self, pos: usize, len: usize) {
        if len == 0 {
            return;
        }
        let tail = self.entries.split_off(&pos);
        self.entries
            .extend(tail.into_iter().map(|(p, entry)| (p + len, entry)));
    }

    /// Called when a range is deleted
    ///
    /// Removes attachments inside the range, marks them dead, and shifts the
    /// remaining ones left. Returns the removed entries in document order.
    pub fn on_delete(&mut self, range: SelectionRange) -> Vec<AttachmentEntry> {
        if range.is_caret() {
            return Vec::new();
        }
        let mut tail = self.entries.split_off(&range.start);
        let after = tail.split_off(&range.end());

        let removed: Vec<AttachmentEntry> = tail.into_values().collect();
        for entry in &removed {
            entry.liveness.kill();
        }

        self.entries.extend(
            after
                .into_iter()
                .map(|(p, entry)| (p - range.length, entry)),
        );
        removed
    }

    /// Remove every attachment, marking each dead
    pub fn clear(&mut self) -> Vec<AttachmentEntry> {
        let removed: Vec<AttachmentEntry> = std::mem::take(&mut self.entries).into_values().collect();
        for entry in &removed {
            entry.liveness.kill();
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(positions: &[usize]) -> AttachmentTable {
        let mut table = AttachmentTable::new();
        for pos in positions {
            table.insert(*pos, Attachment::comment(format!("at {}", pos)));
        }
        table
    }

    #[test]
    fn test_insert_tracking() {
        let mut table = table_with(&[0, 4]);

        // Insert two units at position 2
        table.on_insert(2, 2);

        // Attachment at 0 should stay, attachment at 4 should shift to 6
        assert!(table.get(0).is_some());
        assert!(table.get(4).is_none());
        assert!(table.get(6).is_some());
    }

    #[test]
    fn test_delete_tracking() {
        let mut table = table_with(&[0, 4, 9]);
        let doomed = table.get(4).map(AttachmentEntry::liveness);

        let removed = table.on_delete(SelectionRange::new(3, 3));

        assert_eq!(removed.len(), 1);
        assert!(!removed[0].is_live());
        assert!(doomed.is_some_and(|l| !l.is_live()));
        assert!(table.get(0).is_some());
        assert!(table.get(6).is_some());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_ids_are_unique_and_findable() {
        let mut table = AttachmentTable::new();
        let a = table.insert(0, Attachment::comment("a"));
        table.on_insert(0, 1);
        let b = table.insert(0, Attachment::comment("b"));

        assert_ne!(a, b);
        assert_eq!(table.find(a).map(|(pos, _)| pos), Some(1));
        assert_eq!(table.find(b).map(|(pos, _)| pos), Some(0));
    }

    #[test]
    fn test_clone_does_not_share_liveness() {
        let mut table = table_with(&[1]);
        let copy = table.clone();
        table.clear();

        assert!(copy.get(1).is_some_and(AttachmentEntry::is_live));
    }
}
