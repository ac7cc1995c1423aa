//! Snapshot-based undo/redo history.
//!
//! The log holds full [`Timeline`] snapshots with a cursor pointing at the
//! entry that matches the live document:
//! - Recording truncates anything after the cursor (new branch)
//! - A snapshot equal to the current entry is not recorded
//! - Past `capacity` the oldest entry is dropped
//! - Transactions fold many edits (a drag) into one entry
//!
//! Playback position, selection and the snap indicator are not part of a
//! [`Timeline`], so touching them never creates an undo step.

use splice_model::Timeline;

/// Default number of retained snapshots.
pub const DEFAULT_CAPACITY: usize = 100;

/// One state in the log.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Action that produced this state.
    pub label: String,
    pub snapshot: Timeline,
}

#[derive(Debug, Clone)]
struct Transaction {
    label: String,
    depth: usize,
}

/// Bounded undo/redo log.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    cursor: usize,
    capacity: usize,
    transaction: Option<Transaction>,
}

impl History {
    /// Start a log whose only entry is `initial`.
    pub fn new(initial: Timeline, capacity: usize) -> Self {
        Self {
            entries: vec![HistoryEntry {
                label: "Initial".to_string(),
                snapshot: initial,
            }],
            cursor: 0,
            capacity: capacity.max(1),
            transaction: None,
        }
    }

    pub fn with_default_capacity(initial: Timeline) -> Self {
        Self::new(initial, DEFAULT_CAPACITY)
    }

    /// Record the state after an action. Returns whether an entry was added.
    ///
    /// Suppressed while a transaction is open.
    pub fn record(&mut self, label: &str, snapshot: Timeline) -> bool {
        if let Some(tx) = &self.transaction {
            tracing::trace!(label, transaction = %tx.label, "Record deferred to transaction");
            return false;
        }
        self.push(label.to_string(), snapshot)
    }

    fn push(&mut self, label: String, snapshot: Timeline) -> bool {
        if self.current().is_some_and(|current| current == &snapshot) {
            tracing::trace!(label = %label, "Unchanged snapshot not recorded");
            return false;
        }

        self.entries.truncate(self.cursor + 1);
        self.entries.push(HistoryEntry { label, snapshot });

        let overflow = self.entries.len().saturating_sub(self.capacity);
        if overflow > 0 {
            self.entries.drain(..overflow);
        }
        self.cursor = self.entries.len() - 1;

        tracing::debug!(
            label = %self.entries[self.cursor].label,
            depth = self.entries.len(),
            "History entry recorded"
        );
        true
    }

    /// Open (or nest) a transaction.
    pub fn begin_transaction(&mut self, label: &str) {
        match &mut self.transaction {
            Some(tx) => tx.depth += 1,
            None => {
                tracing::debug!(label, "Transaction started");
                self.transaction = Some(Transaction {
                    label: label.to_string(),
                    depth: 1,
                });
            }
        }
    }

    /// Close the innermost transaction. The outermost commit records
    /// `snapshot` as a single entry. Returns whether an entry was added.
    pub fn commit_transaction(&mut self, snapshot: Timeline) -> bool {
        let Some(tx) = &mut self.transaction else {
            return false;
        };
        tx.depth -= 1;
        if tx.depth > 0 {
            return false;
        }
        let label = tx.label.clone();
        self.transaction = None;
        tracing::debug!(label = %label, "Transaction committed");
        self.push(label, snapshot)
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    /// Step back. Returns the snapshot to restore, `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<&Timeline> {
        self.abandon_transaction();
        if self.cursor == 0 {
            return None;
        }
        tracing::debug!(label = %self.entries[self.cursor].label, "Undo");
        self.cursor -= 1;
        Some(&self.entries[self.cursor].snapshot)
    }

    /// Step forward. Returns the snapshot to restore, `None` at the newest entry.
    pub fn redo(&mut self) -> Option<&Timeline> {
        self.abandon_transaction();
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        tracing::debug!(label = %self.entries[self.cursor].label, "Redo");
        Some(&self.entries[self.cursor].snapshot)
    }

    fn abandon_transaction(&mut self) {
        if let Some(tx) = self.transaction.take() {
            tracing::warn!(label = %tx.label, "Abandoning open transaction");
        }
    }

    /// Forget everything; `snapshot` becomes the only entry.
    pub fn reset(&mut self, snapshot: Timeline) {
        self.entries.clear();
        self.entries.push(HistoryEntry {
            label: "Initial".to_string(),
            snapshot,
        });
        self.cursor = 0;
        self.transaction = None;
        tracing::debug!("History reset");
    }

    /// Carry the live view settings into the current entry without adding a
    /// step, so the next recorded edit undoes back to them.
    pub fn amend_view(&mut self, live: &Timeline) {
        if let Some(entry) = self.entries.get_mut(self.cursor) {
            entry.snapshot.zoom = live.zoom;
            entry.snapshot.scroll_x = live.scroll_x;
            entry.snapshot.snap_enabled = live.snap_enabled;
        }
    }

    pub fn current(&self) -> Option<&Timeline> {
        self.entries.get(self.cursor).map(|e| &e.snapshot)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Label of the action `undo` would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.can_undo()
            .then(|| self.entries[self.cursor].label.as_str())
    }

    /// Label of the action `redo` would reapply.
    pub fn redo_label(&self) -> Option<&str> {
        self.entries
            .get(self.cursor + 1)
            .map(|e| e.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splice_model::{Track, TrackKind};

    fn snapshot(tag: &str) -> Timeline {
        Timeline {
            tracks: vec![Track::new(tag, tag, TrackKind::Video)],
            ..Timeline::default()
        }
    }

    #[test]
    fn test_new_history_cannot_undo() {
        let mut h = History::with_default_capacity(Timeline::default());
        assert!(!h.can_undo());
        assert!(!h.can_redo());
        assert!(h.undo().is_none());
        assert!(h.redo().is_none());
        assert_eq!(h.capacity(), 100);
    }

    #[test]
    fn test_record_undo_redo() {
        let mut h = History::new(snapshot("a"), 10);
        assert!(h.record("B", snapshot("b")));
        assert!(h.record("C", snapshot("c")));
        assert_eq!(h.undo_label(), Some("C"));

        assert_eq!(h.undo().unwrap(), &snapshot("b"));
        assert_eq!(h.undo().unwrap(), &snapshot("a"));
        assert!(h.undo().is_none());
        assert_eq!(h.redo_label(), Some("B"));
        assert_eq!(h.redo().unwrap(), &snapshot("b"));
    }

    #[test]
    fn test_identical_snapshot_not_recorded() {
        let mut h = History::new(snapshot("a"), 10);
        assert!(!h.record("Noop", snapshot("a")));
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_record_truncates_redo_branch() {
        let mut h = History::new(snapshot("a"), 10);
        h.record("B", snapshot("b"));
        h.undo();
        assert!(h.can_redo());
        h.record("C", snapshot("c"));
        assert!(!h.can_redo());
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut h = History::new(snapshot("0"), 3);
        for i in 1..=5 {
            h.record("step", snapshot(&i.to_string()));
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.undo().unwrap(), &snapshot("4"));
        assert_eq!(h.undo().unwrap(), &snapshot("3"));
        assert!(h.undo().is_none());
    }

    #[test]
    fn test_transaction_folds_records() {
        let mut h = History::new(snapshot("a"), 10);
        h.begin_transaction("Drag");
        assert!(!h.record("move", snapshot("m1")));
        h.begin_transaction("nested");
        assert!(!h.commit_transaction(snapshot("m2")));
        assert!(h.in_transaction());
        assert!(h.commit_transaction(snapshot("m3")));
        assert!(!h.in_transaction());

        assert_eq!(h.len(), 2);
        assert_eq!(h.undo_label(), Some("Drag"));
        assert_eq!(h.undo().unwrap(), &snapshot("a"));
    }

    #[test]
    fn test_undo_abandons_open_transaction() {
        let mut h = History::new(snapshot("a"), 10);
        h.record("B", snapshot("b"));
        h.begin_transaction("Stuck");
        assert!(h.undo().is_some());
        assert!(!h.in_transaction());
    }

    #[test]
    fn test_amend_view_keeps_content_and_depth() {
        let mut h = History::new(snapshot("a"), 10);
        h.record("B", snapshot("b"));
        let mut live = snapshot("b2");
        live.zoom = 3.0;
        live.snap_enabled = false;
        h.amend_view(&live);

        assert_eq!(h.len(), 2);
        let current = h.current().unwrap();
        assert_eq!(current.tracks, snapshot("b").tracks);
        assert_eq!(current.zoom, 3.0);
        assert!(!current.snap_enabled);
        assert_eq!(h.undo().unwrap(), &snapshot("a"));
    }

    #[test]
    fn test_reset_clears_log() {
        let mut h = History::new(snapshot("a"), 10);
        h.record("B", snapshot("b"));
        h.reset(snapshot("z"));
        assert!(!h.can_undo());
        assert_eq!(h.current(), Some(&snapshot("z")));
    }
}
