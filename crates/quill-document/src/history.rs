//! Undo/redo stacks of ghost-free snapshots

use std::collections::VecDeque;
use std::sync::Arc;

use crate::snapshot::DocumentSnapshot;
use crate::tags::UpdateTag;

/// Default number of undo steps kept
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Undo/redo history for one document
///
/// Entries are stored with ghost nodes stripped, so undoing past a removed
/// suggestion can never resurrect it. Ghosts visible at replay time are
/// carried over by [`Document`](crate::Document).
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<Arc<DocumentSnapshot>>,
    redo_stack: Vec<Arc<DocumentSnapshot>>,
    capacity: usize,
}

impl History {
    /// History with [`DEFAULT_HISTORY_CAPACITY`] steps
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// History keeping at most `capacity` undo steps
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            capacity,
        }
    }

    /// Whether a transaction with these tags belongs in the history
    ///
    /// Ghost insertions and removals never do, and neither does undo/redo
    /// replay itself.
    pub fn records(tags: &std::collections::BTreeSet<UpdateTag>) -> bool {
        !tags.contains(&UpdateTag::SUGGEST)
            && !tags.contains(&UpdateTag::CANCEL)
            && !tags.contains(&UpdateTag::HISTORIC)
    }

    /// Push the state preceding a content change; clears the redo stack
    pub fn record(&mut self, previous: &DocumentSnapshot) {
        if self.capacity == 0 {
            return;
        }
        self.undo_stack.push_back(Arc::new(previous.without_ghosts()));
        while self.undo_stack.len() > self.capacity {
            self.undo_stack.pop_front();
        }
        self.redo_stack.clear();
    }

    /// Pop the state to restore on undo, remembering `current` for redo
    pub fn undo(&mut self, current: &DocumentSnapshot) -> Option<Arc<DocumentSnapshot>> {
        let previous = self.undo_stack.pop_back()?;
        self.redo_stack.push(Arc::new(current.without_ghosts()));
        Some(previous)
    }

    /// Pop the state to restore on redo, remembering `current` for undo
    pub fn redo(&mut self, current: &DocumentSnapshot) -> Option<Arc<DocumentSnapshot>> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push_back(Arc::new(current.without_ghosts()));
        Some(next)
    }

    /// Whether an undo step is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether a redo step is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undo steps
    pub fn undoable_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redo steps
    pub fn redoable_count(&self) -> usize {
        self.redo_stack.len()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::TransactionOptions;

    #[test]
    fn test_history_skips_ghost_transactions() {
        assert!(History::records(&TransactionOptions::user_edit().tags));
        assert!(History::records(&TransactionOptions::tagged(UpdateTag::COMMIT).tags));
        assert!(!History::records(&TransactionOptions::tagged(UpdateTag::SUGGEST).tags));
        assert!(!History::records(&TransactionOptions::tagged(UpdateTag::CANCEL).tags));
        assert!(!History::records(&TransactionOptions::tagged(UpdateTag::HISTORIC).tags));
    }

    #[test]
    fn test_record_then_undo_redo() {
        let mut history = History::new();
        let before = DocumentSnapshot::from_paragraphs(&["a"]);
        let after = DocumentSnapshot::from_paragraphs(&["ab"]);

        history.record(&before);
        assert!(history.can_undo());
        assert!(!history.can_redo());

        let restored = history.undo(&after).unwrap();
        assert_eq!(restored.text_content(), "a");
        assert!(history.can_redo());

        let replayed = history.redo(&restored).unwrap();
        assert_eq!(replayed.text_content(), "ab");
        assert_eq!(history.undoable_count(), 1);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = History::with_capacity(2);
        for text in ["a", "b", "c"] {
            history.record(&DocumentSnapshot::from_paragraphs(&[text]));
        }
        assert_eq!(history.undoable_count(), 2);
        let current = DocumentSnapshot::from_paragraphs(&["d"]);
        assert_eq!(history.undo(&current).unwrap().text_content(), "c");
    }

    #[test]
    fn test_zero_capacity_records_nothing() {
        let mut history = History::with_capacity(0);
        history.record(&DocumentSnapshot::empty());
        assert!(!history.can_undo());
    }
}
