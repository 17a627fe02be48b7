//! Undo/redo history of full item-set snapshots.
//!
//! `snapshots[cursor]` is always the state currently applied. Committing
//! after an undo discards the redo tail. At most `depth` steps can be undone;
//! older snapshots fall off the front.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use crate::consts::HISTORY_DEPTH;
use crate::doc::Item;

#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<Vec<Item>>,
    cursor: usize,
    depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(HISTORY_DEPTH)
    }
}

impl History {
    /// Empty history keeping up to `depth` undoable steps (at least one).
    #[must_use]
    pub fn new(depth: usize) -> Self {
        Self { snapshots: vec![Vec::new()], cursor: 0, depth: depth.max(1) }
    }

    /// Forget everything and start from `items` as the baseline.
    pub fn reset(&mut self, items: Vec<Item>) {
        self.snapshots = vec![items];
        self.cursor = 0;
    }

    /// Record `items` as the new current state.
    pub fn commit(&mut self, items: Vec<Item>) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(items);
        self.cursor += 1;
        while self.snapshots.len() > self.depth + 1 {
            self.snapshots.remove(0);
            self.cursor -= 1;
        }
    }

    /// Step back, returning the snapshot to restore. `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<&[Item]> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(&self.snapshots[self.cursor])
    }

    /// Step forward, returning the snapshot to restore. `None` at the newest entry.
    pub fn redo(&mut self) -> Option<&[Item]> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        Some(&self.snapshots[self.cursor])
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// The snapshot currently applied.
    #[must_use]
    pub fn current(&self) -> &[Item] {
        &self.snapshots[self.cursor]
    }

    /// Number of stored snapshots, baseline included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }
}
