//! Undo/redo history.
//!
//! History is a linear list of whole-content snapshots with a cursor.
//! Pushing after an undo discards the redo tail; exceeding the depth limit
//! drops the oldest snapshot. The cursor always names the snapshot that
//! matches the live document once pending saves are flushed.
//!
//! Replay is position-preserving: content and style come from the snapshot,
//! but an element that is still live keeps where the user last dragged it.
//! Visibility and lock are not history-tracked either.

use lc_core::geometry::centered_position;
use lc_core::id::ElementId;
use lc_core::model::{CanvasElement, EditorDocument, Position};

/// Content captured by one history entry.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    pub elements: Vec<CanvasElement>,
    pub background: String,
}

impl HistorySnapshot {
    pub fn capture(doc: &EditorDocument) -> Self {
        Self {
            elements: doc.elements.clone(),
            background: doc.background.clone(),
        }
    }

    fn position_of(&self, id: ElementId) -> Option<Position> {
        self.elements.iter().find(|e| e.id == id).map(|e| e.position)
    }
}

pub struct HistoryManager {
    snapshots: Vec<HistorySnapshot>,
    index: usize,
    /// Maximum number of snapshots kept.
    max_depth: usize,
}

impl HistoryManager {
    pub fn new(initial: HistorySnapshot, max_depth: usize) -> Self {
        Self {
            snapshots: vec![initial],
            index: 0,
            max_depth: max_depth.max(1),
        }
    }

    /// Record `snapshot` after the cursor.
    pub fn push(&mut self, snapshot: HistorySnapshot) {
        self.snapshots.truncate(self.index + 1);
        self.snapshots.push(snapshot);
        if self.snapshots.len() > self.max_depth {
            self.snapshots.remove(0);
        }
        self.index = self.snapshots.len() - 1;
        log::debug!("history push: {}/{}", self.index, self.snapshots.len());
    }

    /// Step back. Returns `false` at the oldest snapshot.
    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.index -= 1;
        log::debug!("undo -> {}", self.index);
        true
    }

    /// Step forward. Returns `false` at the newest snapshot.
    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.index += 1;
        log::debug!("redo -> {}", self.index);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &HistorySnapshot {
        &self.snapshots[self.index]
    }

    /// Drop everything and start over from `snapshot`.
    pub fn reset(&mut self, snapshot: HistorySnapshot) {
        self.snapshots.clear();
        self.snapshots.push(snapshot);
        self.index = 0;
    }

    /// Most recent position recorded for `id` anywhere in history.
    pub fn latest_position(&self, id: ElementId) -> Option<Position> {
        self.snapshots.iter().rev().find_map(|s| s.position_of(id))
    }

    /// Elements to install for the current snapshot given the live ones.
    pub fn replay(&self, live: &[CanvasElement], canvas: (f32, f32)) -> Vec<CanvasElement> {
        self.current()
            .elements
            .iter()
            .map(|snap| {
                let mut el = snap.clone();
                if let Some(current) = live.iter().find(|l| l.id == snap.id) {
                    el.position = current.position;
                    el.is_visible = current.is_visible;
                    el.is_locked = current.is_locked;
                } else {
                    el.position = self.latest_position(snap.id).unwrap_or_else(|| {
                        centered_position(snap.natural_size().unwrap_or((0.0, 0.0)), canvas)
                    });
                }
                el
            })
            .collect()
    }
}
