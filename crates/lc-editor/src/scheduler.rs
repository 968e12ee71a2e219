//! Keyed one-shot timers driven by an injectable clock.
//!
//! The editor is single-threaded: nothing fires on its own. The host calls
//! `Editor::tick()` and due callbacks run then. Arming a key replaces any
//! pending entry for that key.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Milliseconds since an arbitrary origin.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now: Rc<Cell<u64>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for VirtualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// What a timer entry is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKey {
    /// Deferred history snapshot after a burst of style edits.
    HistorySave,
}

pub type Task<T> = Box<dyn FnOnce(&mut T)>;

struct Entry<T> {
    key: TimerKey,
    due_ms: u64,
    task: Task<T>,
}

/// Pending timers for a target of type `T`.
pub struct Scheduler<T> {
    entries: Vec<Entry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` to run `delay_ms` after `now_ms`, cancelling any
    /// pending entry with the same key.
    pub fn arm(&mut self, key: TimerKey, now_ms: u64, delay_ms: u64, task: Task<T>) {
        self.cancel(key);
        self.entries.push(Entry {
            key,
            due_ms: now_ms.saturating_add(delay_ms),
            task,
        });
    }

    /// Returns whether an entry was pending.
    pub fn cancel(&mut self, key: TimerKey) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.key != key);
        before != self.entries.len()
    }

    pub fn is_armed(&self, key: TimerKey) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    /// Remove and return the task for `key` regardless of its due time.
    pub fn take(&mut self, key: TimerKey) -> Option<Task<T>> {
        let pos = self.entries.iter().position(|e| e.key == key)?;
        Some(self.entries.remove(pos).task)
    }

    /// Remove and return every task due at `now_ms`, earliest first.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<Task<T>> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].due_ms <= now_ms {
                due.push(self.entries.remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|e| e.due_ms);
        due.into_iter().map(|e| e.task).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
