//! Fixed-capacity history of control-loop actions.
//!
//! `EventLog` is a plain ring (backing array, head index, count). It holds no
//! lock itself; the shared copy lives inside `SharedTank`, whose mutex covers
//! both `append` and `snapshot`.
use crate::text::bounded;

/// Entries kept before the oldest is overwritten.
pub const LOG_CAPACITY: usize = 20;
/// Max bytes of a timestamp field.
pub const TS_MAX: usize = 16;
/// Max bytes of an action field.
pub const ACTION_MAX: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    ts: String,
    action: String,
}

impl LogEntry {
    /// Both fields are cut to their fixed maximum length.
    pub fn new(ts: &str, action: &str) -> Self {
        Self {
            ts: bounded(ts, TS_MAX),
            action: bounded(action, ACTION_MAX),
        }
    }

    pub fn ts(&self) -> &str {
        &self.ts
    }

    pub fn action(&self) -> &str {
        &self.action
    }
}

#[derive(Debug, Clone)]
pub struct EventLog<const N: usize = LOG_CAPACITY> {
    slots: [Option<LogEntry>; N],
    // Next slot to write.
    head: usize,
    len: usize,
}

impl<const N: usize> Default for EventLog<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> EventLog<N> {
    pub fn new() -> Self {
        const { assert!(N > 0, "event log capacity must be non-zero") };
        Self {
            slots: std::array::from_fn(|_| None),
            head: 0,
            len: 0,
        }
    }

    /// O(1); overwrites the oldest entry once full.
    pub fn append(&mut self, entry: LogEntry) {
        self.slots[self.head] = Some(entry);
        self.head = (self.head + 1) % N;
        self.len = (self.len + 1).min(N);
    }

    /// Copy of the contents, newest first.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        (0..self.len)
            .filter_map(|i| self.slots[(self.head + N - 1 - i) % N].clone())
            .collect()
    }

    /// Most recent entry, if any.
    pub fn latest(&self) -> Option<&LogEntry> {
        if self.len == 0 {
            return None;
        }
        self.slots[(self.head + N - 1) % N].as_ref()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}
