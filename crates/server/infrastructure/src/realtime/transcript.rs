//! Transcript Store
//!
//! Append-only, ordered log of broadcast entries. Insertion order is the
//! broadcast order every recipient observes.

use parlor_shared::Color;
use parlor_shared::realtime::TranscriptEntry;
use std::collections::VecDeque;

#[derive(Debug)]
pub struct TranscriptStore {
    entries: VecDeque<TranscriptEntry>,
    /// Maximum retained entries; `None` keeps the whole history.
    capacity: Option<usize>,
    next_seq: u64,
    evicted: u64,
}

impl Default for TranscriptStore {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl TranscriptStore {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
            next_seq: 1,
            evicted: 0,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Appends an entry, assigning the next sequence number.
    ///
    /// With a capacity set, the oldest entries are evicted so that at most
    /// `capacity` remain. Sequence numbers keep increasing across evictions.
    pub fn append(&mut self, text: impl Into<String>, color: Color) -> TranscriptEntry {
        let entry = TranscriptEntry::new(self.next_seq, text, color);
        self.next_seq += 1;
        self.entries.push_back(entry.clone());

        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                self.entries.pop_front();
                self.evicted += 1;
            }
        }

        entry
    }

    /// Full retained history at call time, oldest first.
    pub fn snapshot(&self) -> Vec<TranscriptEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total entries dropped by the retention limit.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}
