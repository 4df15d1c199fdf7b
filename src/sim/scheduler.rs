//! Deferred event queue
//!
//! Delayed reactions are payloads scheduled at a future simulation time and
//! popped once they fall due. Events due at the same instant fire in the order
//! they were scheduled. Every scheduled event gets a [`TimerId`] that can be
//! used to cancel it.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

use serde::{Deserialize, Serialize};

/// Cancellation token for a scheduled event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Entry<T> {
    due: f64,
    id: TimerId,
    payload: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due.total_cmp(&other.due).then(self.id.cmp(&other.id))
    }
}

/// Min-heap of payloads keyed by due time
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    heap: BinaryHeap<Reverse<Entry<T>>>,
    /// Ids still waiting to fire; cancelled entries are skipped lazily
    live: HashSet<TimerId>,
    next_id: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            live: HashSet::new(),
            next_id: 0,
        }
    }

    /// Schedule `payload` at absolute time `due`
    pub fn schedule_at(&mut self, due: f64, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.live.insert(id);
        self.heap.push(Reverse(Entry { due, id, payload }));
        id
    }

    /// Schedule `payload` `delay` ms after `now`
    pub fn schedule(&mut self, now: f64, delay: f64, payload: T) -> TimerId {
        self.schedule_at(now + delay.max(0.0), payload)
    }

    /// Cancel a pending event. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.live.remove(&id)
    }

    /// Pop the earliest event due at or before `now`
    pub fn pop_due(&mut self, now: f64) -> Option<(TimerId, T)> {
        while let Some(Reverse(top)) = self.heap.peek() {
            if top.due > now {
                return None;
            }
            let Reverse(entry) = self.heap.pop()?;
            if self.live.remove(&entry.id) {
                return Some((entry.id, entry.payload));
            }
        }
        None
    }

    /// Number of events still waiting to fire
    pub fn pending(&self) -> usize {
        self.live.len()
    }

    /// Drop every pending event
    pub fn clear(&mut self) {
        self.heap.clear();
        self.live.clear();
    }
}
