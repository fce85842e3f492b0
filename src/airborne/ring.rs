//! The delayed-effect rotating buffer.
//!
//! A ring of per-slot FIFOs indexed by `(head + delay) mod length`. Growth:
//! when a delay `k >= len` is sampled, the buffer rotates so `head` sits at
//! position 0, then extends to length `k + 1` with empty slots.

use std::collections::VecDeque;

use crate::event::Event;

#[derive(Debug, Default)]
pub struct DelayRing {
    slots: Vec<VecDeque<Event>>,
    head: usize,
    pending: usize,
}

impl DelayRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
        self.pending = 0;
    }

    pub fn pending_count(&self) -> usize {
        self.pending
    }

    /// Buffers `event` to materialize `delay` days from now. `delay` must be
    /// `>= 1` — callers route `delay <= 0` straight to the outgoing queue.
    pub fn push(&mut self, delay: u32, event: Event) {
        let delay = delay as usize;
        if self.slots.is_empty() {
            self.slots.push(VecDeque::new());
        }
        if delay >= self.slots.len() {
            self.grow_to(delay + 1);
        }
        let idx = (self.head + delay) % self.slots.len();
        self.slots[idx].push_back(event);
        self.pending += 1;
    }

    fn grow_to(&mut self, new_len: usize) {
        self.slots.rotate_left(self.head);
        self.head = 0;
        while self.slots.len() < new_len {
            self.slots.push(VecDeque::new());
        }
    }

    /// Advances the head by one day and drains the slot that becomes
    /// current, returning every buffered event there (invariant: each has
    /// `event.day` equal to the new current day).
    pub fn advance(&mut self) -> Vec<Event> {
        if self.slots.is_empty() {
            return Vec::new();
        }
        self.head = (self.head + 1) % self.slots.len();
        let drained: Vec<Event> = self.slots[self.head].drain(..).collect();
        self.pending -= drained.len();
        drained
    }
}
