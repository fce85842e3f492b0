//! The two-wave event queue.
//!
//! Within a simulated day, events settle through a cascade of "waves":
//! handling one event may enqueue others for the *same* day, and those must
//! be processed before the day advances. The queue has no total order within
//! a wave — `dequeue` picks uniformly among whatever is left in the current
//! wave, matching NAADSM's unordered same-day event handling rather than a
//! time-ordered `BinaryHeap<Reverse<_>>` scheduler.

use crate::event::types::Event;
use crate::ports::RandomNumberGenerator;

#[derive(Debug, Default)]
pub struct EventQueue {
    current_wave: Vec<Event>,
    next_wave: Vec<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places `event` into the wave after the one currently draining.
    pub fn enqueue(&mut self, event: Event) {
        self.next_wave.push(event);
    }

    /// Removes and returns a uniformly-random event from the current wave,
    /// swapping in the next wave once the current one drains. Returns `None`
    /// only when both waves are empty.
    pub fn dequeue(&mut self, rng: &mut dyn RandomNumberGenerator) -> Option<Event> {
        if self.current_wave.is_empty() {
            std::mem::swap(&mut self.current_wave, &mut self.next_wave);
        }
        if self.current_wave.is_empty() {
            return None;
        }
        let index = rng.index(self.current_wave.len());
        Some(self.current_wave.swap_remove(index))
    }

    pub fn is_empty(&self) -> bool {
        self.current_wave.is_empty() && self.next_wave.is_empty()
    }

    pub fn clear(&mut self) {
        self.current_wave.clear();
        self.next_wave.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::rng::DefaultRng;

    #[test]
    fn drains_current_wave_before_next() {
        let mut queue = EventQueue::new();
        let mut rng = DefaultRng::fixed(0.0);
        queue.enqueue(Event::NewDay { day: 1 });
        assert!(matches!(
            queue.dequeue(&mut rng),
            Some(Event::NewDay { day: 1 })
        ));
        assert!(queue.is_empty());
    }

    #[test]
    fn cascade_within_a_day_is_seen_before_next_wave_swap() {
        let mut queue = EventQueue::new();
        let mut rng = DefaultRng::fixed(0.0);
        queue.enqueue(Event::NewDay { day: 1 });
        let first = queue.dequeue(&mut rng).unwrap();
        assert!(matches!(first, Event::NewDay { day: 1 }));
        // Handling NewDay enqueues a cascade event into the next wave.
        queue.enqueue(Event::Midnight { day: 1 });
        assert!(!queue.is_empty());
        let second = queue.dequeue(&mut rng).unwrap();
        assert!(matches!(second, Event::Midnight { day: 1 }));
        assert!(queue.is_empty());
    }

    #[test]
    fn empty_queue_dequeues_none() {
        let mut queue = EventQueue::new();
        let mut rng = DefaultRng::fixed(0.0);
        assert!(queue.dequeue(&mut rng).is_none());
    }
}
