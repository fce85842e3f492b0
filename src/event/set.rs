//! Bitset membership test backing each module's `events_listened_for`:
//! `is_listening_for(tag)` is a single bit check, not a linear scan.

use strum::IntoEnumIterator;

use super::types::EventTag;

#[derive(Debug, Clone, Copy, Default)]
pub struct EventTagSet(u64);

impl EventTagSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn from_tags(tags: impl IntoIterator<Item = EventTag>) -> Self {
        let mut set = Self::empty();
        for tag in tags {
            set.insert(tag);
        }
        set
    }

    pub fn insert(&mut self, tag: EventTag) {
        self.0 |= 1 << (tag as u64);
    }

    pub fn contains(&self, tag: EventTag) -> bool {
        self.0 & (1 << (tag as u64)) != 0
    }

    pub fn all() -> Self {
        Self::from_tags(EventTag::iter())
    }
}
