//! Minimal zone model.
//!
//! Full zone-ring geometry (union of circles, nested levels) is out of scope
//! — this is the "am I inside a focus circle" predicate that trace-zone-focus
//! and reporting need. All zone definitions share the same set of focus
//! points and form concentric rings around them; zones reshape at
//! `Midnight`, never mid-wave.

use serde::{Deserialize, Serialize};

use crate::{herd::Position, impl_from_primitive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ZoneId(pub u16);
impl_from_primitive!(ZoneId, u16);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneDefinition {
    pub id: ZoneId,
    pub name: String,
    pub radius_km: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ZoneList {
    /// Ordered smallest-radius (highest-priority) first.
    definitions: Vec<ZoneDefinition>,
    /// Focus points requested via `RequestForZoneFocus` since the last
    /// reshape, applied at the next `Midnight` (requests mid-wave must not
    /// reshape zones mid-day).
    pending_foci: Vec<Position>,
    /// Focus points currently in effect.
    active_foci: Vec<Position>,
}

impl ZoneList {
    pub fn new(mut definitions: Vec<ZoneDefinition>) -> Self {
        definitions.sort_by(|a, b| a.radius_km.partial_cmp(&b.radius_km).unwrap());
        Self {
            definitions,
            pending_foci: Vec::new(),
            active_foci: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.pending_foci.clear();
        self.active_foci.clear();
    }

    pub fn request_focus(&mut self, point: Position) {
        self.pending_foci.push(point);
    }

    /// Applies every focus point requested since the last reshape. Called
    /// from `Midnight`, per the invariant that zones reshape only between
    /// days.
    pub fn reshape(&mut self) {
        self.active_foci.append(&mut self.pending_foci);
    }

    /// The highest-priority (smallest-radius) zone containing `position`,
    /// if any.
    pub fn containing_zone(&self, position: &Position) -> Option<ZoneId> {
        for def in &self.definitions {
            if self
                .active_foci
                .iter()
                .any(|focus| focus.distance_km(position) <= def.radius_km)
            {
                return Some(def.id);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smallest_radius_zone_wins_when_nested() {
        let mut zones = ZoneList::new(vec![
            ZoneDefinition {
                id: ZoneId(0),
                name: "inner".into(),
                radius_km: 1.0,
            },
            ZoneDefinition {
                id: ZoneId(1),
                name: "outer".into(),
                radius_km: 5.0,
            },
        ]);
        zones.request_focus(Position { x: 0.0, y: 0.0 });
        zones.reshape();
        assert_eq!(
            zones.containing_zone(&Position { x: 0.5, y: 0.0 }),
            Some(ZoneId(0))
        );
        assert_eq!(
            zones.containing_zone(&Position { x: 3.0, y: 0.0 }),
            Some(ZoneId(1))
        );
        assert_eq!(zones.containing_zone(&Position { x: 10.0, y: 0.0 }), None);
    }

    #[test]
    fn focus_points_take_effect_only_after_reshape() {
        let mut zones = ZoneList::new(vec![ZoneDefinition {
            id: ZoneId(0),
            name: "z".into(),
            radius_km: 2.0,
        }]);
        zones.request_focus(Position { x: 0.0, y: 0.0 });
        assert_eq!(zones.containing_zone(&Position { x: 0.0, y: 0.0 }), None);
        zones.reshape();
        assert_eq!(
            zones.containing_zone(&Position { x: 0.0, y: 0.0 }),
            Some(ZoneId(0))
        );
    }
}
