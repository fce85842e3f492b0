//! The herd (production unit) data model.
//!
//! Herds are owned by [`HerdList`] for the lifetime of the process and reset
//! to their initial state between iterations. Events never hold owning
//! references to herds — they carry a [`HerdId`] and modules look the herd
//! up in the list they were handed.

use serde::{Deserialize, Serialize};

use crate::{
    impl_from_primitive,
    production_type::ProductionTypeId,
};

/// Index into [`HerdList`]. Stable for the lifetime of a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct HerdId(pub u32);
impl_from_primitive!(HerdId, u32);

/// Number of animals in a herd.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct HerdSize(pub u32);
impl_from_primitive!(HerdSize, u32);

/// Prevalence scalar in `[0, 1]`: the infectivity contribution of a herd.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Prevalence(pub f64);

impl Default for Prevalence {
    fn default() -> Self {
        Self(0.0)
    }
}

impl Prevalence {
    pub fn clamped(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0))
    }
}

/// Planar coordinates for a herd. GIS projection of real-world coordinates
/// into this plane is an external collaborator's job (out of scope here).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn distance_km(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Compass heading in degrees `[0, 360)` from `self` toward `other`.
    pub fn heading_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let deg = dy.atan2(dx).to_degrees();
        (90.0 - deg).rem_euclid(360.0)
    }
}

/// Disease status of a herd. Transitions are driven by
/// [`crate::modules::disease_model::DiseaseModel`]; the Riverton variant
/// routes the post-clinical transition through [`DiseaseStatus::NaturallyImmune`]
/// instead of back to [`DiseaseStatus::Susceptible`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiseaseStatus {
    Susceptible,
    Latent,
    InfectiousSubclinical,
    InfectiousClinical,
    NaturallyImmune,
    VaccineImmune,
    Destroyed,
}

impl DiseaseStatus {
    pub fn is_infectious(&self) -> bool {
        matches!(
            self,
            DiseaseStatus::InfectiousSubclinical | DiseaseStatus::InfectiousClinical
        )
    }

    pub fn is_susceptible(&self) -> bool {
        matches!(self, DiseaseStatus::Susceptible)
    }

    /// "Can no longer be affected" predicate: Destroyed is always absorbing;
    /// NaturallyImmune only absorbs under the Riverton variant (outside it,
    /// recovered herds return to Susceptible).
    pub fn is_absorbing(&self, riverton_variant: bool) -> bool {
        matches!(self, DiseaseStatus::Destroyed)
            || (riverton_variant && matches!(self, DiseaseStatus::NaturallyImmune))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Herd {
    pub id: HerdId,
    pub official_id: String,
    pub production_type: ProductionTypeId,
    pub position: Position,
    pub size: HerdSize,
    pub status: DiseaseStatus,
    pub prevalence: Prevalence,
    pub quarantined: bool,

    /// Days spent in the current disease state, maintained by
    /// [`crate::modules::disease_model::DiseaseModel`].
    #[serde(skip)]
    pub days_in_state: u32,
    /// Remaining days before the next natural-history transition. `0` while
    /// `status` is `Susceptible` or an absorbing state.
    #[serde(skip)]
    pub days_left_in_state: u32,
    /// Day a `Detection` was first recorded for this herd this iteration, if
    /// any. Trace exam suppresses a request when the detection it would
    /// react to happened on a prior day.
    #[serde(skip)]
    pub detected_on: Option<u32>,

    /// Snapshot taken at load time; [`HerdList::reset`] restores every herd
    /// to this state between iterations.
    #[serde(skip)]
    initial_status: DiseaseStatus,
    #[serde(skip)]
    initial_prevalence: Prevalence,
}

impl Herd {
    pub fn new(
        id: HerdId,
        official_id: impl Into<String>,
        production_type: ProductionTypeId,
        position: Position,
        size: HerdSize,
        initial_status: DiseaseStatus,
    ) -> Self {
        Self {
            id,
            official_id: official_id.into(),
            production_type,
            position,
            size,
            status: initial_status.clone(),
            prevalence: Prevalence::default(),
            quarantined: false,
            days_in_state: 0,
            days_left_in_state: 0,
            detected_on: None,
            initial_status,
            initial_prevalence: Prevalence::default(),
        }
    }

    fn reset(&mut self) {
        self.status = self.initial_status.clone();
        self.prevalence = self.initial_prevalence;
        self.quarantined = false;
        self.days_in_state = 0;
        self.days_left_in_state = 0;
        self.detected_on = None;
    }
}

/// Owns every herd in the scenario for the lifetime of the process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HerdList {
    herds: Vec<Herd>,
}

impl HerdList {
    pub fn new(herds: Vec<Herd>) -> Self {
        Self { herds }
    }

    pub fn len(&self) -> usize {
        self.herds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.herds.is_empty()
    }

    pub fn get(&self, id: HerdId) -> &Herd {
        &self.herds[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: HerdId) -> &mut Herd {
        &mut self.herds[id.0 as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Herd> {
        self.herds.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Herd> {
        self.herds.iter_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = HerdId> + '_ {
        (0..self.herds.len() as u32).map(HerdId)
    }

    /// Resets every herd to its initial state. The sum of units across
    /// disease-status buckets equals `self.len()` again immediately after
    /// this call.
    pub fn reset(&mut self) {
        for herd in &mut self.herds {
            herd.reset();
        }
    }

    pub fn count_in_status(&self, status: DiseaseStatus) -> usize {
        self.herds.iter().filter(|h| h.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_restores_status_and_clears_transient_fields() {
        let mut herds = HerdList::new(vec![Herd::new(
            HerdId(0),
            "h0",
            ProductionTypeId(0),
            Position::default(),
            HerdSize(20),
            DiseaseStatus::Susceptible,
        )]);
        {
            let herd = herds.get_mut(HerdId(0));
            herd.status = DiseaseStatus::Latent;
            herd.prevalence = Prevalence::clamped(0.8);
            herd.quarantined = true;
            herd.days_in_state = 3;
            herd.days_left_in_state = 2;
            herd.detected_on = Some(5);
        }
        herds.reset();

        let herd = herds.get(HerdId(0));
        assert_eq!(herd.status, DiseaseStatus::Susceptible);
        assert_eq!(herd.prevalence, Prevalence(0.0));
        assert!(!herd.quarantined);
        assert_eq!(herd.days_in_state, 0);
        assert_eq!(herd.days_left_in_state, 0);
        assert_eq!(herd.detected_on, None);
    }

    #[test]
    fn prevalence_is_clamped_to_the_unit_interval() {
        assert_eq!(Prevalence::clamped(1.5), Prevalence(1.0));
        assert_eq!(Prevalence::clamped(-0.5), Prevalence(0.0));
        assert_eq!(Prevalence::clamped(0.4), Prevalence(0.4));
    }

    #[test]
    fn is_absorbing_depends_on_the_riverton_variant() {
        assert!(DiseaseStatus::Destroyed.is_absorbing(false));
        assert!(DiseaseStatus::Destroyed.is_absorbing(true));
        assert!(!DiseaseStatus::NaturallyImmune.is_absorbing(false));
        assert!(DiseaseStatus::NaturallyImmune.is_absorbing(true));
        assert!(!DiseaseStatus::Susceptible.is_absorbing(true));
    }

    #[test]
    fn distance_and_heading_are_computed_on_the_plane() {
        let a = Position { x: 0.0, y: 0.0 };
        let b = Position { x: 3.0, y: 4.0 };
        assert_eq!(a.distance_km(&b), 5.0);
        // Due east is 0km north, >0km east: heading should be 90 degrees.
        let east = Position { x: 1.0, y: 0.0 };
        assert!((a.heading_to(&east) - 90.0).abs() < 1e-9);
    }
}
