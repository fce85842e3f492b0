//! The event type catalogue. Payloads are immutable after creation and
//! carry herds by [`HerdId`], never by owning reference.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumDiscriminants, EnumIter};

use crate::{herd::DiseaseStatus, herd::HerdId, io::reporting::OutputHandle, reason::ReasonId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactType {
    DirectContact,
    IndirectContact,
    AirborneSpread,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraceDirection {
    Forward,
    Back,
}

/// Optional "seed an in-progress state" payload shared by `AttemptToInfect`,
/// `Infection`, and `Vaccination` (event.h `override_initial_state` /
/// `override_days_in_state` / `override_days_left_in_state`). `None` means
/// "sample normally from the natural-history distributions".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateOverride {
    pub initial_state: DiseaseStatus,
    pub days_in_state: u32,
    /// Zero means "sample the remaining duration normally".
    pub days_left_in_state: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestResultValue {
    pub positive: bool,
    pub correct: bool,
}

/// Tagged union of every inter-module signal. Discriminant is derived into
/// [`EventTag`] for `events_listened_for` bitset membership tests.
#[derive(Debug, Clone, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(EventTag))]
#[strum_discriminants(derive(Display, EnumIter, Hash))]
pub enum Event {
    BeforeAnySimulations,
    BeforeEachSimulation,
    DeclarationOfVaccinationReasons { reasons: Vec<String> },
    DeclarationOfDestructionReasons { reasons: Vec<String> },
    DeclarationOfVaccineDelay { production_type: crate::production_type::ProductionTypeId, delay_days: u32 },
    DeclarationOfOutputs { outputs: Vec<OutputHandle> },
    NewDay { day: u32 },
    Exposure {
        source: HerdId,
        target: HerdId,
        day: u32,
        contact_type: ContactType,
        traceable: bool,
        adequate: bool,
        delay: i32,
    },
    AttemptToInfect {
        source: HerdId,
        target: HerdId,
        day: u32,
        contact_type: ContactType,
        r#override: Option<StateOverride>,
    },
    Infection {
        source: HerdId,
        target: HerdId,
        day: u32,
        contact_type: ContactType,
        r#override: Option<StateOverride>,
    },
    Detection {
        herd: HerdId,
        day: u32,
        detection_reason: ReasonId,
        test_result: Option<TestResultValue>,
    },
    PublicAnnouncement { day: u32 },
    Exam {
        herd: HerdId,
        day: u32,
        reason: ReasonId,
        detection_multiplier: f64,
        test_if_no_signs: bool,
    },
    AttemptToTrace {
        herd: HerdId,
        day: u32,
        contact_type: ContactType,
        direction: TraceDirection,
        trace_period: u32,
    },
    TraceResult {
        source: HerdId,
        target: HerdId,
        contact_type: ContactType,
        direction: TraceDirection,
        day: u32,
        initiated_day: u32,
        traced: bool,
    },
    Test {
        herd: HerdId,
        day: u32,
        reason: ReasonId,
    },
    TestResult {
        herd: HerdId,
        day: u32,
        positive: bool,
        correct: bool,
        reason: ReasonId,
    },
    RequestForVaccination {
        herd: HerdId,
        day: u32,
        reason: ReasonId,
        priority: u32,
        cancel_on_detection: bool,
        min_days_before_next: u32,
        day_commitment_made: Option<u32>,
    },
    CommitmentToVaccinate { herd: HerdId, day: u32 },
    VaccinationCanceled {
        herd: HerdId,
        day: u32,
        day_commitment_made: u32,
    },
    Vaccination {
        herd: HerdId,
        day: u32,
        reason: ReasonId,
        day_commitment_made: u32,
        r#override: Option<StateOverride>,
    },
    RequestForDestruction {
        herd: HerdId,
        day: u32,
        reason: ReasonId,
        priority: u32,
        day_commitment_made: Option<u32>,
    },
    CommitmentToDestroy { herd: HerdId, day: u32 },
    Destruction {
        herd: HerdId,
        day: u32,
        reason: ReasonId,
        day_commitment_made: u32,
    },
    RequestForZoneFocus {
        herd: HerdId,
        day: u32,
        reason: ReasonId,
    },
    EndOfDay { day: u32, done: bool },
    LastDay { day: u32 },
    Midnight { day: u32 },
}

impl Event {
    pub fn tag(&self) -> EventTag {
        self.into()
    }
}
