//! Trace exam: a clinical exam requested for every herd a trace confirms
//! contact with, once per herd per iteration.

use std::collections::HashSet;

use crate::{
    error::SimResult,
    event::{ContactType, Event, EventTagSet, TraceDirection, types::EventTag},
    module::{Module, ModuleContext},
    production_type::ProductionTypeId,
    reason::ReasonId,
};

pub struct TraceExamConfig {
    pub contact_type: ContactType,
    pub direction: TraceDirection,
    pub production_types: HashSet<ProductionTypeId>,
    pub reason: String,
    pub detection_multiplier: f64,
    pub test_if_no_signs: bool,
}

pub struct TraceExam {
    config: TraceExamConfig,
    reason_id: Option<ReasonId>,
    /// First-exam day per herd this iteration, to prevent duplicate exams.
    examined: HashSet<crate::herd::HerdId>,
}

impl TraceExam {
    pub fn new(config: TraceExamConfig) -> Self {
        Self {
            config,
            reason_id: None,
            examined: HashSet::new(),
        }
    }
}

impl Module for TraceExam {
    fn name(&self) -> &str {
        "trace-exam"
    }

    fn events_listened_for(&self) -> EventTagSet {
        EventTagSet::from_tags([EventTag::BeforeAnySimulations, EventTag::TraceResult])
    }

    fn run(&mut self, event: &Event, ctx: &mut ModuleContext) -> SimResult<()> {
        match event {
            Event::BeforeAnySimulations => {
                self.reason_id = Some(ctx.reasons.intern(&self.config.reason));
            }
            Event::TraceResult {
                target,
                contact_type,
                direction,
                day,
                traced,
                ..
            } => {
                if !traced
                    || *contact_type != self.config.contact_type
                    || *direction != self.config.direction
                {
                    return Ok(());
                }
                let herd = ctx.herds.get(*target);
                if !self.config.production_types.contains(&herd.production_type) {
                    return Ok(());
                }
                if herd.status == crate::herd::DiseaseStatus::Destroyed {
                    return Ok(());
                }
                if let Some(detected_on) = herd.detected_on {
                    if detected_on < *day {
                        return Ok(());
                    }
                }
                if !self.examined.insert(*target) {
                    return Ok(());
                }
                ctx.out_queue.enqueue(Event::Exam {
                    herd: *target,
                    day: *day,
                    reason: self.reason_id.expect("reason declared before first iteration"),
                    detection_multiplier: self.config.detection_multiplier,
                    test_if_no_signs: self.config.test_if_no_signs,
                });
            }
            _ => {}
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.examined.clear();
    }
}
