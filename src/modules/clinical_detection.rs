//! Clinical detection: turns clinical signs, and positive diagnostic tests,
//! into `Detection` events.

use std::collections::HashMap;

use crate::{
    error::SimResult,
    event::{Event, EventTagSet, types::EventTag},
    herd::DiseaseStatus,
    module::{Module, ModuleContext},
    ports::RandomNumberGenerator,
    production_type::ProductionTypeId,
    reason::ReasonId,
};

pub struct ClinicalDetectionConfig {
    pub prob_report_vs_time_clinical: HashMap<ProductionTypeId, f64>,
    pub reason: String,
}

pub struct ClinicalDetection {
    config: ClinicalDetectionConfig,
    reason_id: Option<ReasonId>,
}

impl ClinicalDetection {
    pub fn new(config: ClinicalDetectionConfig) -> Self {
        Self {
            config,
            reason_id: None,
        }
    }
}

impl Module for ClinicalDetection {
    fn name(&self) -> &str {
        "clinical-detection"
    }

    fn events_listened_for(&self) -> EventTagSet {
        EventTagSet::from_tags([
            EventTag::BeforeAnySimulations,
            EventTag::NewDay,
            EventTag::TestResult,
        ])
    }

    fn run(&mut self, event: &Event, ctx: &mut ModuleContext) -> SimResult<()> {
        match event {
            Event::BeforeAnySimulations => {
                self.reason_id = Some(ctx.reasons.intern(&self.config.reason));
            }
            Event::NewDay { day } => {
                let reason = self.reason_id.expect("reason declared before first iteration");
                let candidates: Vec<_> = ctx
                    .herds
                    .iter()
                    .filter(|h| h.status == DiseaseStatus::InfectiousClinical)
                    .filter(|h| h.detected_on.is_none())
                    .map(|h| (h.id, h.production_type))
                    .collect();
                for (herd, production_type) in candidates {
                    let prob = self
                        .config
                        .prob_report_vs_time_clinical
                        .get(&production_type)
                        .copied()
                        .unwrap_or(0.0);
                    if ctx.rng.u01() < prob {
                        ctx.out_queue.enqueue(Event::Detection {
                            herd,
                            day: *day,
                            detection_reason: reason,
                            test_result: None,
                        });
                    }
                }
            }
            Event::TestResult {
                herd,
                day,
                positive,
                correct,
                reason,
            } => {
                if *positive {
                    ctx.out_queue.enqueue(Event::Detection {
                        herd: *herd,
                        day: *day,
                        detection_reason: *reason,
                        test_result: Some(crate::event::TestResultValue {
                            positive: *positive,
                            correct: *correct,
                        }),
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn reset(&mut self) {}
}
