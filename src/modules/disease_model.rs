//! Within-herd natural history: advances a herd's disease status silently at
//! `Midnight`. Other modules observe the resulting status by reading the
//! herd list directly rather than through an event.

use std::collections::HashMap;

use crate::{
    error::SimResult,
    event::{Event, EventTagSet, types::EventTag},
    herd::DiseaseStatus,
    module::{Module, ModuleContext},
    ports::DelayDistribution,
    production_type::ProductionTypeId,
};

/// Per-production-type day-count distributions for each disease state a
/// herd passes through after infection.
pub struct NaturalHistoryBlock {
    pub latent_days: Box<dyn DelayDistribution>,
    pub subclinical_days: Box<dyn DelayDistribution>,
    pub clinical_days: Box<dyn DelayDistribution>,
    /// Non-Riverton only: how long a recovered herd stays naturally immune
    /// before becoming susceptible again. Ignored under the Riverton variant,
    /// where `NaturallyImmune` is absorbing.
    pub immune_days: Box<dyn DelayDistribution>,
}

impl NaturalHistoryBlock {
    fn duration_for(&self, state: DiseaseStatus, rng: &mut dyn crate::ports::RandomNumberGenerator) -> u32 {
        let sampled = match state {
            DiseaseStatus::Latent => self.latent_days.sample(rng),
            DiseaseStatus::InfectiousSubclinical => self.subclinical_days.sample(rng),
            DiseaseStatus::InfectiousClinical => self.clinical_days.sample(rng),
            DiseaseStatus::NaturallyImmune => self.immune_days.sample(rng),
            _ => 0,
        };
        sampled.max(0) as u32
    }
}

pub struct DiseaseModelConfig {
    pub natural_history: HashMap<ProductionTypeId, NaturalHistoryBlock>,
    pub riverton_variant: bool,
}

pub struct DiseaseModel {
    config: DiseaseModelConfig,
}

impl DiseaseModel {
    pub fn new(config: DiseaseModelConfig) -> Self {
        Self { config }
    }

    /// State a herd enters after finishing its current one, or `None` if the
    /// current state has no successor (absorbing).
    fn next_state(&self, current: DiseaseStatus) -> Option<DiseaseStatus> {
        match current {
            DiseaseStatus::Latent => Some(DiseaseStatus::InfectiousSubclinical),
            DiseaseStatus::InfectiousSubclinical => Some(DiseaseStatus::InfectiousClinical),
            DiseaseStatus::InfectiousClinical => Some(DiseaseStatus::NaturallyImmune),
            DiseaseStatus::NaturallyImmune if !self.config.riverton_variant => {
                Some(DiseaseStatus::Susceptible)
            }
            _ => None,
        }
    }
}

impl Module for DiseaseModel {
    fn name(&self) -> &str {
        "disease-model"
    }

    fn events_listened_for(&self) -> EventTagSet {
        EventTagSet::from_tags([EventTag::Infection, EventTag::Detection, EventTag::Midnight])
    }

    fn run(&mut self, event: &Event, ctx: &mut ModuleContext) -> SimResult<()> {
        match event {
            Event::Infection { target, r#override, .. } => {
                let production_type = ctx.herds.get(*target).production_type;
                let block = self.config.natural_history.get(&production_type);
                let herd = ctx.herds.get_mut(*target);
                if let Some(ov) = r#override {
                    herd.status = ov.initial_state;
                    herd.days_in_state = ov.days_in_state;
                    herd.days_left_in_state = if ov.days_left_in_state > 0 {
                        ov.days_left_in_state
                    } else {
                        block.map(|b| b.duration_for(ov.initial_state, ctx.rng)).unwrap_or(0)
                    };
                } else {
                    herd.status = DiseaseStatus::Latent;
                    herd.days_in_state = 0;
                    herd.days_left_in_state =
                        block.map(|b| b.duration_for(DiseaseStatus::Latent, ctx.rng)).unwrap_or(0);
                }
            }
            Event::Detection { herd, day, .. } => {
                let herd = ctx.herds.get_mut(*herd);
                if herd.detected_on.is_none() {
                    herd.detected_on = Some(*day);
                }
            }
            Event::Midnight { .. } => {
                let production_types: Vec<_> =
                    ctx.herds.iter().map(|h| (h.id, h.production_type)).collect();
                for (id, production_type) in production_types {
                    let status = ctx.herds.get(id).status;
                    if status.is_absorbing(self.config.riverton_variant) || status == DiseaseStatus::Susceptible {
                        continue;
                    }
                    {
                        let herd = ctx.herds.get_mut(id);
                        if herd.days_left_in_state > 0 {
                            herd.days_left_in_state -= 1;
                            herd.days_in_state += 1;
                        }
                    }
                    let days_left = ctx.herds.get(id).days_left_in_state;
                    if days_left == 0 {
                        if let Some(next) = self.next_state(status) {
                            let duration = match self.config.natural_history.get(&production_type) {
                                Some(block) => block.duration_for(next, ctx.rng),
                                None => 0,
                            };
                            let herd = ctx.herds.get_mut(id);
                            herd.status = next;
                            herd.days_in_state = 0;
                            herd.days_left_in_state = duration;
                        }
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::EventQueue,
        herd::{Herd, HerdId, HerdList, HerdSize, Position},
        ports::distribution::PointMass,
        ports::rng::DefaultRng,
        reason::ReasonTable,
        zone::ZoneList,
    };

    fn natural_history(latent: i32, subclinical: i32, clinical: i32, immune: i32) -> NaturalHistoryBlock {
        NaturalHistoryBlock {
            latent_days: Box::new(PointMass(latent)),
            subclinical_days: Box::new(PointMass(subclinical)),
            clinical_days: Box::new(PointMass(clinical)),
            immune_days: Box::new(PointMass(immune)),
        }
    }

    fn susceptible_herd() -> HerdList {
        HerdList::new(vec![Herd::new(
            HerdId(0),
            "h0",
            ProductionTypeId(0),
            Position::default(),
            HerdSize(10),
            DiseaseStatus::Susceptible,
        )])
    }

    #[test]
    fn infection_moves_a_herd_to_latent_and_samples_its_duration() {
        let mut module = DiseaseModel::new(DiseaseModelConfig {
            natural_history: [(ProductionTypeId(0), natural_history(2, 1, 1, 0))].into(),
            riverton_variant: false,
        });
        let mut herds = susceptible_herd();
        let mut zones = ZoneList::new(vec![]);
        let mut rng = DefaultRng::fixed(0.0);
        let mut queue = EventQueue::new();
        let mut reasons = ReasonTable::default();
        let mut ctx = ModuleContext {
            herds: &mut herds,
            zones: &mut zones,
            rng: &mut rng,
            out_queue: &mut queue,
            reasons: &mut reasons,
        };

        module
            .run(
                &Event::Infection {
                    source: HerdId(1),
                    target: HerdId(0),
                    day: 1,
                    contact_type: crate::event::ContactType::DirectContact,
                    r#override: None,
                },
                &mut ctx,
            )
            .unwrap();

        let herd = ctx.herds.get(HerdId(0));
        assert_eq!(herd.status, DiseaseStatus::Latent);
        assert_eq!(herd.days_left_in_state, 2);
    }

    #[test]
    fn midnight_advances_through_the_full_non_riverton_cycle_back_to_susceptible() {
        let mut module = DiseaseModel::new(DiseaseModelConfig {
            natural_history: [(ProductionTypeId(0), natural_history(1, 1, 1, 1))].into(),
            riverton_variant: false,
        });
        let mut herds = susceptible_herd();
        let mut zones = ZoneList::new(vec![]);
        let mut rng = DefaultRng::fixed(0.0);
        let mut queue = EventQueue::new();
        let mut reasons = ReasonTable::default();
        let mut ctx = ModuleContext {
            herds: &mut herds,
            zones: &mut zones,
            rng: &mut rng,
            out_queue: &mut queue,
            reasons: &mut reasons,
        };

        module
            .run(
                &Event::Infection {
                    source: HerdId(1),
                    target: HerdId(0),
                    day: 1,
                    contact_type: crate::event::ContactType::DirectContact,
                    r#override: None,
                },
                &mut ctx,
            )
            .unwrap();

        let expected = [
            DiseaseStatus::InfectiousSubclinical,
            DiseaseStatus::InfectiousClinical,
            DiseaseStatus::NaturallyImmune,
            DiseaseStatus::Susceptible,
        ];
        for status in expected {
            module.run(&Event::Midnight { day: 2 }, &mut ctx).unwrap();
            assert_eq!(ctx.herds.get(HerdId(0)).status, status);
        }
    }

    #[test]
    fn riverton_variant_leaves_naturally_immune_absorbing() {
        let mut module = DiseaseModel::new(DiseaseModelConfig {
            natural_history: [(ProductionTypeId(0), natural_history(1, 1, 1, 1))].into(),
            riverton_variant: true,
        });
        let mut herds = susceptible_herd();
        let mut zones = ZoneList::new(vec![]);
        let mut rng = DefaultRng::fixed(0.0);
        let mut queue = EventQueue::new();
        let mut reasons = ReasonTable::default();
        let mut ctx = ModuleContext {
            herds: &mut herds,
            zones: &mut zones,
            rng: &mut rng,
            out_queue: &mut queue,
            reasons: &mut reasons,
        };

        module
            .run(
                &Event::Infection {
                    source: HerdId(1),
                    target: HerdId(0),
                    day: 1,
                    contact_type: crate::event::ContactType::DirectContact,
                    r#override: None,
                },
                &mut ctx,
            )
            .unwrap();
        for _ in 0..3 {
            module.run(&Event::Midnight { day: 2 }, &mut ctx).unwrap();
        }
        assert_eq!(ctx.herds.get(HerdId(0)).status, DiseaseStatus::NaturallyImmune);

        // A further Midnight is a no-op: NaturallyImmune is absorbing here.
        module.run(&Event::Midnight { day: 3 }, &mut ctx).unwrap();
        assert_eq!(ctx.herds.get(HerdId(0)).status, DiseaseStatus::NaturallyImmune);
    }

    #[test]
    fn detection_is_recorded_only_once() {
        let mut module = DiseaseModel::new(DiseaseModelConfig {
            natural_history: HashMap::new(),
            riverton_variant: false,
        });
        let mut herds = susceptible_herd();
        let mut zones = ZoneList::new(vec![]);
        let mut rng = DefaultRng::fixed(0.0);
        let mut queue = EventQueue::new();
        let mut reasons = ReasonTable::default();
        let reason = reasons.intern("Det");
        let mut ctx = ModuleContext {
            herds: &mut herds,
            zones: &mut zones,
            rng: &mut rng,
            out_queue: &mut queue,
            reasons: &mut reasons,
        };

        module
            .run(
                &Event::Detection {
                    herd: HerdId(0),
                    day: 4,
                    detection_reason: reason,
                    test_result: None,
                },
                &mut ctx,
            )
            .unwrap();
        module
            .run(
                &Event::Detection {
                    herd: HerdId(0),
                    day: 9,
                    detection_reason: reason,
                    test_result: None,
                },
                &mut ctx,
            )
            .unwrap();

        assert_eq!(ctx.herds.get(HerdId(0)).detected_on, Some(4));
    }
}
