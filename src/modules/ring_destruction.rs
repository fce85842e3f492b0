//! Ring destruction: on detection, request destruction of every nearby herd
//! of a configured production type.

use std::collections::HashSet;

use crate::{
    error::SimResult,
    event::{Event, EventTagSet, types::EventTag},
    module::{Module, ModuleContext},
    production_type::ProductionTypeId,
    reason::ReasonId,
};

pub struct RingDestructionConfig {
    pub from_types: HashSet<ProductionTypeId>,
    pub to_types: HashSet<ProductionTypeId>,
    pub radius_km: f64,
    pub priority: u32,
    pub reason: String,
    pub riverton_variant: bool,
}

pub struct RingDestruction {
    config: RingDestructionConfig,
    reason_id: Option<ReasonId>,
}

impl RingDestruction {
    pub fn new(config: RingDestructionConfig) -> Self {
        Self {
            config,
            reason_id: None,
        }
    }
}

impl Module for RingDestruction {
    fn name(&self) -> &str {
        "ring-destruction"
    }

    fn events_listened_for(&self) -> EventTagSet {
        EventTagSet::from_tags([EventTag::BeforeAnySimulations, EventTag::Detection])
    }

    fn run(&mut self, event: &Event, ctx: &mut ModuleContext) -> SimResult<()> {
        match event {
            Event::BeforeAnySimulations => {
                ctx.out_queue.enqueue(Event::DeclarationOfDestructionReasons {
                    reasons: vec![self.config.reason.clone()],
                });
                self.reason_id = Some(ctx.reasons.intern(&self.config.reason));
            }
            Event::Detection { herd, day, .. } => {
                let detected = ctx.herds.get(*herd).clone();
                if !self.config.from_types.contains(&detected.production_type) {
                    return Ok(());
                }
                let reason = self.reason_id.expect("reasons declared before first iteration");
                let targets: Vec<_> = ctx
                    .herds
                    .iter()
                    .filter(|h| h.id != *herd)
                    .filter(|h| self.config.to_types.contains(&h.production_type))
                    .filter(|h| !h.status.is_absorbing(self.config.riverton_variant))
                    .filter(|h| h.position.distance_km(&detected.position) <= self.config.radius_km)
                    .map(|h| h.id)
                    .collect();
                for target in targets {
                    ctx.out_queue.enqueue(Event::RequestForDestruction {
                        herd: target,
                        day: *day,
                        reason,
                        priority: self.config.priority,
                        day_commitment_made: None,
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn reset(&mut self) {
        // `reason_id` survives reset: it is assigned once in response to
        // `BeforeAnySimulations`, which fires only before iteration 0.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::EventQueue,
        herd::{DiseaseStatus, Herd, HerdId, HerdList, HerdSize, Position},
        ports::rng::DefaultRng,
        reason::ReasonTable,
        zone::ZoneList,
    };

    fn herd(id: u32, production_type: ProductionTypeId, x: f64, status: DiseaseStatus) -> Herd {
        Herd::new(
            HerdId(id),
            format!("h{id}"),
            production_type,
            Position { x, y: 0.0 },
            HerdSize(10),
            status,
        )
    }

    #[test]
    fn declares_reason_before_any_simulations() {
        let mut module = RingDestruction::new(RingDestructionConfig {
            from_types: [ProductionTypeId(0)].into(),
            to_types: [ProductionTypeId(0)].into(),
            radius_km: 1.0,
            priority: 1,
            reason: "Ring".into(),
            riverton_variant: false,
        });
        let mut herds = HerdList::new(vec![herd(0, ProductionTypeId(0), 0.0, DiseaseStatus::Susceptible)]);
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

        module.run(&Event::BeforeAnySimulations, &mut ctx).unwrap();

        assert_eq!(reasons.lookup("Ring"), Some(module.reason_id.unwrap()));
        assert!(matches!(
            queue.dequeue(&mut rng),
            Some(Event::DeclarationOfDestructionReasons { .. })
        ));
    }

    #[test]
    fn requests_destruction_only_for_in_radius_matching_targets() {
        let mut module = RingDestruction::new(RingDestructionConfig {
            from_types: [ProductionTypeId(0)].into(),
            to_types: [ProductionTypeId(1)].into(),
            radius_km: 2.0,
            priority: 5,
            reason: "Ring".into(),
            riverton_variant: false,
        });
        let mut herds = HerdList::new(vec![
            herd(0, ProductionTypeId(0), 0.0, DiseaseStatus::InfectiousClinical), // detected
            herd(1, ProductionTypeId(1), 1.0, DiseaseStatus::Susceptible),        // in radius, matching type
            herd(2, ProductionTypeId(1), 10.0, DiseaseStatus::Susceptible),       // out of radius
            herd(3, ProductionTypeId(0), 1.0, DiseaseStatus::Susceptible),        // wrong type
            herd(4, ProductionTypeId(1), 1.5, DiseaseStatus::Destroyed),          // absorbing, excluded
        ]);
        let mut zones = ZoneList::new(vec![]);
        let mut rng = DefaultRng::fixed(0.0);
        let mut queue = EventQueue::new();
        let mut reasons = ReasonTable::default();
        {
            let mut ctx = ModuleContext {
                herds: &mut herds,
                zones: &mut zones,
                rng: &mut rng,
                out_queue: &mut queue,
                reasons: &mut reasons,
            };
            module.run(&Event::BeforeAnySimulations, &mut ctx).unwrap();
            queue.dequeue(&mut rng);
        }

        let detection_reason = reasons.intern("Det");
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
                    day: 3,
                    detection_reason,
                    test_result: None,
                },
                &mut ctx,
            )
            .unwrap();

        let mut requested = Vec::new();
        while let Some(event) = queue.dequeue(&mut rng) {
            if let Event::RequestForDestruction { herd, .. } = event {
                requested.push(herd);
            }
        }
        assert_eq!(requested, vec![HerdId(1)]);
    }
}
