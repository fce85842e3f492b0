//! Destruction and vaccination list monitors: track units/animals awaiting
//! an action, its peak, queue-day accumulation, and average wait time, both
//! overall and broken down by production type.

use std::collections::HashMap;

use crate::{
    error::SimResult,
    event::{Event, EventTagSet, types::EventTag},
    herd::HerdId,
    io::reporting::{Aggregation, OutputHandle},
    module::{Module, ModuleContext},
    production_type::{ProductionTypeId, ProductionTypeRegistry},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorKind {
    Destruction,
    Vaccination,
}

impl MonitorKind {
    fn module_name(self) -> &'static str {
        match self {
            MonitorKind::Destruction => "destruction-monitor",
            MonitorKind::Vaccination => "vaccination-monitor",
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    units_awaiting: u64,
    animals_awaiting: u64,
    peak_units: u64,
    peak_units_day: u32,
    peak_animals: u64,
    peak_animals_day: u32,
    unit_days_in_queue: u64,
    animal_days_in_queue: u64,
    wait_sum: u64,
    wait_count: u64,
}

#[derive(Debug, Default, Clone, Copy)]
struct PerTypeCounters {
    units_awaiting: u64,
    animals_awaiting: u64,
}

/// Shared implementation for both monitors. Vaccination uses a reference
/// count per herd, since multiple concurrent vaccination requests may be
/// committed for the same herd; destruction's count is always 0 or 1.
pub struct ListMonitor {
    kind: MonitorKind,
    counters: Counters,
    by_type: HashMap<ProductionTypeId, PerTypeCounters>,
    production_types: ProductionTypeRegistry,
    refcount: HashMap<HerdId, u32>,
}

impl ListMonitor {
    pub fn new(kind: MonitorKind, production_types: ProductionTypeRegistry) -> Self {
        Self {
            kind,
            counters: Counters::default(),
            by_type: HashMap::new(),
            production_types,
            refcount: HashMap::new(),
        }
    }

    fn on_commitment(&mut self, herd: HerdId, day: u32, ctx: &ModuleContext) {
        let entry = self.refcount.entry(herd).or_insert(0);
        *entry += 1;
        if *entry == 1 {
            let h = ctx.herds.get(herd);
            let size = h.size.0 as u64;
            let production_type = h.production_type;
            self.counters.units_awaiting += 1;
            self.counters.animals_awaiting += size;
            if self.counters.units_awaiting > self.counters.peak_units {
                self.counters.peak_units = self.counters.units_awaiting;
                self.counters.peak_units_day = day;
            }
            if self.counters.animals_awaiting > self.counters.peak_animals {
                self.counters.peak_animals = self.counters.animals_awaiting;
                self.counters.peak_animals_day = day;
            }
            let per_type = self.by_type.entry(production_type).or_default();
            per_type.units_awaiting += 1;
            per_type.animals_awaiting += size;
        }
    }

    fn on_released(&mut self, herd: HerdId, ctx: &ModuleContext) {
        if let Some(entry) = self.refcount.get_mut(&herd) {
            if *entry > 0 {
                *entry -= 1;
            }
            if *entry == 0 {
                let h = ctx.herds.get(herd);
                let size = h.size.0 as u64;
                let production_type = h.production_type;
                self.counters.units_awaiting = self.counters.units_awaiting.saturating_sub(1);
                self.counters.animals_awaiting = self.counters.animals_awaiting.saturating_sub(size);
                if let Some(per_type) = self.by_type.get_mut(&production_type) {
                    per_type.units_awaiting = per_type.units_awaiting.saturating_sub(1);
                    per_type.animals_awaiting = per_type.animals_awaiting.saturating_sub(size);
                }
            }
        }
    }

    fn record_wait(&mut self, day: u32, day_commitment_made: u32) {
        self.counters.wait_sum += (day - day_commitment_made) as u64;
        self.counters.wait_count += 1;
    }
}

impl Module for ListMonitor {
    fn name(&self) -> &str {
        self.kind.module_name()
    }

    fn events_listened_for(&self) -> EventTagSet {
        match self.kind {
            MonitorKind::Destruction => EventTagSet::from_tags([
                EventTag::CommitmentToDestroy,
                EventTag::Destruction,
                EventTag::NewDay,
            ]),
            MonitorKind::Vaccination => EventTagSet::from_tags([
                EventTag::CommitmentToVaccinate,
                EventTag::Vaccination,
                EventTag::VaccinationCanceled,
                EventTag::NewDay,
            ]),
        }
    }

    fn outputs(&self) -> Vec<OutputHandle> {
        let name = self.kind.module_name();
        let mut handles = vec![
            OutputHandle::new(name, "units-awaiting", Aggregation::Daily),
            OutputHandle::new(name, "animals-awaiting", Aggregation::Daily),
            OutputHandle::new(name, "peak-units-awaiting", Aggregation::PerIteration),
            OutputHandle::new(name, "peak-units-day", Aggregation::PerIteration),
            OutputHandle::new(name, "peak-animals-awaiting", Aggregation::PerIteration),
            OutputHandle::new(name, "peak-animals-day", Aggregation::PerIteration),
            OutputHandle::new(name, "unit-days-in-queue", Aggregation::PerIteration),
            OutputHandle::new(name, "animal-days-in-queue", Aggregation::PerIteration),
            OutputHandle::new(name, "avg-wait-time", Aggregation::PerIteration),
        ];
        for production_type in self.production_types.ids() {
            let type_name = self.production_types.name(production_type);
            handles.push(OutputHandle::new(name, format!("units-awaiting.{type_name}"), Aggregation::Daily));
            handles.push(OutputHandle::new(name, format!("animals-awaiting.{type_name}"), Aggregation::Daily));
        }
        handles
    }

    fn report_value(&self, variable_name: &str) -> Option<f64> {
        let c = &self.counters;
        match variable_name {
            "units-awaiting" => return Some(c.units_awaiting as f64),
            "animals-awaiting" => return Some(c.animals_awaiting as f64),
            "peak-units-awaiting" => return Some(c.peak_units as f64),
            "peak-units-day" => return Some(c.peak_units_day as f64),
            "peak-animals-awaiting" => return Some(c.peak_animals as f64),
            "peak-animals-day" => return Some(c.peak_animals_day as f64),
            "unit-days-in-queue" => return Some(c.unit_days_in_queue as f64),
            "animal-days-in-queue" => return Some(c.animal_days_in_queue as f64),
            "avg-wait-time" => {
                return if c.wait_count == 0 {
                    Some(0.0)
                } else {
                    Some(c.wait_sum as f64 / c.wait_count as f64)
                };
            }
            _ => {}
        }
        if let Some(type_name) = variable_name.strip_prefix("units-awaiting.") {
            let production_type = self.production_types.id_of(type_name)?;
            return Some(self.by_type.get(&production_type).copied().unwrap_or_default().units_awaiting as f64);
        }
        if let Some(type_name) = variable_name.strip_prefix("animals-awaiting.") {
            let production_type = self.production_types.id_of(type_name)?;
            return Some(self.by_type.get(&production_type).copied().unwrap_or_default().animals_awaiting as f64);
        }
        None
    }

    fn run(&mut self, event: &Event, ctx: &mut ModuleContext) -> SimResult<()> {
        match (self.kind, event) {
            (MonitorKind::Destruction, Event::CommitmentToDestroy { herd, day }) => {
                self.on_commitment(*herd, *day, ctx);
            }
            (
                MonitorKind::Destruction,
                Event::Destruction {
                    herd,
                    day,
                    day_commitment_made,
                    ..
                },
            ) => {
                self.record_wait(*day, *day_commitment_made);
                self.on_released(*herd, ctx);
            }
            (MonitorKind::Vaccination, Event::CommitmentToVaccinate { herd, day }) => {
                self.on_commitment(*herd, *day, ctx);
            }
            (
                MonitorKind::Vaccination,
                Event::Vaccination {
                    herd,
                    day,
                    day_commitment_made,
                    ..
                },
            ) => {
                self.record_wait(*day, *day_commitment_made);
                self.on_released(*herd, ctx);
            }
            (MonitorKind::Vaccination, Event::VaccinationCanceled { herd, .. }) => {
                self.on_released(*herd, ctx);
            }
            (_, Event::NewDay { .. }) => {
                self.counters.unit_days_in_queue += self.counters.units_awaiting;
                self.counters.animal_days_in_queue += self.counters.animals_awaiting;
            }
            _ => {}
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.counters = Counters::default();
        self.by_type.clear();
        self.refcount.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::EventQueue,
        herd::{DiseaseStatus, Herd, Position},
        ports::rng::DefaultRng,
        production_type::ProductionTypeId,
        reason::ReasonTable,
        zone::ZoneList,
    };

    fn production_types() -> ProductionTypeRegistry {
        ProductionTypeRegistry::new(vec!["cattle".into()])
    }

    fn context_pieces() -> (crate::herd::HerdList, ZoneList, DefaultRng, EventQueue, ReasonTable) {
        let herds = crate::herd::HerdList::new(vec![Herd::new(
            HerdId(0),
            "h0",
            ProductionTypeId(0),
            Position::default(),
            crate::herd::HerdSize(20),
            DiseaseStatus::Susceptible,
        )]);
        (
            herds,
            ZoneList::new(vec![]),
            DefaultRng::fixed(0.0),
            EventQueue::new(),
            ReasonTable::default(),
        )
    }

    #[test]
    fn tracks_units_and_animals_awaiting_destruction() {
        let (mut herds, mut zones, mut rng, mut queue, mut reasons) = context_pieces();
        let reason = reasons.intern("Ring");
        let mut monitor = ListMonitor::new(MonitorKind::Destruction, production_types());
        let mut ctx = ModuleContext {
            herds: &mut herds,
            zones: &mut zones,
            rng: &mut rng,
            out_queue: &mut queue,
            reasons: &mut reasons,
        };

        monitor
            .run(&Event::CommitmentToDestroy { herd: HerdId(0), day: 1 }, &mut ctx)
            .unwrap();
        assert_eq!(monitor.report_value("units-awaiting"), Some(1.0));
        assert_eq!(monitor.report_value("animals-awaiting"), Some(20.0));

        monitor.run(&Event::NewDay { day: 2 }, &mut ctx).unwrap();
        assert_eq!(monitor.report_value("unit-days-in-queue"), Some(1.0));

        monitor
            .run(
                &Event::Destruction {
                    herd: HerdId(0),
                    day: 3,
                    reason,
                    day_commitment_made: 1,
                },
                &mut ctx,
            )
            .unwrap();
        assert_eq!(monitor.report_value("units-awaiting"), Some(0.0));
        assert_eq!(monitor.report_value("avg-wait-time"), Some(2.0));
        assert_eq!(monitor.report_value("peak-units-awaiting"), Some(1.0));
    }

    #[test]
    fn breaks_units_and_animals_awaiting_down_by_production_type() {
        let (mut herds, mut zones, mut rng, mut queue, mut reasons) = context_pieces();
        let mut monitor = ListMonitor::new(MonitorKind::Destruction, production_types());
        let mut ctx = ModuleContext {
            herds: &mut herds,
            zones: &mut zones,
            rng: &mut rng,
            out_queue: &mut queue,
            reasons: &mut reasons,
        };

        monitor
            .run(&Event::CommitmentToDestroy { herd: HerdId(0), day: 1 }, &mut ctx)
            .unwrap();
        assert_eq!(monitor.report_value("units-awaiting.cattle"), Some(1.0));
        assert_eq!(monitor.report_value("animals-awaiting.cattle"), Some(20.0));
        assert!(monitor
            .outputs()
            .iter()
            .any(|h| h.variable_name == "units-awaiting.cattle"));
    }

    #[test]
    fn vaccination_refcounts_stay_committed_until_every_request_clears() {
        let (mut herds, mut zones, mut rng, mut queue, mut reasons) = context_pieces();
        let mut monitor = ListMonitor::new(MonitorKind::Vaccination, production_types());
        let mut ctx = ModuleContext {
            herds: &mut herds,
            zones: &mut zones,
            rng: &mut rng,
            out_queue: &mut queue,
            reasons: &mut reasons,
        };

        monitor
            .run(&Event::CommitmentToVaccinate { herd: HerdId(0), day: 1 }, &mut ctx)
            .unwrap();
        monitor
            .run(&Event::CommitmentToVaccinate { herd: HerdId(0), day: 1 }, &mut ctx)
            .unwrap();
        assert_eq!(monitor.report_value("units-awaiting"), Some(1.0));

        monitor
            .run(&Event::VaccinationCanceled { herd: HerdId(0), day: 2, day_commitment_made: 1 }, &mut ctx)
            .unwrap();
        // Still one outstanding request after a single cancellation.
        assert_eq!(monitor.report_value("units-awaiting"), Some(1.0));

        monitor
            .run(&Event::VaccinationCanceled { herd: HerdId(0), day: 2, day_commitment_made: 1 }, &mut ctx)
            .unwrap();
        assert_eq!(monitor.report_value("units-awaiting"), Some(0.0));
    }

    #[test]
    fn reset_clears_every_counter() {
        let (mut herds, mut zones, mut rng, mut queue, mut reasons) = context_pieces();
        let mut monitor = ListMonitor::new(MonitorKind::Destruction, production_types());
        {
            let mut ctx = ModuleContext {
                herds: &mut herds,
                zones: &mut zones,
                rng: &mut rng,
                out_queue: &mut queue,
                reasons: &mut reasons,
            };
            monitor
                .run(&Event::CommitmentToDestroy { herd: HerdId(0), day: 1 }, &mut ctx)
                .unwrap();
        }
        monitor.reset();
        assert_eq!(monitor.report_value("units-awaiting"), Some(0.0));
        assert_eq!(monitor.report_value("avg-wait-time"), Some(0.0));
    }
}
