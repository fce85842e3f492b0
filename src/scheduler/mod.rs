//! The resource/priority scheduler: the authorities' destruction and
//! vaccination lifecycle, capacity-limited and ordered by a configurable
//! priority scheme.

pub mod capacity;
pub mod priority;

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::{
    error::SimResult,
    event::{Event, EventTagSet, types::EventTag},
    herd::{DiseaseStatus, HerdId},
    module::{Module, ModuleContext},
    production_type::ProductionTypeId,
    reason::ReasonId,
};

use capacity::CapacityChart;
use priority::{PriorityAxisOrder, TimeWaitingPriority, pop_by_priority};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSchedulerConfig {
    pub n_production_types: usize,
    pub destruction_capacity: CapacityChart,
    pub vaccination_capacity: CapacityChart,
    /// Days between the first detection and the day the destruction program
    /// may begin.
    pub program_delay: u32,
    /// Number of detections required before vaccination requests are acted
    /// on rather than discarded as speculative.
    pub vaccination_program_threshold: u32,
    pub destruction_axis_order: PriorityAxisOrder,
    pub destruction_time_waiting: TimeWaitingPriority,
    pub vaccination_axis_order: PriorityAxisOrder,
    pub vaccination_time_waiting: TimeWaitingPriority,
}

#[derive(Debug, Clone, Copy)]
struct DestructionEntry {
    herd: HerdId,
    day: u32,
    reason: ReasonId,
    priority: u32,
    production_type: ProductionTypeId,
}

#[derive(Debug, Clone, Copy)]
struct VaccinationEntry {
    herd: HerdId,
    day: u32,
    reason: ReasonId,
    priority: u32,
    production_type: ProductionTypeId,
    cancel_on_detection: bool,
    min_days_before_next: u32,
}

/// Owns the authorities' destruction and vaccination lifecycle: priority
/// sub-queues, capacity charts, and the non-owning back-reference tables
/// that track which sub-queue currently holds a given herd.
pub struct ResourceScheduler {
    config: ResourceSchedulerConfig,
    n_reasons: usize,

    destruction_queues: Vec<VecDeque<DestructionEntry>>,
    vaccination_queues: Vec<VecDeque<VaccinationEntry>>,

    /// Back-reference: sub-queue index the herd currently occupies. Present
    /// in this map iff present in exactly that queue.
    destruction_status: HashMap<HerdId, usize>,
    /// Back-reference: every sub-queue index the herd currently occupies
    /// (duplicates allowed — a herd can be requested for vaccination under
    /// more than one reason at once).
    vaccination_status: HashMap<HerdId, Vec<usize>>,

    outbreak_known: bool,
    first_detection_day: Option<u32>,
    destruction_program_begin_day: Option<u32>,
    /// Cumulative set of herds ever detected, used for the vaccination
    /// threshold check.
    detected_herds: HashSet<HerdId>,
    detected_today: HashSet<HerdId>,
    destroyed_today: HashSet<HerdId>,
    day_last_vaccinated: HashMap<HerdId, u32>,

    destruction_reasons: Vec<ReasonId>,
    vaccination_reasons: Vec<ReasonId>,

    destruction_exhausted: bool,
    vaccination_exhausted: bool,
}

impl ResourceScheduler {
    pub fn new(config: ResourceSchedulerConfig) -> Self {
        Self {
            config,
            n_reasons: 0,
            destruction_queues: Vec::new(),
            vaccination_queues: Vec::new(),
            destruction_status: HashMap::new(),
            vaccination_status: HashMap::new(),
            outbreak_known: false,
            first_detection_day: None,
            destruction_program_begin_day: None,
            detected_herds: HashSet::new(),
            detected_today: HashSet::new(),
            destroyed_today: HashSet::new(),
            day_last_vaccinated: HashMap::new(),
            destruction_reasons: Vec::new(),
            vaccination_reasons: Vec::new(),
            destruction_exhausted: false,
            vaccination_exhausted: false,
        }
    }

    fn n_pt(&self) -> usize {
        self.config.n_production_types
    }

    /// Grows both queue vectors to fit `n_reasons` sub-queues per
    /// production type, redistributing any existing entries. A no-op once
    /// reasons stop growing, which in practice is before the first
    /// `NewDay` (declarations happen in response to `BeforeAnySimulations`).
    fn ensure_reason_capacity(&mut self, n_reasons: usize) {
        if n_reasons <= self.n_reasons {
            return;
        }
        self.n_reasons = n_reasons;

        let mut new_destruction = vec![VecDeque::new(); self.n_pt() * n_reasons];
        for entry in self.destruction_queues.drain(..).flatten() {
            let idx = self.config.destruction_axis_order.sub_queue_index(
                entry.production_type,
                entry.reason,
                self.n_pt(),
                n_reasons,
            );
            new_destruction[idx].push_back(entry);
            self.destruction_status.insert(entry.herd, idx);
        }
        self.destruction_queues = new_destruction;

        let mut new_vaccination = vec![VecDeque::new(); self.n_pt() * n_reasons];
        let mut new_status: HashMap<HerdId, Vec<usize>> = HashMap::new();
        for entry in self.vaccination_queues.drain(..).flatten() {
            let idx = self.config.vaccination_axis_order.sub_queue_index(
                entry.production_type,
                entry.reason,
                self.n_pt(),
                n_reasons,
            );
            new_vaccination[idx].push_back(entry);
            new_status.entry(entry.herd).or_default().push(idx);
        }
        self.vaccination_queues = new_vaccination;
        self.vaccination_status = new_status;
    }

    fn destruction_sub_queue(&self, production_type: ProductionTypeId, reason: ReasonId) -> usize {
        self.config
            .destruction_axis_order
            .sub_queue_index(production_type, reason, self.n_pt(), self.n_reasons)
    }

    fn vaccination_sub_queue(&self, production_type: ProductionTypeId, reason: ReasonId) -> usize {
        self.config
            .vaccination_axis_order
            .sub_queue_index(production_type, reason, self.n_pt(), self.n_reasons)
    }

    fn should_replace_destruction(&self, old: &DestructionEntry, new_day: u32, new_priority: u32, new_sub_queue: usize) -> bool {
        let old_sub_queue = self.destruction_sub_queue(old.production_type, old.reason);
        match self.config.destruction_time_waiting {
            TimeWaitingPriority::First => old.day == new_day && new_priority < old.priority,
            TimeWaitingPriority::Third => new_priority < old.priority,
            TimeWaitingPriority::Second => {
                let block_size = self
                    .config
                    .destruction_axis_order
                    .block_size(self.n_pt(), self.n_reasons)
                    .max(1);
                let old_block = old_sub_queue / block_size;
                let new_block = new_sub_queue / block_size;
                new_block < old_block || (old.day == new_day && new_priority < old.priority)
            }
        }
    }

    fn remove_destruction_entry(&mut self, herd: HerdId) -> Option<DestructionEntry> {
        let sub_queue = self.destruction_status.remove(&herd)?;
        let queue = &mut self.destruction_queues[sub_queue];
        let position = queue.iter().position(|e| e.herd == herd)?;
        queue.remove(position)
    }

    fn remove_vaccination_entries(&mut self, herd: HerdId) -> Vec<VaccinationEntry> {
        let Some(locations) = self.vaccination_status.remove(&herd) else {
            return Vec::new();
        };
        let mut removed = Vec::new();
        let mut touched: Vec<usize> = locations;
        touched.sort_unstable();
        touched.dedup();
        for sub_queue in touched {
            self.vaccination_queues[sub_queue].retain(|e| {
                if e.herd == herd {
                    removed.push(*e);
                    false
                } else {
                    true
                }
            });
        }
        removed
    }

    fn days_since_first_detection(&self, day: u32) -> i64 {
        day as i64 - self.first_detection_day.unwrap_or(day) as i64 - 1
    }

    fn dispatch_destructions(&mut self, day: u32, ctx: &mut ModuleContext) -> SimResult<()> {
        let Some(begin_day) = self.destruction_program_begin_day else {
            return Ok(());
        };
        if !self.outbreak_known || day < begin_day || self.destruction_exhausted {
            return Ok(());
        }
        let days_since = self.days_since_first_detection(day);
        let capacity = self.config.destruction_capacity.capacity_at(days_since);
        if let Some(absorbing_day) = self.config.destruction_capacity.zero_absorbing_day() {
            if days_since >= absorbing_day {
                self.destruction_exhausted = true;
            }
        }
        let block_size = self
            .config
            .destruction_axis_order
            .block_size(self.n_pt(), self.n_reasons);
        let popped = pop_by_priority(
            &mut self.destruction_queues,
            capacity,
            self.config.destruction_time_waiting,
            block_size,
            |e| e.day,
        );
        for entry in popped {
            self.destruction_status.remove(&entry.herd);
            self.destroyed_today.insert(entry.herd);
            ctx.herds.get_mut(entry.herd).status = DiseaseStatus::Destroyed;
            ctx.out_queue.enqueue(Event::Destruction {
                herd: entry.herd,
                day,
                reason: entry.reason,
                day_commitment_made: entry.day,
            });
            for cancelled in self.remove_vaccination_entries(entry.herd) {
                ctx.out_queue.enqueue(Event::VaccinationCanceled {
                    herd: entry.herd,
                    day,
                    day_commitment_made: cancelled.day,
                });
            }
        }
        Ok(())
    }

    fn dispatch_vaccinations(&mut self, day: u32, ctx: &mut ModuleContext) -> SimResult<()> {
        if self.detected_herds.len() < self.config.vaccination_program_threshold as usize {
            for queue in &mut self.vaccination_queues {
                queue.clear();
            }
            self.vaccination_status.clear();
            return Ok(());
        }
        if self.vaccination_exhausted {
            return Ok(());
        }
        let days_since = self.days_since_first_detection(day);
        let capacity = self.config.vaccination_capacity.capacity_at(days_since);
        if let Some(absorbing_day) = self.config.vaccination_capacity.zero_absorbing_day() {
            if days_since >= absorbing_day {
                self.vaccination_exhausted = true;
            }
        }
        let block_size = self
            .config
            .vaccination_axis_order
            .block_size(self.n_pt(), self.n_reasons);
        let popped = pop_by_priority(
            &mut self.vaccination_queues,
            capacity,
            self.config.vaccination_time_waiting,
            block_size,
            |e| e.day,
        );
        for entry in popped {
            if let Some(locations) = self.vaccination_status.get_mut(&entry.herd) {
                if let Some(pos) = locations.iter().position(|&sq| sq == self.vaccination_sub_queue(entry.production_type, entry.reason)) {
                    locations.remove(pos);
                }
                if locations.is_empty() {
                    self.vaccination_status.remove(&entry.herd);
                }
            }
            let too_soon = self
                .day_last_vaccinated
                .get(&entry.herd)
                .is_some_and(|&last| day - last < entry.min_days_before_next);
            if too_soon {
                ctx.out_queue.enqueue(Event::VaccinationCanceled {
                    herd: entry.herd,
                    day,
                    day_commitment_made: entry.day,
                });
            } else {
                ctx.out_queue.enqueue(Event::Vaccination {
                    herd: entry.herd,
                    day,
                    reason: entry.reason,
                    day_commitment_made: entry.day,
                    r#override: None,
                });
            }
        }
        Ok(())
    }
}

impl Module for ResourceScheduler {
    fn name(&self) -> &str {
        "resource-scheduler"
    }

    fn events_listened_for(&self) -> EventTagSet {
        EventTagSet::from_tags([
            EventTag::DeclarationOfDestructionReasons,
            EventTag::DeclarationOfVaccinationReasons,
            EventTag::Detection,
            EventTag::RequestForDestruction,
            EventTag::RequestForVaccination,
            EventTag::RequestForZoneFocus,
            EventTag::Vaccination,
            EventTag::NewDay,
        ])
    }

    fn run(&mut self, event: &Event, ctx: &mut ModuleContext) -> SimResult<()> {
        match event {
            Event::DeclarationOfDestructionReasons { reasons } => {
                for reason in reasons {
                    self.destruction_reasons.push(ctx.reasons.intern(reason));
                }
                self.ensure_reason_capacity(ctx.reasons.len());
            }
            Event::DeclarationOfVaccinationReasons { reasons } => {
                for reason in reasons {
                    self.vaccination_reasons.push(ctx.reasons.intern(reason));
                }
                self.ensure_reason_capacity(ctx.reasons.len());
            }
            Event::Detection { herd, day, .. } => {
                self.detected_today.insert(*herd);
                self.detected_herds.insert(*herd);
                if !self.outbreak_known {
                    self.outbreak_known = true;
                    self.first_detection_day = Some(*day);
                    self.destruction_program_begin_day =
                        Some(*day + self.config.program_delay + 1);
                    ctx.out_queue.enqueue(Event::PublicAnnouncement { day: *day });
                }
                if let Some(locations) = self.vaccination_status.get(herd) {
                    if !locations.is_empty() {
                        let oldest = locations
                            .iter()
                            .filter_map(|&sq| {
                                self.vaccination_queues[sq]
                                    .iter()
                                    .find(|e| e.herd == *herd)
                            })
                            .min_by_key(|e| e.day)
                            .copied();
                        if let Some(oldest) = oldest {
                            if oldest.cancel_on_detection {
                                for cancelled in self.remove_vaccination_entries(*herd) {
                                    ctx.out_queue.enqueue(Event::VaccinationCanceled {
                                        herd: *herd,
                                        day: *day,
                                        day_commitment_made: cancelled.day,
                                    });
                                }
                            }
                        }
                    }
                }
            }
            Event::RequestForDestruction {
                herd, day, reason, priority, ..
            } => {
                if self.destroyed_today.contains(herd) {
                    return Ok(());
                }
                let production_type = ctx.herds.get(*herd).production_type;
                let sub_queue = self.destruction_sub_queue(production_type, *reason);
                match self.destruction_status.get(herd).copied() {
                    None => {
                        self.destruction_queues[sub_queue].push_back(DestructionEntry {
                            herd: *herd,
                            day: *day,
                            reason: *reason,
                            priority: *priority,
                            production_type,
                        });
                        self.destruction_status.insert(*herd, sub_queue);
                        ctx.out_queue
                            .enqueue(Event::CommitmentToDestroy { herd: *herd, day: *day });
                    }
                    Some(old_sub_queue) => {
                        let old = self.destruction_queues[old_sub_queue]
                            .iter()
                            .find(|e| e.herd == *herd)
                            .copied();
                        if let Some(old) = old {
                            if self.should_replace_destruction(&old, *day, *priority, sub_queue) {
                                self.remove_destruction_entry(*herd);
                                self.destruction_queues[sub_queue].push_back(DestructionEntry {
                                    herd: *herd,
                                    day: *day,
                                    reason: *reason,
                                    priority: *priority,
                                    production_type,
                                });
                                self.destruction_status.insert(*herd, sub_queue);
                            }
                        }
                    }
                }
            }
            Event::RequestForVaccination {
                herd,
                day,
                reason,
                priority,
                cancel_on_detection,
                min_days_before_next,
                ..
            } => {
                if self.destroyed_today.contains(herd)
                    || (*cancel_on_detection && self.detected_today.contains(herd))
                {
                    return Ok(());
                }
                let production_type = ctx.herds.get(*herd).production_type;
                let sub_queue = self.vaccination_sub_queue(production_type, *reason);
                self.vaccination_queues[sub_queue].push_back(VaccinationEntry {
                    herd: *herd,
                    day: *day,
                    reason: *reason,
                    priority: *priority,
                    production_type,
                    cancel_on_detection: *cancel_on_detection,
                    min_days_before_next: *min_days_before_next,
                });
                self.vaccination_status
                    .entry(*herd)
                    .or_default()
                    .push(sub_queue);
                ctx.out_queue
                    .enqueue(Event::CommitmentToVaccinate { herd: *herd, day: *day });
            }
            Event::RequestForZoneFocus { herd, .. } => {
                let position = ctx.herds.get(*herd).position;
                ctx.zones.request_focus(position);
            }
            Event::Vaccination { herd, day, .. } => {
                self.day_last_vaccinated.insert(*herd, *day);
            }
            Event::NewDay { day } => {
                self.detected_today.clear();
                self.destroyed_today.clear();
                self.dispatch_destructions(*day, ctx)?;
                self.dispatch_vaccinations(*day, ctx)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Clears every pending commitment and per-outbreak latch between
    /// iterations. Sub-queue *shape* (`n_reasons`, the queue vectors'
    /// length) is established once from `DeclarationOf*Reasons`, which fires
    /// only before the first iteration — it must survive `reset`, or the
    /// next `RequestForDestruction` would index a queue vector reset back to
    /// empty.
    fn reset(&mut self) {
        for queue in &mut self.destruction_queues {
            queue.clear();
        }
        for queue in &mut self.vaccination_queues {
            queue.clear();
        }
        self.destruction_status.clear();
        self.vaccination_status.clear();
        self.outbreak_known = false;
        self.first_detection_day = None;
        self.destruction_program_begin_day = None;
        self.detected_herds.clear();
        self.detected_today.clear();
        self.destroyed_today.clear();
        self.day_last_vaccinated.clear();
        self.destruction_exhausted = false;
        self.vaccination_exhausted = false;
    }

    fn has_pending_actions(&self) -> bool {
        !self.destruction_status.is_empty() || !self.vaccination_status.is_empty()
    }
}
