//! The simulation loop: per-iteration lifecycle that issues lifecycle
//! events, pumps the event queue, and detects termination.

use crate::{
    config::ExitConditions,
    error::{SimError, SimResult},
    event::{Event, EventQueue},
    herd::{DiseaseStatus, HerdList},
    module::{ModuleContext, ModuleRegistry},
    ports::{RandomNumberGenerator, rng::DefaultRng},
    reason::ReasonTable,
    zone::ZoneList,
};

pub struct SimulationConfig {
    pub max_days: u32,
    pub exit_conditions: ExitConditions,
}

/// Snapshot of every declared output variable's value after one simulated
/// day, ready for the CSV writer.
pub struct DayReport {
    pub day: u32,
    pub done: bool,
    pub values: Vec<(String, Option<f64>)>,
}

/// Owns every piece of per-scenario state that survives across iterations
/// (herds, zone definitions, the module registry) and drives one run.
pub struct Simulation {
    herds: HerdList,
    zones: ZoneList,
    reasons: ReasonTable,
    registry: ModuleRegistry,
    config: SimulationConfig,
    any_iteration_run: bool,
}

impl Simulation {
    pub fn new(
        herds: HerdList,
        zones: ZoneList,
        registry: ModuleRegistry,
        config: SimulationConfig,
    ) -> Self {
        Self {
            herds,
            zones,
            reasons: ReasonTable::default(),
            registry,
            config,
            any_iteration_run: false,
        }
    }

    /// Drains the queue, dispatching every event (and everything it derives)
    /// until both waves are empty.
    fn drain(
        queue: &mut EventQueue,
        registry: &mut ModuleRegistry,
        herds: &mut HerdList,
        zones: &mut ZoneList,
        reasons: &mut ReasonTable,
        rng: &mut dyn RandomNumberGenerator,
        first_detection_seen: &mut bool,
    ) -> SimResult<()> {
        while let Some(event) = queue.dequeue(rng) {
            if matches!(event, Event::Detection { .. }) {
                *first_detection_seen = true;
            }
            let mut ctx = ModuleContext {
                herds: &mut *herds,
                zones: &mut *zones,
                rng: &mut *rng,
                out_queue: &mut *queue,
                reasons: &mut *reasons,
            };
            registry.dispatch(&event, &mut ctx)?;
        }
        Ok(())
    }

    fn disease_extinct(herds: &HerdList) -> bool {
        herds.iter().all(|h| {
            !matches!(
                h.status,
                DiseaseStatus::Latent | DiseaseStatus::InfectiousSubclinical | DiseaseStatus::InfectiousClinical
            )
        })
    }

    /// Runs one full iteration and returns the per-day output snapshots for
    /// days `1..=last_day`. `rng` should already be seeded with a
    /// reproducible sub-stream dedicated to this iteration.
    pub fn run_iteration(&mut self, rng: &mut dyn RandomNumberGenerator) -> SimResult<Vec<DayReport>> {
        let mut queue = EventQueue::default();

        if !self.any_iteration_run {
            queue.enqueue(Event::BeforeAnySimulations);
            Self::drain(
                &mut queue,
                &mut self.registry,
                &mut self.herds,
                &mut self.zones,
                &mut self.reasons,
                rng,
                &mut false,
            )?;
            self.any_iteration_run = true;
        }

        self.registry.reset_all();
        self.herds.reset();
        self.zones.reset();

        queue.enqueue(Event::BeforeEachSimulation);
        Self::drain(
            &mut queue,
            &mut self.registry,
            &mut self.herds,
            &mut self.zones,
            &mut self.reasons,
            rng,
            &mut false,
        )?;

        queue.enqueue(Event::EndOfDay { day: 0, done: false });
        Self::drain(
            &mut queue,
            &mut self.registry,
            &mut self.herds,
            &mut self.zones,
            &mut self.reasons,
            rng,
            &mut false,
        )?;
        if !queue.is_empty() {
            return Err(SimError::Invariant {
                module: "sim".into(),
                detail: "a module emitted an event in response to EndOfDay".into(),
            });
        }

        let mut reports = Vec::new();
        let mut first_detection_seen = false;

        for day in 1..=self.config.max_days {
            queue.enqueue(Event::NewDay { day });
            Self::drain(
                &mut queue,
                &mut self.registry,
                &mut self.herds,
                &mut self.zones,
                &mut self.reasons,
                rng,
                &mut first_detection_seen,
            )?;

            let quiescent = queue.is_empty()
                && !self.registry.has_pending_actions()
                && !self.registry.has_pending_infections();
            let extinct = Self::disease_extinct(&self.herds);

            let done = day >= self.config.max_days
                || (self.config.exit_conditions.stop_on_first_detection && first_detection_seen)
                || (self.config.exit_conditions.stop_on_disease_extinction && extinct && quiescent);

            queue.enqueue(Event::EndOfDay { day, done });
            Self::drain(
                &mut queue,
                &mut self.registry,
                &mut self.herds,
                &mut self.zones,
                &mut self.reasons,
                rng,
                &mut first_detection_seen,
            )?;
            if !queue.is_empty() {
                return Err(SimError::Invariant {
                    module: "sim".into(),
                    detail: "a module emitted an event in response to EndOfDay".into(),
                });
            }

            reports.push(DayReport {
                day,
                done,
                values: self.registry.report_row(),
            });

            if done {
                queue.enqueue(Event::LastDay { day });
                Self::drain(
                    &mut queue,
                    &mut self.registry,
                    &mut self.herds,
                    &mut self.zones,
                    &mut self.reasons,
                    rng,
                    &mut first_detection_seen,
                )?;
                break;
            }

            queue.enqueue(Event::Midnight { day: day + 1 });
            Self::drain(
                &mut queue,
                &mut self.registry,
                &mut self.herds,
                &mut self.zones,
                &mut self.reasons,
                rng,
                &mut first_detection_seen,
            )?;
            self.zones.reshape();
        }

        Ok(reports)
    }

    pub fn herds(&self) -> &HerdList {
        &self.herds
    }

    /// Every output variable declared by a registered module, in
    /// registration order — the CSV writer's column schema.
    pub fn declared_outputs(&self) -> Vec<crate::io::reporting::OutputHandle> {
        self.registry.outputs()
    }

    /// Runs `n_iterations` sequentially, reseeding a fresh sub-stream for
    /// each. `fixed_random_value` overrides every draw with a constant, as
    /// `--fixed-random-value` does on the CLI.
    pub fn run(
        &mut self,
        n_iterations: u64,
        master_seed: u64,
        fixed_random_value: Option<f64>,
    ) -> SimResult<Vec<Vec<DayReport>>> {
        let mut runs = Vec::with_capacity(n_iterations as usize);
        for iteration in 0..n_iterations {
            let mut rng = match fixed_random_value {
                Some(value) => DefaultRng::fixed(value),
                None => DefaultRng::sub_stream(master_seed, iteration),
            };
            runs.push(self.run_iteration(&mut rng)?);
        }
        Ok(runs)
    }

    /// Runs `n_iterations` across a `rayon` thread pool, each on its own
    /// freshly built `Simulation`. Iterations are embarrassingly parallel:
    /// each depends only on a reseeded RNG sub-stream, never on another
    /// iteration's state, so the engine makes no threading decision of its
    /// own and leaves `build` to the caller.
    pub fn run_many(
        build: impl Fn() -> Simulation + Sync,
        n_iterations: u64,
        master_seed: u64,
        fixed_random_value: Option<f64>,
    ) -> SimResult<Vec<Vec<DayReport>>> {
        use rayon::prelude::*;

        (0..n_iterations)
            .into_par_iter()
            .map(|iteration| {
                let mut rng = match fixed_random_value {
                    Some(value) => DefaultRng::fixed(value),
                    None => DefaultRng::sub_stream(master_seed, iteration),
                };
                build().run_iteration(&mut rng)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::{EventTagSet, types::EventTag},
        herd::{Herd, HerdId, HerdSize, Position},
        module::Module,
        production_type::ProductionTypeId,
    };

    fn empty_herds() -> HerdList {
        HerdList::new(vec![Herd::new(
            HerdId(0),
            "h0",
            ProductionTypeId(0),
            Position::default(),
            HerdSize(10),
            DiseaseStatus::Susceptible,
        )])
    }

    fn config(max_days: u32, exit_conditions: ExitConditions) -> SimulationConfig {
        SimulationConfig { max_days, exit_conditions }
    }

    /// Counts how many times `BeforeAnySimulations` and `BeforeEachSimulation`
    /// have run, through a shared counter so the test can read it back after
    /// the registry has taken ownership of the module. `Module` requires
    /// `Send`, so the shared cell is an `Arc<AtomicU32>` rather than an `Rc`.
    struct LifecycleCounter {
        before_any: std::sync::Arc<std::sync::atomic::AtomicU32>,
        before_each: std::sync::Arc<std::sync::atomic::AtomicU32>,
    }

    impl Module for LifecycleCounter {
        fn name(&self) -> &str {
            "lifecycle-counter"
        }

        fn events_listened_for(&self) -> EventTagSet {
            EventTagSet::from_tags([EventTag::BeforeAnySimulations, EventTag::BeforeEachSimulation])
        }

        fn run(&mut self, event: &Event, _ctx: &mut ModuleContext) -> SimResult<()> {
            use std::sync::atomic::Ordering;
            match event {
                Event::BeforeAnySimulations => {
                    self.before_any.fetch_add(1, Ordering::SeqCst);
                }
                Event::BeforeEachSimulation => {
                    self.before_each.fetch_add(1, Ordering::SeqCst);
                }
                _ => {}
            }
            Ok(())
        }

        fn reset(&mut self) {}
    }

    /// Emits a `Detection` the first time it sees `NewDay { day: 2 }`, to
    /// exercise `stop_on_first_detection`.
    struct DetectsOnDayTwo;

    impl Module for DetectsOnDayTwo {
        fn name(&self) -> &str {
            "detects-on-day-two"
        }

        fn events_listened_for(&self) -> EventTagSet {
            EventTagSet::from_tags([EventTag::NewDay])
        }

        fn run(&mut self, event: &Event, ctx: &mut ModuleContext) -> SimResult<()> {
            if let Event::NewDay { day: 2 } = event {
                ctx.out_queue.enqueue(Event::Detection {
                    herd: HerdId(0),
                    day: 2,
                    detection_reason: ctx.reasons.intern("Det"),
                    test_result: None,
                });
            }
            Ok(())
        }

        fn reset(&mut self) {}
    }

    /// Misbehaves on purpose: emits a further event in response to
    /// `EndOfDay`, which the day loop must reject with `SimError::Invariant`.
    struct BreaksEndOfDayInvariant;

    impl Module for BreaksEndOfDayInvariant {
        fn name(&self) -> &str {
            "breaks-end-of-day-invariant"
        }

        fn events_listened_for(&self) -> EventTagSet {
            EventTagSet::from_tags([EventTag::EndOfDay])
        }

        fn run(&mut self, event: &Event, ctx: &mut ModuleContext) -> SimResult<()> {
            if let Event::EndOfDay { day, .. } = event {
                ctx.out_queue.enqueue(Event::NewDay { day: *day });
            }
            Ok(())
        }

        fn reset(&mut self) {}
    }

    #[test]
    fn before_any_simulations_fires_once_per_simulation_instance() {
        let before_any = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
        let before_each = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
        let mut registry = ModuleRegistry::new();
        registry.register(Box::new(LifecycleCounter {
            before_any: before_any.clone(),
            before_each: before_each.clone(),
        }));
        let mut sim = Simulation::new(
            empty_herds(),
            ZoneList::new(vec![]),
            registry,
            config(2, ExitConditions::default()),
        );
        let mut rng = DefaultRng::fixed(0.0);
        sim.run_iteration(&mut rng).unwrap();
        sim.run_iteration(&mut rng).unwrap();

        assert_eq!(before_any.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(before_each.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn end_of_day_invariant_violation_is_an_error() {
        let mut registry = ModuleRegistry::new();
        registry.register(Box::new(BreaksEndOfDayInvariant));
        let mut sim = Simulation::new(
            empty_herds(),
            ZoneList::new(vec![]),
            registry,
            config(3, ExitConditions::default()),
        );
        let mut rng = DefaultRng::fixed(0.0);
        let err = sim.run_iteration(&mut rng).unwrap_err();
        assert!(matches!(err, SimError::Invariant { .. }));
    }

    #[test]
    fn stop_on_first_detection_ends_the_iteration_on_the_detecting_day() {
        let mut registry = ModuleRegistry::new();
        registry.register(Box::new(DetectsOnDayTwo));
        let mut sim = Simulation::new(
            empty_herds(),
            ZoneList::new(vec![]),
            registry,
            config(
                10,
                ExitConditions {
                    stop_on_first_detection: true,
                    stop_on_disease_extinction: false,
                },
            ),
        );
        let mut rng = DefaultRng::fixed(0.0);
        let reports = sim.run_iteration(&mut rng).unwrap();

        assert_eq!(reports.len(), 2);
        assert!(!reports[0].done);
        assert!(reports[1].done);
        assert_eq!(reports[1].day, 2);
    }

    #[test]
    fn runs_to_max_days_when_no_exit_condition_triggers() {
        let registry = ModuleRegistry::new();
        let mut sim = Simulation::new(
            empty_herds(),
            ZoneList::new(vec![]),
            registry,
            config(5, ExitConditions::default()),
        );
        let mut rng = DefaultRng::fixed(0.0);
        let reports = sim.run_iteration(&mut rng).unwrap();

        assert_eq!(reports.len(), 5);
        assert!(reports[..4].iter().all(|r| !r.done));
        assert!(reports[4].done);
    }
}
