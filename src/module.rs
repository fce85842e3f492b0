//! The module interface and registry.
//!
//! The engine holds a flat, registration-ordered list of [`Module`]s and
//! dispatches each dequeued event to every subscriber whose
//! `events_listened_for` bitset contains the event's tag — a publish/
//! subscribe fan-out in place of per-module function-pointer tables.

use crate::{
    error::SimResult,
    event::{Event, EventQueue, EventTagSet},
    herd::HerdList,
    io::reporting::OutputHandle,
    ports::RandomNumberGenerator,
    reason::ReasonTable,
    zone::ZoneList,
};

/// Everything a module's `run` needs to read or mutate shared state and
/// forward derived events. Borrowed for the duration of one dispatch; no
/// module may hold it past `run` returning.
pub struct ModuleContext<'a> {
    pub herds: &'a mut HerdList,
    pub zones: &'a mut ZoneList,
    pub rng: &'a mut dyn RandomNumberGenerator,
    pub out_queue: &'a mut EventQueue,
    /// Shared reason-string interning table: each reason string goes into a
    /// small table on first declaration, so later comparisons become
    /// integer equality checks.
    pub reasons: &'a mut ReasonTable,
}

/// A domain module: either a singleton (one instance per scenario) or
/// multi-instance (typically one per production-type combination, e.g. ring
/// destruction's per-(from-type, to-type) configuration).
pub trait Module: Send {
    fn name(&self) -> &str;

    /// Bitset of event tags this module's `run` should be called for.
    fn events_listened_for(&self) -> EventTagSet;

    /// Reporting-variable handles this module publishes. Called once, in
    /// response to `BeforeAnySimulations`.
    fn outputs(&self) -> Vec<OutputHandle> {
        Vec::new()
    }

    /// Current value of one of this module's declared outputs, read by the
    /// CSV writer once per day (and again at iteration end for
    /// `PerIteration` variables). `None` for any name this module did not
    /// declare via `outputs()`.
    fn report_value(&self, _variable_name: &str) -> Option<f64> {
        None
    }

    /// Handles one event. Must not mutate `event`; derived effects are
    /// emitted via `ctx.out_queue`.
    fn run(&mut self, event: &Event, ctx: &mut ModuleContext) -> SimResult<()>;

    /// Resets internal counters/state to what a fresh instance would have.
    /// Called once per iteration, in response to `BeforeEachSimulation`.
    fn reset(&mut self);

    /// Whether this module has outstanding actions that would prevent the
    /// loop from declaring the simulation quiescent.
    fn has_pending_actions(&self) -> bool {
        false
    }

    /// Whether this module has buffered infections still to materialize
    /// (airborne spread's delay ring is the only module where this is
    /// nontrivial; every other module inherits the default `false`).
    fn has_pending_infections(&self) -> bool {
        false
    }

    /// Flushes any external resource deterministically before the registry
    /// drops the module. Rust's `Drop` handles memory; this mirrors the
    /// engine's explicit-lifecycle contract for everything else (open file
    /// handles, buffered writers).
    fn free(&mut self) {}
}

/// Holds every module for a scenario in registration order and fans events
/// out to subscribers.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: Vec<Box<dyn Module>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registration order is significant and preserved: it is the dispatch
    /// order for every event.
    pub fn register(&mut self, module: Box<dyn Module>) {
        self.modules.push(module);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Box<dyn Module>> {
        self.modules.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Module>> {
        self.modules.iter_mut()
    }

    /// Calls `run` on every module subscribed to `event.tag()`, in
    /// registration order.
    pub fn dispatch(&mut self, event: &Event, ctx: &mut ModuleContext) -> SimResult<()> {
        let tag = event.tag();
        for module in &mut self.modules {
            if module.events_listened_for().contains(tag) {
                module.run(event, ctx)?;
            }
        }
        Ok(())
    }

    pub fn reset_all(&mut self) {
        for module in &mut self.modules {
            module.reset();
        }
    }

    pub fn outputs(&self) -> Vec<OutputHandle> {
        self.modules.iter().flat_map(|m| m.outputs()).collect()
    }

    /// Current values for every declared output, keyed by `module.variable`
    /// (the CSV writer's column name), in declaration order.
    pub fn report_row(&self) -> Vec<(String, Option<f64>)> {
        self.modules
            .iter()
            .flat_map(|m| {
                m.outputs()
                    .into_iter()
                    .map(|handle| {
                        let value = m.report_value(&handle.variable_name);
                        (handle.column_name(), value)
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn has_pending_actions(&self) -> bool {
        self.modules.iter().any(|m| m.has_pending_actions())
    }

    pub fn has_pending_infections(&self) -> bool {
        self.modules.iter().any(|m| m.has_pending_infections())
    }

    pub fn free_all(&mut self) {
        for module in &mut self.modules {
            module.free();
        }
    }
}
