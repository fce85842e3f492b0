//! Trace zone focus: a matching trace also drops a zone focus point on the
//! exposed herd.

use crate::{
    error::SimResult,
    event::{ContactType, Event, EventTagSet, TraceDirection, types::EventTag},
    module::{Module, ModuleContext},
    reason::ReasonId,
};

pub struct TraceZoneFocusConfig {
    pub contact_type: ContactType,
    pub direction: TraceDirection,
    pub reason: String,
}

pub struct TraceZoneFocus {
    config: TraceZoneFocusConfig,
    reason_id: Option<ReasonId>,
}

impl TraceZoneFocus {
    pub fn new(config: TraceZoneFocusConfig) -> Self {
        Self {
            config,
            reason_id: None,
        }
    }
}

impl Module for TraceZoneFocus {
    fn name(&self) -> &str {
        "trace-zone-focus"
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
                ctx.out_queue.enqueue(Event::RequestForZoneFocus {
                    herd: *target,
                    day: *day,
                    reason: self.reason_id.expect("reason declared before first iteration"),
                });
            }
            _ => {}
        }
        Ok(())
    }

    fn reset(&mut self) {}
}
