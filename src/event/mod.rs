pub mod queue;
pub mod set;
pub mod types;

pub use queue::EventQueue;
pub use set::EventTagSet;
pub use types::{ContactType, Event, EventTag, StateOverride, TestResultValue, TraceDirection};
