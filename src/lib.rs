//! Discrete-event Monte Carlo simulator of contagious livestock disease
//! outbreaks and the authorities' control measures (destruction,
//! vaccination, zones, tracing) modeled on the NAADSM engine.
//!
//! The crate is organized the way the simulation itself is: a shared event
//! queue (`event`), a registry of independent modules that subscribe to
//! event tags (`module`, `modules`, `scheduler`, `airborne`), the data model
//! those modules operate on (`herd`, `zone`, `production_type`, `reason`),
//! narrow ports for the engine's external collaborators (`ports`), and the
//! per-iteration driver that ties it together (`sim`).

#[macro_use]
mod macros;

pub mod airborne;
pub mod cli;
pub mod config;
pub mod error;
pub mod event;
pub mod herd;
pub mod io;
pub mod module;
pub mod modules;
pub mod ports;
pub mod production_type;
pub mod reason;
pub mod scheduler;
pub mod sim;
pub mod zone;

pub use error::{SimError, SimResult};
pub use sim::{DayReport, Simulation, SimulationConfig};
