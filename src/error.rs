//! Error taxonomy for the simulation engine.
//!
//! Mirrors the propagation policy in the specification: scenario errors and
//! invariant violations are fatal; parameter-value anomalies are recoverable
//! (the caller logs a warning, clamps/defaults, and continues).

use thiserror::Error;

pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    /// Scenario is malformed in a way that cannot be reconciled: a herd file
    /// referenced a herd that does not exist, a chart has no entries, etc.
    /// Fatal — reported before simulation begins.
    #[error("scenario error: {0}")]
    Scenario(String),

    /// A module-internal invariant was violated (e.g. a herd was enqueued
    /// for destruction twice, or a delay-ring slot held an event for the
    /// wrong day). Indicates a programmer error; always fatal.
    #[error("invariant violation in module `{module}`: {detail}")]
    Invariant { module: String, detail: String },

    /// The dispatcher routed an event to a module that does not handle it.
    #[error("module `{module}` does not handle event `{event}`")]
    UnhandledEvent { module: String, event: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse scenario configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("CSV writer error: {0}")]
    Csv(#[from] csv::Error),
}

/// A recoverable parameter-value anomaly: reported via `tracing::warn!` by
/// the caller and resolved to `default`, never surfaced as an `Err`.
///
/// Kept as a plain struct (not part of [`SimError`]) because, per the
/// specification, these never abort a run — collecting them lets the CLI
/// print every warning up front instead of one-at-a-time.
#[derive(Debug, Clone)]
pub struct ParameterWarning {
    pub field: String,
    pub detail: String,
}

impl ParameterWarning {
    pub fn new(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            detail: detail.into(),
        }
    }

    pub fn emit(&self) {
        tracing::warn!(field = %self.field, "{}", self.detail);
    }
}
