//! Output-variable declarations (`DeclarationOfOutputs`).
//!
//! Modules declare the reporting variables they can produce once, at
//! startup, rather than the engine hardcoding a fixed report schema. The CSV
//! writer (`crate::io::csv_writer`) consumes these handles to build its
//! header row.

use serde::{Deserialize, Serialize};

/// How a reporting variable should be aggregated across a run's iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregation {
    /// Reported once per day, per iteration (e.g. "number infected today").
    Daily,
    /// Reported once per iteration, at its end (e.g. "total destroyed").
    PerIteration,
}

/// A single named output a module can emit. `OutputHandle` values flow
/// through `DeclarationOfOutputs` so the CSV writer can build its schema
/// before the first `NewDay`. `variable_name` is owned rather than
/// `&'static str` so a module can build one handle per production type at
/// runtime (e.g. `units-awaiting.cattle`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputHandle {
    pub module_name: &'static str,
    pub variable_name: String,
    pub aggregation: Aggregation,
}

impl OutputHandle {
    pub fn new(
        module_name: &'static str,
        variable_name: impl Into<String>,
        aggregation: Aggregation,
    ) -> Self {
        Self {
            module_name,
            variable_name: variable_name.into(),
            aggregation,
        }
    }

    /// The CSV column header for this variable, `module.variable`.
    pub fn column_name(&self) -> String {
        format!("{}.{}", self.module_name, self.variable_name)
    }
}
