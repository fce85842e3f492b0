//! Output plumbing: reporting-variable declarations and the CSV writers that
//! consume them.

pub mod csv_writer;
pub mod herd_file;
pub mod reporting;

pub use csv_writer::{CsvWriter, SummaryWriter};
pub use herd_file::load_herds;
pub use reporting::{Aggregation, OutputHandle};
