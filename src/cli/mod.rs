//! CLI argument parsing.

use std::path::PathBuf;

use clap::Parser;

/// `naadsm-core`: runs a scenario's iterations and writes the per-day output
/// table.
#[derive(Parser, Debug)]
#[command(name = "naadsm-core")]
#[command(about = "Discrete-event Monte Carlo simulator of livestock disease outbreaks")]
pub struct Args {
    /// Scenario description (JSON).
    pub parameter_file: PathBuf,

    /// Initial unit population (CSV).
    #[arg(short = 'h', long = "herd-file", value_name = "PATH")]
    pub herd_file: PathBuf,

    /// Main output table (CSV). Defaults to stdout.
    #[arg(short = 'o', long = "output-file", value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// Overrides the scenario file's RNG seed.
    #[arg(short = 's', long = "rng-seed", value_name = "SEED")]
    pub rng_seed: Option<u64>,

    /// Overrides the RNG with a constant draw in [0, 1).
    #[arg(short = 'r', long = "fixed-random-value", value_name = "VALUE")]
    pub fixed_random_value: Option<f64>,

    /// Log verbosity: 0 = warnings only, 1 = debug.
    #[arg(short = 'V', long = "verbosity", value_name = "0|1", default_value_t = 0)]
    pub verbosity: u8,
}
