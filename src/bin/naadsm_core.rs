//! `naadsm-core`: loads a scenario and its initial herd population, runs the
//! configured number of iterations, and writes the per-day output table.

use std::{
    fs::File,
    io::{BufWriter, Write},
    process::ExitCode,
};

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use naadsm_core::{
    airborne::AirborneSpread,
    cli::Args,
    config::ScenarioFile,
    error::SimResult,
    io::{herd_file, CsvWriter, SummaryWriter},
    module::ModuleRegistry,
    modules::{ClinicalDetection, DiseaseModel, ListMonitor, MonitorKind, RingDestruction, TraceExam, TraceZoneFocus},
    ports::{distribution::EmpiricalSizeDistribution, rng::DefaultRng},
    scheduler::ResourceScheduler,
    sim::{Simulation, SimulationConfig},
    zone::ZoneList,
};
use tracing_subscriber::EnvFilter;

fn progress_bar(iterations: u64) -> ProgressBar {
    let bar = ProgressBar::new(iterations);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta_precise}) {msg}")
    {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar
}

fn init_logging(verbosity: u8) {
    let filter = if verbosity >= 1 {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(args: Args) -> SimResult<()> {
    let scenario_text = std::fs::read_to_string(&args.parameter_file)?;
    let mut scenario_file: ScenarioFile = serde_json::from_str(&scenario_text)?;
    if let Some(seed) = args.rng_seed {
        scenario_file.rng_seed = seed;
    }
    let scenario = scenario_file.build()?;

    let herd_reader = File::open(&args.herd_file)?;
    let herds = herd_file::load_herds(herd_reader, &scenario.production_types)?;
    let size_distribution = EmpiricalSizeDistribution::from_sizes(herds.iter().map(|h| h.size.0).collect());
    let zones = ZoneList::new(scenario.zones);

    let mut registry = ModuleRegistry::new();
    registry.register(Box::new(ResourceScheduler::new(scenario.scheduler)));
    registry.register(Box::new(AirborneSpread::new(scenario.airborne, Box::new(size_distribution))));
    for config in scenario.ring_destruction {
        registry.register(Box::new(RingDestruction::new(config)));
    }
    for config in scenario.trace_exam {
        registry.register(Box::new(TraceExam::new(config)));
    }
    for config in scenario.trace_zone_focus {
        registry.register(Box::new(TraceZoneFocus::new(config)));
    }
    registry.register(Box::new(ListMonitor::new(MonitorKind::Destruction, scenario.production_types.clone())));
    registry.register(Box::new(ListMonitor::new(MonitorKind::Vaccination, scenario.production_types.clone())));
    registry.register(Box::new(ClinicalDetection::new(scenario.clinical_detection)));
    registry.register(Box::new(DiseaseModel::new(scenario.disease_model)));

    let mut simulation = Simulation::new(
        herds,
        zones,
        registry,
        SimulationConfig {
            max_days: scenario.max_days,
            exit_conditions: scenario.exit_conditions,
        },
    );

    let outputs = simulation.declared_outputs();
    let output_sink: Box<dyn Write> = match &args.output_file {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout()),
    };
    let mut csv_writer = CsvWriter::new(output_sink, outputs.clone())?;
    let mut summary_writer = args
        .output_file
        .as_ref()
        .map(|path| {
            let summary_path = path.with_extension("summary.csv");
            File::create(summary_path).map(|f| SummaryWriter::new(BufWriter::new(f), outputs))
        })
        .transpose()?
        .transpose()?;

    let bar = progress_bar(scenario.num_iterations);
    for iteration in 0..scenario.num_iterations {
        let mut rng = match args.fixed_random_value {
            Some(value) => DefaultRng::fixed(value),
            None => DefaultRng::sub_stream(scenario.rng_seed, iteration),
        };
        let reports = simulation.run_iteration(&mut rng)?;
        csv_writer.write_iteration(iteration, &reports)?;
        if let Some(summary_writer) = summary_writer.as_mut() {
            summary_writer.write_iteration(iteration, &reports)?;
        }
        bar.inc(1);
    }
    bar.finish();
    csv_writer.flush()?;
    if let Some(summary_writer) = summary_writer.as_mut() {
        summary_writer.flush()?;
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbosity);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("naadsm-core: {err}");
            ExitCode::FAILURE
        }
    }
}
