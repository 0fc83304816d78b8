extern crate thermal_twin;

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use thermal_twin::output::{FileOutput, SinkOutput};
use thermal_twin::scenarios::config::preset_scenarios;
use thermal_twin::{run_optimization, run_scenario, run_simulation, BuildingRegistry};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct TwinArgs {
    #[command(subcommand)]
    command: Command,
    /// JSON map of building id to thermal parameters, replacing the reference buildings
    #[arg(long, global = true)]
    buildings: Option<PathBuf>,
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate a building over an explicit input trajectory
    Simulate {
        input_file: PathBuf,
        /// Also write the per-step trajectory as CSV into this directory
        #[arg(long)]
        csv_dir: Option<PathBuf>,
    },
    /// Plan a setpoint schedule for the coming horizon
    Optimize {
        input_file: PathBuf,
        #[arg(long)]
        csv_dir: Option<PathBuf>,
    },
    /// Compare a what-if scenario against the baseline day
    Scenario { input_file: PathBuf },
    /// List the built-in scenarios
    Presets,
}

fn main() -> anyhow::Result<()> {
    let args = TwinArgs::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let registry = match &args.buildings {
        Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
        None => BuildingRegistry::default(),
    };

    match args.command {
        Command::Simulate { input_file, csv_dir } => {
            let input = open(&input_file)?;
            let result = match csv_dir {
                Some(dir) => run_simulation(input, FileOutput::new(dir, "{}.csv".into()), &registry)?,
                None => run_simulation(input, SinkOutput, &registry)?,
            };
            print_json(&result)
        }
        Command::Optimize { input_file, csv_dir } => {
            let input = open(&input_file)?;
            let result = match csv_dir {
                Some(dir) => run_optimization(input, FileOutput::new(dir, "{}.csv".into()), &registry)?,
                None => run_optimization(input, SinkOutput, &registry)?,
            };
            print_json(&result)
        }
        Command::Scenario { input_file } => print_json(&run_scenario(open(&input_file)?, &registry)?),
        Command::Presets => print_json(&preset_scenarios()),
    }
}

fn open(path: &Path) -> anyhow::Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path)?))
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(io::stdout().lock(), value)?;
    println!();
    Ok(())
}
