use std::error::Error;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use env_logger::Builder;
use log::{error, info, warn};

use carbon_gate::config::GateFile;
use carbon_gate::estimate::Estimator;
use carbon_gate::gate::LegacyStatus;

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Estimates the emissions of a job and checks them against the carbon budget.
/// Exits with code 1 if the job is blocked.
struct Args {
    /// Path to YAML file with the job and engine settings under the `carbon-gate` key
    #[arg(short, long)]
    config: PathBuf,

    /// Path to JSON array of hourly carbon intensity samples, replaces the history from the config
    #[arg(long)]
    history: Option<PathBuf>,

    /// Path to produced JSON file with the estimate (default - print to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let args = Args::parse();

    let (mut job, config) = GateFile::from_yaml(&args.config)?.into_parts()?;
    if let Some(path) = &args.history {
        job.intensity_history = serde_json::from_reader(File::open(path)?)?;
    }

    let estimate = Estimator::new(config).estimate(&job)?;

    let json = serde_json::to_string_pretty(&estimate)?;
    match &args.output {
        Some(path) => File::create(path)?.write_all(json.as_bytes())?,
        None => writeln!(std::io::stdout(), "{}", json)?,
    }

    match estimate.legacy_status() {
        LegacyStatus::Pass => info!("{}", estimate.gate.message),
        LegacyStatus::Warn => warn!("{}", estimate.gate.message),
        LegacyStatus::Block => {
            error!("{}", estimate.gate.message);
            std::process::exit(1);
        }
    }
    Ok(())
}
