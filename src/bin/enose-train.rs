//! Trains the gas classifiers and exports them as C source.

use std::path::PathBuf;

use clap::Parser;
use enose::collector::format_timestamp;
use enose::config;
use enose::logging::{self, now_local_or_utc};
use enose::trainer::{self, ExportTarget, ModelChoice, TrainRequest};

#[derive(Debug, Parser)]
#[command(name = "enose-train", version, about = "Train BME688 gas classifiers and export C code")]
struct Cli {
    /// Config file to use instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Model to export: dt, rf, svm or auto (best cross-validation accuracy).
    #[arg(long, default_value = "auto")]
    model: ModelChoice,
    /// Where the generated code goes: console, file or all.
    #[arg(long, default_value = "console")]
    export: ExportTarget,
    /// Print per-model classification reports on a stratified hold-out split.
    #[arg(long)]
    report: bool,
    /// Also write the exported models as JSON.
    #[arg(long)]
    model_json: Option<PathBuf>,
    /// Output directory for generated files, overriding the config.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    let mut config =
        config::load_or_default(cli.config.as_deref()).map_err(|err| err.to_string())?;
    if let Some(dir) = cli.output_dir {
        config.trainer.output_dir = dir;
    }
    let generated_at = format_timestamp(now_local_or_utc()).map_err(|err| err.to_string())?;
    let request = TrainRequest {
        model: cli.model,
        export: cli.export,
        report: cli.report,
        model_json: cli.model_json,
        generated_at,
    };

    println!("{}", "=".repeat(60));
    println!("BME688 GAS CLASSIFIER TRAINING");
    println!("{}", "=".repeat(60));
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let outcome =
        trainer::run(&config.trainer, &request, &mut out).map_err(|err| err.to_string())?;
    println!(
        "\nDone: {} selected, {} file(s) written",
        outcome.chosen.display_name(),
        outcome.written.len()
    );
    Ok(())
}
