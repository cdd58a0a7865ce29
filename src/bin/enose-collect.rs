//! Serial collector: appends BME688 readings to labelled CSV logs.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use enose::collector::{
    CollectError, Collector, KeyListener, LogMode, RowProgress, SessionControls, SessionInfo,
    SessionSummary, format_session_id, list_data_files, open_session, read_identity,
    stop_on_interrupt,
};
use enose::config::{self, EnoseConfig};
use enose::logging::{self, ConsoleOutput, now_local_or_utc};
use enose::sensor::{SerialSettings, available_ports, open_port};

#[derive(Debug, Parser)]
#[command(name = "enose-collect", version, about = "Collect labelled BME688 samples into CSV")]
struct Cli {
    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start a new log file.
    New(NewArgs),
    /// Append a session to an existing log.
    Continue(ContinueArgs),
    /// List logs in the data directory.
    List,
    /// List serial ports.
    Ports,
}

#[derive(Debug, Args)]
struct PortArgs {
    /// Serial port, overriding the config.
    #[arg(long)]
    port: Option<String>,
    /// Baud rate, overriding the config.
    #[arg(long)]
    baud: Option<u32>,
}

#[derive(Debug, Args)]
struct NewArgs {
    /// Class label, stored lower-cased (e.g. `plant`, `neutral_air`).
    #[arg(long)]
    class: String,
    /// Sample id; defaults to `<class>_<session>`.
    #[arg(long)]
    sample: Option<String>,
    #[arg(long, default_value = "")]
    note: String,
    /// Output file; defaults to `<class>_<sample>.csv` in the data directory.
    #[arg(long)]
    file: Option<PathBuf>,
    /// Replace the file if it already exists.
    #[arg(long)]
    overwrite: bool,
    #[command(flatten)]
    port: PortArgs,
}

#[derive(Debug, Args)]
struct ContinueArgs {
    /// Log to append to; bare names are looked up in the data directory.
    file: PathBuf,
    /// Class label, required when the log has no rows yet.
    #[arg(long)]
    class: Option<String>,
    /// Sample id, required when the log has no rows yet.
    #[arg(long)]
    sample: Option<String>,
    #[arg(long, default_value = "")]
    note: String,
    #[command(flatten)]
    port: PortArgs,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let console = match cli.command {
        Command::New(_) | Command::Continue(_) => ConsoleOutput::FileOnly,
        Command::List | Command::Ports => ConsoleOutput::Stdout,
    };
    if let Err(err) = logging::init_with(console) {
        eprintln!("Logging disabled: {err}");
    }
    let config = config::load_or_default(cli.config.as_deref()).map_err(|err| err.to_string())?;
    match cli.command {
        Command::New(args) => new_session(&config, args),
        Command::Continue(args) => continue_session(&config, args),
        Command::List => list_files(&config),
        Command::Ports => list_ports(),
    }
}

fn new_session(config: &EnoseConfig, args: NewArgs) -> Result<(), String> {
    let class = args.class.trim().to_lowercase();
    if class.is_empty() {
        return Err("Class must not be empty".to_string());
    }
    let session_id = format_session_id(now_local_or_utc()).map_err(|err| err.to_string())?;
    let sample_id = match args.sample.map(|s| s.trim().to_string()) {
        Some(sample) if !sample.is_empty() => sample,
        _ => format!("{class}_{session_id}"),
    };
    let path = args
        .file
        .unwrap_or_else(|| config.collector.data_dir.join(format!("{class}_{sample_id}.csv")));
    let mode = match (path.exists(), args.overwrite) {
        (true, false) => return Err(CollectError::Exists { path }.to_string()),
        (true, true) => LogMode::Replace,
        (false, _) => LogMode::Append,
    };
    let info = SessionInfo {
        class,
        sample_id,
        note: args.note,
        session_id,
    };
    collect(config, &args.port, &path, mode, info)
}

fn continue_session(config: &EnoseConfig, args: ContinueArgs) -> Result<(), String> {
    let path = resolve_log_path(&config.collector.data_dir, &args.file);
    if !path.is_file() {
        return Err(format!("File not found: {}", path.display()));
    }
    let identity = read_identity(&path).map_err(|err| err.to_string())?;
    let (class, sample_id) = match (identity, args.class, args.sample) {
        (Some(identity), _, _) => {
            println!("Class:  {}", identity.class);
            println!("Sample: {}", identity.sample_id);
            (identity.class, identity.sample_id)
        }
        (None, Some(class), Some(sample)) => (class.trim().to_lowercase(), sample),
        (None, _, _) => return Err(CollectError::MissingIdentity { path }.to_string()),
    };
    let session_id = format_session_id(now_local_or_utc()).map_err(|err| err.to_string())?;
    let info = SessionInfo {
        class,
        sample_id,
        note: args.note,
        session_id,
    };
    collect(config, &args.port, &path, LogMode::Append, info)
}

fn resolve_log_path(data_dir: &Path, file: &Path) -> PathBuf {
    if file.components().count() == 1 && !file.exists() {
        data_dir.join(file)
    } else {
        file.to_path_buf()
    }
}

fn collect(
    config: &EnoseConfig,
    port: &PortArgs,
    path: &Path,
    mode: LogMode,
    info: SessionInfo,
) -> Result<(), String> {
    let serial = SerialSettings {
        port: port.port.clone().unwrap_or_else(|| config.serial.port.clone()),
        baud_rate: port.baud.unwrap_or(config.serial.baud_rate),
        timeout_ms: config.serial.timeout_ms,
    };
    let (device, log) =
        open_session(path, mode, || open_port(&serial)).map_err(|err| err.to_string())?;
    println!("Connected to {} @ {} baud", serial.port, serial.baud_rate);

    println!("{}", "=".repeat(60));
    println!("File:    {}", path.display());
    println!("Class:   {}", info.class);
    println!("Sample:  {}", info.sample_id);
    println!("Session: {}", info.session_id);
    if log.rows() > 0 {
        println!("Existing readings: {}", log.rows());
    }
    println!("{}", "=".repeat(60));
    println!("SPACE pause/resume · ESC or Ctrl+C stop");

    let controls = SessionControls::new();
    let listener = KeyListener::spawn(controls.clone());
    if listener.is_none() {
        match stop_on_interrupt(&controls) {
            Ok(()) => println!("Key control unavailable; stop with Ctrl+C"),
            Err(err) => {
                tracing::warn!("{err}");
                println!("Key control unavailable; Ctrl+C ends without a summary");
            }
        }
    }
    let mut collector = Collector::new(device, log, info, controls);
    let result = collector.run(print_progress);
    drop(listener);
    let summary = result.map_err(|err| err.to_string())?;
    print_summary(&summary);
    Ok(())
}

fn print_progress(row: &RowProgress) {
    let reading = &row.reading;
    print!(
        "[{:4}] {} | T={:.1}°C | U={:.1}% | G100={:.0}\r\n",
        row.counter,
        row.timestamp,
        reading.temperature,
        reading.humidity,
        reading.reference()
    );
    let _ = std::io::stdout().flush();
}

fn print_summary(summary: &SessionSummary) {
    println!();
    println!("Collection finished: {}", summary.path.display());
    println!("  Rows this session: {}", summary.written);
    println!("  Total rows:        {}", summary.total);
    if summary.rejected > 0 || summary.undecodable > 0 {
        println!(
            "  Skipped lines:     {} malformed, {} undecodable",
            summary.rejected, summary.undecodable
        );
    }
}

fn list_files(config: &EnoseConfig) -> Result<(), String> {
    let dir = &config.collector.data_dir;
    let files = list_data_files(dir).map_err(|err| err.to_string())?;
    if files.is_empty() {
        println!("No CSV files in {}", dir.display());
        return Ok(());
    }
    println!("Data files in {}:", dir.display());
    for file in files {
        let name = file
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!(
            "  {name:<40} {:>6} readings  {:>8.1} KiB",
            file.rows,
            file.size_kib()
        );
    }
    Ok(())
}

fn list_ports() -> Result<(), String> {
    let ports = available_ports().map_err(|err| err.to_string())?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        println!("  {:<20} {}", port.name, port.description);
    }
    Ok(())
}
