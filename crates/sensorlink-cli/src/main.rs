use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sensorlink_core::{
    GatewayConfig, JsonLinesSink, Pipeline, RunSummary, SerialByteSource, replay_capture_file,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("SENSORLINK_BUILD_COMMIT"),
    " ",
    env!("SENSORLINK_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "sensorlink")]
#[command(version = VERSION)]
#[command(
    about = "Bridge an RF sensor gateway's serial link to home-automation readings.",
    long_about = None,
    after_help = "Examples:\n  sensorlink run --config gateway.toml\n  sensorlink replay capture.bin --config gateway.toml --stdout\n  sensorlink devices --config gateway.toml --pretty"
)]
struct Cli {
    /// Only log warnings and errors
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read the serial link and stream readings as JSON lines to stdout.
    Run {
        /// Gateway configuration (TOML)
        #[arg(long)]
        config: PathBuf,

        /// Serial device, overrides [serial].port
        #[arg(long)]
        port: Option<PathBuf>,
    },
    /// Decode a raw capture of the serial link.
    Replay {
        /// Raw byte capture of the serial link
        capture: PathBuf,

        /// Gateway configuration (TOML)
        #[arg(long)]
        config: PathBuf,

        /// Output path for JSON lines
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        output: Option<PathBuf>,

        /// Write JSON lines to stdout
        #[arg(long, conflicts_with = "output")]
        stdout: bool,

        /// Print run statistics (JSON) to stderr
        #[arg(long)]
        summary: bool,
    },
    /// Print the configured device registry as JSON.
    Devices {
        /// Gateway configuration (TOML)
        #[arg(long)]
        config: PathBuf,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Validate a configuration file.
    CheckConfig {
        /// Gateway configuration (TOML)
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let result = match cli.command {
        Commands::Run { config, port } => cmd_run(&config, port),
        Commands::Replay {
            capture,
            config,
            output,
            stdout,
            summary,
        } => cmd_replay(&capture, &config, output, stdout, summary),
        Commands::Devices { config, pretty } => cmd_devices(&config, pretty),
        Commands::CheckConfig { config } => cmd_check_config(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(io::stderr)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

fn load_config(path: &Path) -> Result<GatewayConfig, CliError> {
    GatewayConfig::load(path).map_err(|err| {
        CliError::new(
            err.to_string(),
            Some("pass a readable TOML file with --config".to_string()),
        )
    })
}

fn cmd_run(config_path: &Path, port: Option<PathBuf>) -> Result<(), CliError> {
    let mut config = load_config(config_path)?;
    if let Some(port) = port {
        config.serial.port = port.to_string_lossy().into_owned();
    }
    let registry = config.registry().context("invalid device table")?;

    let source = SerialByteSource::open(&config.serial).map_err(|err| {
        CliError::new(
            err.to_string(),
            Some("check the device path and permissions, or use --port".to_string()),
        )
    })?;
    let sink = JsonLinesSink::new(io::stdout().lock());

    let summary = Pipeline::new(source, registry, sink, config.pipeline_config())
        .run()
        .map_err(|err| {
            CliError::new(
                err.to_string(),
                Some("the gateway link dropped; restart once it is back".to_string()),
            )
        })?;
    log_summary(&summary);
    Ok(())
}

fn cmd_replay(
    capture: &Path,
    config_path: &Path,
    output: Option<PathBuf>,
    stdout: bool,
    summary: bool,
) -> Result<(), CliError> {
    validate_capture_file(capture)?;
    let config = load_config(config_path)?;
    let registry = config.registry().context("invalid device table")?;

    let result = if stdout {
        let sink = JsonLinesSink::new(io::stdout().lock());
        replay_capture_file(capture, registry, sink, config.pipeline_config())
    } else {
        let output = output.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--output or --stdout".to_string()),
            )
        })?;
        let file = create_output(capture, &output)?;
        let sink = JsonLinesSink::new(file);
        let result = replay_capture_file(capture, registry, sink, config.pipeline_config());
        if result.is_ok() {
            info!(path = %output.display(), "readings written");
        }
        result
    };

    let run = result.context("capture replay failed")?;
    if summary {
        let json = serde_json::to_string(&run.stats).context("JSON serialization failed")?;
        eprintln!("{json}");
    }
    log_summary(&run);
    Ok(())
}

fn cmd_devices(config_path: &Path, pretty: bool) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let registry = config.registry().map_err(|err| {
        CliError::new(
            err.to_string(),
            Some("device keys are hexadecimal listen codes".to_string()),
        )
    })?;
    let json = if pretty {
        serde_json::to_string_pretty(&registry)
    } else {
        serde_json::to_string(&registry)
    }
    .context("JSON serialization failed")?;
    println!("{json}");
    Ok(())
}

fn cmd_check_config(config_path: &Path) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let problems = config.validate();
    if problems.is_empty() {
        eprintln!(
            "OK: {} ({} devices)",
            config_path.display(),
            config.devices.len()
        );
        return Ok(());
    }
    for problem in &problems {
        eprintln!("  {problem}");
    }
    Err(CliError::new(
        format!("configuration has {} problem(s)", problems.len()),
        Some("fix the entries listed above".to_string()),
    ))
}

fn validate_capture_file(capture: &Path) -> Result<(), CliError> {
    if !capture.exists() {
        return Err(CliError::new(
            format!("capture file not found: {}", capture.display()),
            Some("pass a raw byte capture of the serial link".to_string()),
        ));
    }
    if !capture.is_file() {
        return Err(CliError::new(
            format!("capture is not a file: {}", capture.display()),
            Some("pass a raw byte capture of the serial link".to_string()),
        ));
    }
    Ok(())
}

/// Create the output file, refusing to overwrite the capture being read.
fn create_output(capture: &Path, output: &Path) -> Result<File, CliError> {
    let capture_abs = fs::canonicalize(capture)
        .with_context(|| format!("Failed to resolve capture path: {}", capture.display()))?;
    if let Ok(output_abs) = fs::canonicalize(output) {
        if output_abs == capture_abs {
            return Err(CliError::new(
                format!("output path must differ from capture: {}", output.display()),
                Some("choose a different output path".to_string()),
            ));
        }
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    let file = File::create(output)
        .with_context(|| format!("Failed to create output file: {}", output.display()))?;
    Ok(file)
}

fn log_summary(summary: &RunSummary) {
    let stats = &summary.stats;
    info!(
        frames = stats.frames,
        decoded = stats.decoded,
        published = stats.readings_published,
        checksum_mismatch = stats.checksum_mismatch,
        magic_mismatch = stats.magic_mismatch,
        unknown_device = stats.unknown_device,
        desync_discards = stats.desync_discards,
        started_at = %summary.started_at,
        finished_at = %summary.finished_at,
        "run summary"
    );
}
