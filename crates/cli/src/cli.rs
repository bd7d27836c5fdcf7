//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CARLA Capture - synchronized multi-camera image capture for CARLA simulator
#[derive(Parser, Debug)]
#[command(
    name = "carla-capture",
    author,
    version,
    about = "CARLA multi-camera synchronized capture",
    long_about = "Spawns a fleet of vehicles in CARLA, mounts one RGB camera on each, \n\
                  steps the world in synchronous mode and saves every camera frame \n\
                  together with the camera pose."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CARLA_CAPTURE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "CARLA_CAPTURE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a capture session
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone, Default)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); built-in defaults when omitted
    #[arg(short, long, env = "CARLA_CAPTURE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override CARLA server host from configuration
    #[arg(long, env = "CARLA_HOST")]
    pub host: Option<String>,

    /// Override CARLA server port from configuration
    #[arg(long, env = "CARLA_PORT")]
    pub port: Option<u16>,

    /// Override number of vehicles (one camera each)
    #[arg(short = 'n', long, env = "CARLA_CAPTURE_VEHICLES")]
    pub vehicles: Option<usize>,

    /// Override vehicle forward speed (m/s)
    #[arg(long, env = "CARLA_CAPTURE_SPEED")]
    pub speed: Option<f64>,

    /// Override output root directory
    #[arg(short, long, env = "CARLA_CAPTURE_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Stop after this many world ticks (0 = until interrupted)
    #[arg(long, env = "CARLA_CAPTURE_MAX_TICKS")]
    pub max_ticks: Option<u64>,

    /// Validate configuration and exit without connecting
    #[arg(long)]
    pub dry_run: bool,

    /// Capture from the built-in mock simulator instead of a CARLA server
    #[arg(long)]
    pub mock: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "CARLA_CAPTURE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file; built-in defaults when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show camera attributes and exposure
    #[arg(long)]
    pub camera: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_overrides() {
        let cli = Cli::try_parse_from([
            "carla-capture",
            "run",
            "-n",
            "3",
            "--host",
            "10.0.0.5",
            "--max-ticks",
            "20",
            "--dry-run",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.vehicles, Some(3));
        assert_eq!(args.host.as_deref(), Some("10.0.0.5"));
        assert_eq!(args.max_ticks, Some(20));
        assert!(args.dry_run);
        assert!(!args.mock);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_mock_is_opt_in() {
        let cli = Cli::try_parse_from(["carla-capture", "run", "--mock"]).unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert!(args.mock);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["carla-capture", "-q", "-v", "validate"]);
        assert!(result.is_err());
    }
}
