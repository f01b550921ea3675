//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Timer Route - timer-triggered enrichment routes with fan-out to sinks
#[derive(Parser, Debug)]
#[command(
    name = "timer-route",
    author,
    version,
    about = "Timer-triggered enrichment routes",
    long_about = "Runs timer-triggered routes: every tick sets a constant body, attaches a\n\
                  random RandomValue header in [1,100] and delivers the event to each\n\
                  configured sink in declaration order."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TIMER_ROUTE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TIMER_ROUTE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run routes until shutdown signal, timeout, or max ticks
    Run(RunArgs),

    /// Validate route configuration without running
    Validate(ValidateArgs),

    /// Display configured components and routes
    Info(InfoArgs),
}

/// Arguments for the `run` command
///
/// Without `--config`, a single route is built from the ad-hoc flags.
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Route files or directories (TOML or JSON); comma separated or repeated
    #[arg(short, long, value_delimiter = ',', env = "TIMER_ROUTE_CONFIG")]
    pub config: Vec<PathBuf>,

    /// Timer and logger name of the ad-hoc route
    #[arg(long, default_value = "js")]
    pub name: String,

    /// Tick period of the ad-hoc route (e.g. 1s, 250ms)
    #[arg(long, default_value = "1s", value_parser = parse_period)]
    pub period: Duration,

    /// Constant body of the ad-hoc route
    #[arg(long, default_value = "js")]
    pub body: String,

    /// Formatter label of the primary sink
    #[arg(long, default_value = "log")]
    pub primary_label: String,

    /// Formatter label of the secondary sink
    #[arg(long, default_value = "aaa")]
    pub secondary_label: String,

    /// How the secondary sink component is created
    #[arg(long, value_enum, default_value = "alias")]
    pub secondary_mode: SecondaryMode,

    /// Random seed for every route (reproducible RandomValue sequence)
    #[arg(long, env = "TIMER_ROUTE_SEED")]
    pub seed: Option<u64>,

    /// Stop each route after this many ticks (0 = unlimited)
    #[arg(long, default_value = "0", env = "TIMER_ROUTE_MAX_TICKS")]
    pub max_ticks: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "TIMER_ROUTE_TIMEOUT")]
    pub timeout: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "TIMER_ROUTE_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and exit without running routes
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Route files or directories to validate
    #[arg(short, long, value_delimiter = ',', default_value = "routes.toml")]
    pub config: Vec<PathBuf>,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Route files or directories
    #[arg(short, long, value_delimiter = ',', default_value = "routes.toml")]
    pub config: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
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

/// Registration of the secondary sink component
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SecondaryMode {
    /// New component of the same kind
    Make,
    /// Copy of the primary component
    #[default]
    Alias,
}

fn parse_period(value: &str) -> Result<Duration, String> {
    contracts::parse_duration(value).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults() {
        let cli = Cli::parse_from(["timer-route", "run"]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert!(args.config.is_empty());
        assert_eq!(args.period, Duration::from_secs(1));
        assert_eq!(args.primary_label, "log");
        assert_eq!(args.secondary_label, "aaa");
        assert_eq!(args.secondary_mode, SecondaryMode::Alias);
    }

    #[test]
    fn test_run_ad_hoc_flags() {
        let cli = Cli::parse_from([
            "timer-route",
            "-v",
            "run",
            "--period",
            "250ms",
            "--secondary-mode",
            "make",
            "--max-ticks",
            "3",
        ]);
        assert_eq!(cli.verbose, 1);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.period, Duration::from_millis(250));
        assert_eq!(args.secondary_mode, SecondaryMode::Make);
        assert_eq!(args.max_ticks, 3);
    }

    #[test]
    fn test_invalid_period_rejected() {
        assert!(Cli::try_parse_from(["timer-route", "run", "--period", "1d"]).is_err());
    }

    #[test]
    fn test_multiple_config_locations() {
        let cli = Cli::parse_from(["timer-route", "validate", "-c", "a.toml,routes.d"]);
        let Commands::Validate(args) = cli.command else {
            panic!("expected validate command");
        };
        assert_eq!(args.config, [PathBuf::from("a.toml"), PathBuf::from("routes.d")]);
    }
}
