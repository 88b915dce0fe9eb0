//! CLI argument parsing using clap

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Worker execution primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    /// Forked processes connected by pipes (default)
    Process,
    /// Scoped threads connected by channels
    Thread,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

/// parintegral - trapezoidal integration of cos(x) across worker processes
#[derive(Parser, Debug)]
#[command(name = "parintegral")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Interval start
    #[arg(value_name = "A", allow_negative_numbers = true)]
    pub lower: Option<f64>,

    /// Interval end
    #[arg(value_name = "B", allow_negative_numbers = true)]
    pub upper: Option<f64>,

    /// Step size
    #[arg(value_name = "H", allow_negative_numbers = true)]
    pub step: Option<f64>,

    /// Number of participants (the calling process counts as one)
    #[arg(value_name = "WORKERS")]
    pub workers: Option<usize>,

    /// TOML configuration file; positional arguments and flags override it
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Worker execution primitive
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    // === Output Options ===
    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Write the JSON result to a file
    #[arg(long)]
    pub json_output: Option<PathBuf>,

    /// Print each participant's partial result
    #[arg(long)]
    pub show_partials: bool,

    // === Logging Options ===
    /// Log level: error, warn, info, debug, trace
    #[arg(long, env = "PARINTEGRAL_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormatArg>,

    /// Shorthand for --log-level debug
    #[arg(long)]
    pub debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.config.is_none() && !self.has_request() {
            anyhow::bail!("usage: parintegral A B H WORKERS (or --config FILE)");
        }

        if self.workers == Some(0) {
            anyhow::bail!("WORKERS must be at least 1");
        }

        if let Some(step) = self.step {
            if step <= 0.0 {
                anyhow::bail!("H must be positive, got {}", step);
            }
        }

        Ok(())
    }

    /// True when all four positional values were given
    pub fn has_request(&self) -> bool {
        self.lower.is_some() && self.upper.is_some() && self.step.is_some() && self.workers.is_some()
    }
}
