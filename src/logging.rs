//! Logging setup
//!
//! Events go to stderr through `tracing-subscriber`. The filter comes from, in
//! order of precedence:
//!
//! - `PARINTEGRAL_LOG` - full filter directive
//! - `RUST_LOG` - standard Rust log filter
//! - the configured level
//!
//! Forked workers never log; only the coordinating process does.

use crate::config::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding a filter directive
pub const LOG_ENV: &str = "PARINTEGRAL_LOG";

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-field format
    #[default]
    Pretty,
    /// Single-line format
    Compact,
    /// JSON lines for log aggregation
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "full" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "Unknown log format: '{}'. Valid options: pretty, compact, json",
                s
            )),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Compact => write!(f, "compact"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Parse a log level string
pub fn parse_level(s: &str) -> Option<Level> {
    match s.to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

fn build_filter(level: Level) -> EnvFilter {
    for var in [LOG_ENV, "RUST_LOG"] {
        if let Ok(directive) = std::env::var(var) {
            if let Ok(filter) = EnvFilter::try_new(&directive) {
                return filter;
            }
        }
    }
    EnvFilter::new(level.to_string().to_lowercase())
}

/// Install the global subscriber
///
/// Calling it again is a no-op.
pub fn init(config: &LoggingConfig) {
    let level = parse_level(&config.level).unwrap_or(Level::WARN);
    let filter = build_filter(level);

    let result = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };

    // Already initialised
    let _ = result;
}
