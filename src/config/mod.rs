//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.
//! CLI values take precedence over values from a configuration file.
//!
//! # Example file
//!
//! ```toml
//! [integral]
//! lower = 0.0
//! upper = 1.5707963267948966
//! step = 0.0001
//! workers = 4
//!
//! [runtime]
//! backend = "process"
//!
//! [output]
//! json = true
//!
//! [logging]
//! level = "debug"
//! format = "compact"
//! ```

pub mod cli;
pub mod cli_convert;
pub mod toml;
pub mod validator;

use crate::logging::LogFormat;
use crate::worker::Backend;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub integral: IntegralConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The integration request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegralConfig {
    /// Interval start
    pub lower: f64,
    /// Interval end
    pub upper: f64,
    /// Trapezoid width
    pub step: f64,
    /// Participants, coordinator included
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    1
}

/// Execution settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Worker execution primitive
    #[serde(default)]
    pub backend: Backend,
    /// Validate and print the configuration without integrating
    #[serde(default)]
    pub dry_run: bool,
}

/// Result output settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Print a JSON document on stdout instead of text
    #[serde(default)]
    pub json: bool,
    /// Also write the JSON document to this file
    pub json_output: Option<PathBuf>,
    /// Print every partial result
    #[serde(default)]
    pub show_partials: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// error, warn, info, debug or trace
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Configuration for a plain `a b h workers` request with every other setting defaulted
    pub fn new(lower: f64, upper: f64, step: f64, workers: usize) -> Self {
        Self {
            integral: IntegralConfig {
                lower,
                upper,
                step,
                workers,
            },
            runtime: RuntimeConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl fmt::Display for IntegralConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}] step {} with {} worker(s)",
            self.lower, self.upper, self.step, self.workers
        )
    }
}
