//! Configuration validation

use super::*;
use crate::coordinator;
use crate::logging;
use anyhow::{Context, Result};

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_integral(&config.integral)?;
    validate_output(&config.output)?;
    validate_logging(&config.logging)?;

    Ok(())
}

/// Validate the integration request
pub fn validate_integral(integral: &IntegralConfig) -> Result<()> {
    coordinator::validate(
        integral.lower,
        integral.upper,
        integral.step,
        integral.workers,
    )
    .with_context(|| format!("Invalid integration request {}", integral))?;

    let samples = (integral.upper - integral.lower) / integral.step;
    if samples / integral.workers as f64 > 1e10 {
        tracing::warn!(
            samples,
            workers = integral.workers,
            "more than 1e10 samples per participant, this will take a long time"
        );
    }

    Ok(())
}

/// Validate output configuration
pub fn validate_output(output: &OutputConfig) -> Result<()> {
    if let Some(ref path) = output.json_output {
        if path.as_os_str().is_empty() {
            anyhow::bail!("json_output path is empty");
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                anyhow::bail!(
                    "json_output directory does not exist: {}",
                    parent.display()
                );
            }
        }
    }

    Ok(())
}

/// Validate logging configuration
pub fn validate_logging(config: &LoggingConfig) -> Result<()> {
    if logging::parse_level(&config.level).is_none() {
        anyhow::bail!(
            "Unknown log level: '{}'. Valid options: error, warn, info, debug, trace",
            config.level
        );
    }

    Ok(())
}
