//! JSON output formatting

use crate::config::Config;
use crate::coordinator::{IntegrationReport, Participant};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// Duration with both microseconds and human-readable format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonDuration {
    pub micros: u64,
    pub human: String,
}

impl JsonDuration {
    pub fn from_duration(d: Duration) -> Self {
        let micros = d.as_micros() as u64;
        let human = format_duration_human(d);
        Self { micros, human }
    }
}

/// One participant's contribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonPartial {
    pub participant: Participant,
    pub lower: f64,
    pub upper: f64,
    pub value: f64,
}

/// The request as it was run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRequest {
    pub lower: f64,
    pub upper: f64,
    pub step: f64,
    pub workers: usize,
    pub backend: String,
}

/// Top-level JSON document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput {
    pub version: String,
    pub integrand: String,
    pub request: JsonRequest,
    pub result: f64,
    pub elapsed: JsonDuration,
    pub partials: Vec<JsonPartial>,
}

/// Build the JSON document for a finished run
pub fn build_json_output(report: &IntegrationReport, config: &Config, integrand: &str) -> JsonOutput {
    JsonOutput {
        version: env!("CARGO_PKG_VERSION").to_string(),
        integrand: integrand.to_string(),
        request: JsonRequest {
            lower: config.integral.lower,
            upper: config.integral.upper,
            step: config.integral.step,
            workers: report.workers,
            backend: report.backend.to_string(),
        },
        result: report.value,
        elapsed: JsonDuration::from_duration(report.elapsed),
        partials: report
            .partials
            .iter()
            .map(|p| JsonPartial {
                participant: p.participant,
                lower: p.task.lower,
                upper: p.task.upper,
                value: p.value,
            })
            .collect(),
    }
}

/// Print JSON output to stdout
pub fn print_json(output: &JsonOutput) -> Result<()> {
    let text = serde_json::to_string_pretty(output).context("Failed to serialize result")?;
    println!("{}", text);
    Ok(())
}

/// Write JSON output to file
pub fn write_json_output(output_path: &Path, output: &JsonOutput, pretty: bool) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON output: {}", output_path.display()))?;

    if pretty {
        serde_json::to_writer_pretty(file, output)?;
    } else {
        serde_json::to_writer(file, output)?;
    }

    Ok(())
}

/// Format duration in human-readable format
pub(crate) fn format_duration_human(d: Duration) -> String {
    let micros = d.as_micros() as u64;

    if micros == 0 {
        return "0µs".to_string();
    }

    if micros < 1000 {
        format!("{}µs", micros)
    } else if micros < 1_000_000 {
        format!("{:.3}ms", micros as f64 / 1000.0)
    } else if micros < 60_000_000 {
        format!("{:.3}s", micros as f64 / 1_000_000.0)
    } else if micros < 3_600_000_000 {
        format!("{:.2}m", micros as f64 / 60_000_000.0)
    } else {
        format!("{:.2}h", micros as f64 / 3_600_000_000.0)
    }
}
