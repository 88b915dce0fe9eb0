//! TOML configuration file parsing

use super::*;
use crate::config::cli::Cli;
use crate::config::cli_convert::{apply_logging_overrides, convert_backend};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Result<Config> {
    if let Some(lower) = cli.lower {
        config.integral.lower = lower;
    }
    if let Some(upper) = cli.upper {
        config.integral.upper = upper;
    }
    if let Some(step) = cli.step {
        config.integral.step = step;
    }
    if let Some(workers) = cli.workers {
        config.integral.workers = workers;
    }

    if let Some(backend) = cli.backend {
        config.runtime.backend = convert_backend(backend);
    }
    if cli.dry_run {
        config.runtime.dry_run = true;
    }

    if cli.json {
        config.output.json = true;
    }
    if let Some(ref path) = cli.json_output {
        config.output.json_output = Some(path.clone());
    }
    if cli.show_partials {
        config.output.show_partials = true;
    }

    apply_logging_overrides(cli, &mut config.logging);

    Ok(config)
}

/// Load the file named by `--config` (if any) and apply CLI overrides
pub fn load_config(cli: &Cli) -> Result<Config> {
    match cli.config {
        Some(ref path) => merge_cli_with_config(cli, parse_toml_file(path)?),
        None => cli_convert::build_config_from_cli(cli),
    }
}
