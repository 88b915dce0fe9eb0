//! CLI to Config conversion utilities

use crate::config::cli::{BackendArg, Cli, LogFormatArg};
use crate::config::{Config, IntegralConfig, LoggingConfig, OutputConfig, RuntimeConfig};
use crate::logging::LogFormat;
use crate::worker::Backend;
use anyhow::Result;

/// Convert CLI backend to config backend
pub fn convert_backend(backend: BackendArg) -> Backend {
    match backend {
        BackendArg::Process => Backend::Process,
        BackendArg::Thread => Backend::Thread,
    }
}

/// Convert CLI log format to logging format
pub fn convert_log_format(format: LogFormatArg) -> LogFormat {
    match format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    }
}

/// Build a configuration from CLI arguments alone
pub fn build_config_from_cli(cli: &Cli) -> Result<Config> {
    let (lower, upper, step, workers) = match (cli.lower, cli.upper, cli.step, cli.workers) {
        (Some(a), Some(b), Some(h), Some(n)) => (a, b, h, n),
        _ => anyhow::bail!("A, B, H and WORKERS are required without --config"),
    };

    let mut logging = LoggingConfig::default();
    apply_logging_overrides(cli, &mut logging);

    Ok(Config {
        integral: IntegralConfig {
            lower,
            upper,
            step,
            workers,
        },
        runtime: RuntimeConfig {
            backend: cli.backend.map(convert_backend).unwrap_or_default(),
            dry_run: cli.dry_run,
        },
        output: OutputConfig {
            json: cli.json,
            json_output: cli.json_output.clone(),
            show_partials: cli.show_partials,
        },
        logging,
    })
}

/// Apply --log-level, --debug and --log-format
pub(crate) fn apply_logging_overrides(cli: &Cli, logging: &mut LoggingConfig) {
    if let Some(ref level) = cli.log_level {
        logging.level = level.clone();
    }
    if cli.debug {
        logging.level = "debug".to_string();
    }
    if let Some(format) = cli.log_format {
        logging.format = convert_log_format(format);
    }
}
