//! parintegral CLI entry point

use anyhow::{Context, Result};
use parintegral::config::{cli::Cli, toml::load_config, validator::validate_config, Config};
use parintegral::output::{json, text};
use parintegral::{logging, Coordinator};

/// Name printed in reports
const INTEGRAND: &str = "cos(x)";

fn integrand(x: f64) -> f64 {
    x.cos()
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli.validate()?;

    let config = load_config(&cli)?;
    logging::init(&config.logging);

    validate_config(&config).context("Configuration validation failed")?;
    tracing::debug!(request = %config.integral, backend = %config.runtime.backend, "configuration loaded");

    if config.runtime.dry_run {
        text::print_configuration(&config);
        println!();
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    run(&config)
}

fn run(config: &Config) -> Result<()> {
    let request = &config.integral;
    let report = Coordinator::new(config.runtime.backend)
        .run(&integrand, request.lower, request.upper, request.step, request.workers)
        .with_context(|| format!("Integration of {} over {} failed", INTEGRAND, request))?;

    if config.output.json || config.output.json_output.is_some() {
        let document = json::build_json_output(&report, config, INTEGRAND);
        if let Some(ref path) = config.output.json_output {
            json::write_json_output(path, &document, true)?;
            tracing::info!(path = %path.display(), "wrote JSON result");
        }
        if config.output.json {
            json::print_json(&document)?;
            return Ok(());
        }
    }

    text::print_results(&report, config);
    Ok(())
}
