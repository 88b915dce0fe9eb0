//! Human-readable text output

use crate::config::Config;
use crate::coordinator::{IntegrationReport, Participant};
use crate::output::json::format_duration_human;
use std::fmt::Write;

/// The bare result line, six decimals
pub fn format_value(value: f64) -> String {
    format!("{:.6}", value)
}

/// Render the run summary
///
/// Without `show_partials` this is only the result line.
pub fn render_results(report: &IntegrationReport, config: &Config) -> String {
    if !config.output.show_partials {
        return format_value(report.value);
    }

    let mut out = String::new();
    let _ = writeln!(out, "═══════════════════════════════════════════════════════════");
    let _ = writeln!(out, "                    INTEGRATION RESULT");
    let _ = writeln!(out, "═══════════════════════════════════════════════════════════");
    let _ = writeln!(out, "Interval:  [{}, {}]", config.integral.lower, config.integral.upper);
    let _ = writeln!(out, "Step:      {}", config.integral.step);
    let _ = writeln!(out, "Workers:   {} ({})", report.workers, report.backend);
    let _ = writeln!(out, "Elapsed:   {}", format_duration_human(report.elapsed));
    let _ = writeln!(out);
    let _ = writeln!(out, "Partial results:");
    for partial in &report.partials {
        let who = match partial.participant {
            Participant::Coordinator => "coordinator".to_string(),
            Participant::Worker(index) => format!("worker {}", index),
        };
        let _ = writeln!(
            out,
            "  {:<12} [{:.6}, {:.6}]  {}",
            who,
            partial.task.lower,
            partial.task.upper,
            format_value(partial.value)
        );
    }
    let _ = writeln!(out);
    let _ = write!(out, "Result:    {}", format_value(report.value));
    out
}

/// Print results to console
pub fn print_results(report: &IntegrationReport, config: &Config) {
    println!("{}", render_results(report, config));
}

/// Print the validated configuration (dry run)
pub fn print_configuration(config: &Config) {
    println!("Integration: {}", config.integral);
    println!("Backend:     {}", config.runtime.backend);
    println!("Output:      {}", if config.output.json { "json" } else { "text" });
    if let Some(ref path) = config.output.json_output {
        println!("JSON file:   {}", path.display());
    }
}
