//! Terminal output for the kiln CLI, colored with [`console`].

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use kiln_core::verifier::{StageOutcome, VerificationReport};

/// Print a bold cyan header with an underline separator.
pub fn print_header(text: &str) {
    println!("\n{}", style(text).bold().cyan());
    println!("{}", style("=".repeat(text.len())).dim());
}

pub fn print_success(text: &str) {
    println!("{} {}", style("[OK]").green().bold(), text);
}

pub fn print_warning(text: &str) {
    println!("{} {}", style("[WARN]").yellow().bold(), text);
}

pub fn print_error(text: &str) {
    println!("{} {}", style("[ERROR]").red().bold(), text);
}

/// Print a progress step indicator like `[1/3] Rendering templates...`.
pub fn print_step(step: u32, total: u32, text: &str) {
    println!("{} {}", style(format!("[{step}/{total}]")).dim(), text);
}

/// Print a key-value pair with dimmed key formatting.
pub fn print_key_value(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// A spinner for long-running tool invocations. Hidden when stdout is not a terminal.
pub fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// One line per stage, then every finding.
pub fn print_report(report: &VerificationReport) {
    for result in &report.stages {
        let label = format!("{:<8}", result.stage.as_str());
        match &result.outcome {
            StageOutcome::Passed => println!("  {} {}", style(label).dim(), style("passed").green()),
            StageOutcome::Skipped => println!("  {} {}", style(label).dim(), style("skipped").dim()),
            StageOutcome::Failed(failure) => {
                println!("  {} {}", style(label).dim(), style("failed").red().bold());
                for line in failure.to_string().lines() {
                    println!("      {line}");
                }
            }
        }
    }
    if !report.findings.is_empty() {
        println!("  {}", style("findings:").dim());
        for finding in &report.findings {
            println!("    {finding}");
        }
    }
}
