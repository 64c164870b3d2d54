//! Event rendering, progress spinner, and summary formatting.
//!
//! This module is the presentation side of a run: it consumes the event stream
//! on the main thread and never touches git.

use crate::config::Config;
use crate::constants::{PROGRESS_TICK_MS, TIMESTAMP_FORMAT};
use crate::events::{Severity, UpdateEvent};
use crate::orchestrator::RunSummary;
use crate::repo::{RepoOutcome, RepoReport};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::time::Duration;

/// Formats an event as `[timestamp] message`, coloured by severity.
pub fn format_event(event: &UpdateEvent) -> String {
    let timestamp = format!("[{}]", event.timestamp.format(TIMESTAMP_FORMAT));
    let message = match event.severity {
        Severity::Info => event.message.normal(),
        Severity::Success => event.message.green(),
        Severity::Error => event.message.red(),
    };
    format!("{} {}", timestamp.dimmed(), message)
}

/// Prints events as they arrive, in arrival order.
///
/// In normal verbosity on a terminal a spinner shows the latest message and
/// every line is printed above it. Without a terminal there is no spinner and
/// lines go straight to the output. Quiet mode only prints errors; verbose mode
/// skips the spinner so git command echoes are not garbled.
pub struct EventRenderer<W = io::Stdout> {
    spinner: Option<ProgressBar>,
    config: Config,
    out: W,
}

impl EventRenderer {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_output(config, io::stdout(), io::stderr().is_terminal())
    }
}

impl<W: Write> EventRenderer<W> {
    /// Renders to `out`. The spinner is only drawn when `interactive`.
    pub fn with_output(config: &Config, out: W, interactive: bool) -> Self {
        let spinner = (interactive && !config.is_quiet() && !config.is_verbose()).then(|| {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                    .template("{spinner:.cyan} {msg}")
                    .expect("static spinner template"),
            );
            spinner.enable_steady_tick(Duration::from_millis(PROGRESS_TICK_MS));
            spinner
        });
        Self::with_spinner(config, out, spinner)
    }

    fn with_spinner(config: &Config, out: W, spinner: Option<ProgressBar>) -> Self {
        Self {
            spinner,
            config: *config,
            out,
        }
    }

    pub fn render(&mut self, event: &UpdateEvent) -> io::Result<()> {
        if self.config.is_quiet() {
            if event.severity == Severity::Error {
                eprintln!("error: {}", event.message);
            }
            return Ok(());
        }

        let line = format_event(event);
        let out = &mut self.out;
        match &self.spinner {
            // `ProgressBar::println` drops the line when the bar is hidden.
            Some(spinner) => {
                spinner.suspend(|| writeln!(out, "{line}"))?;
                spinner.set_message(event.message.clone());
                Ok(())
            }
            None => writeln!(out, "{line}"),
        }
    }

    /// Clears the spinner and hands back the output.
    pub fn finish(self) -> W {
        if let Some(spinner) = &self.spinner {
            spinner.finish_and_clear();
        }
        self.out
    }
}

pub fn print_working_dir(path: &Path, config: &Config) {
    if config.is_quiet() {
        return;
    }
    println!(
        "{} {}",
        "Selected directory:".cyan(),
        path.display().to_string().white().bold()
    )
}

/// Reported outside the event stream: without a worker there is no stream.
pub fn print_start_failure(error: &std::io::Error) {
    eprintln!(
        "{} could not start the update worker: {}",
        "Error:".red().bold(),
        error
    );
}

pub fn print_summary(summary: &RunSummary, config: &Config) {
    if summary.discovery_error.is_some() {
        return;
    }
    if config.is_quiet() {
        print_quiet_summary(summary);
    } else {
        print_normal_summary(summary);
    }
}

fn print_quiet_summary(summary: &RunSummary) {
    println!(
        "{}/{} repositories updated",
        summary.succeeded(),
        summary.reports.len()
    );
}

fn print_normal_summary(summary: &RunSummary) {
    if summary.reports.is_empty() {
        return;
    }
    print_section("Summary");
    let (successes, failures): (Vec<_>, Vec<_>) =
        summary.reports.iter().partition(|r| r.is_success());

    print_successes(&successes);
    print_failures(&failures);

    println!(
        "{}: {}/{} repos in {}",
        "Total".white().bold(),
        successes.len(),
        summary.reports.len(),
        format_duration(summary.duration)
    );
}

fn format_duration(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f32())
}

fn print_section(title: &str) {
    let line = "=".repeat(50).cyan().dimmed();
    let padding = (50 - title.len()) / 2;
    let centered = format!("{:>width$}", title, width = padding + title.len());
    println!("\n{}\n{}\n{}\n", line, centered.cyan().bold(), line);
}

fn print_successes(successes: &[&RepoReport]) {
    if successes.is_empty() {
        return;
    }
    println!(
        "{}",
        format!("Succeeded ({}):", successes.len()).green().bold()
    );

    for report in successes {
        println!(
            "  {} {} in {}",
            "OK".green().bold(),
            report.path.display().to_string().white(),
            format_duration(report.duration).dimmed(),
        );
    }
    println!();
}

fn print_failures(failures: &[&RepoReport]) {
    if failures.is_empty() {
        return;
    }

    println!("{}", format!("Failed ({}):", failures.len()).red().bold());

    for report in failures {
        println!(
            "  {} {} {} in {}",
            "FAIL".red().bold(),
            report.path.display().to_string().white(),
            describe_failure(report).red(),
            format_duration(report.duration).dimmed(),
        );
    }
    println!();
}

fn describe_failure(report: &RepoReport) -> String {
    match &report.outcome {
        RepoOutcome::Skipped(err) => format!("skipped: {err}"),
        RepoOutcome::Processed { restore, .. } => {
            let mut parts = Vec::new();
            let failed = report.failed_branches();
            if failed > 0 {
                parts.push(format!("{failed} branch(es) not updated"));
            }
            if let Some(err) = restore {
                parts.push(format!("not restored to {}", err.branch));
            }
            parts.join(", ")
        }
    }
}
