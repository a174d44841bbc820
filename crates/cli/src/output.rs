//! Rendering of staging results.
//!
//! Text mode prints a colored status line followed by the summary of a
//! [`StageReport`]; JSON mode prints the report itself. Results go to stdout,
//! failures to stderr.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use appstager_lib::stage::{DependencySource, StageReport};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

/// Binary size with the largest unit that keeps the value at or above one.
pub fn format_bytes(bytes: u64) -> String {
  const UNITS: [&str; 3] = ["KB", "MB", "GB"];

  if bytes < 1024 {
    return format!("{bytes} B");
  }
  let mut value = bytes as f64 / 1024.0;
  let mut unit = 0;
  while value >= 1024.0 && unit + 1 < UNITS.len() {
    value /= 1024.0;
    unit += 1;
  }
  format!("{value:.1} {}", UNITS[unit])
}

pub fn format_duration(duration: Duration) -> String {
  match duration.as_secs() {
    0 => format!("{}ms", duration.subsec_millis()),
    secs @ 1..60 => format!("{secs}.{:02}s", duration.subsec_millis() / 10),
    secs => format!("{}m {}s", secs / 60, secs % 60),
  }
}

/// Label/value rows of the text summary, in display order.
pub fn report_stats(report: &StageReport, minor: u32, elapsed: Duration) -> Vec<(&'static str, String)> {
  let mut stats = vec![
    ("Strategy", report.strategy.to_string()),
    ("Go version", format!("go1.{minor}")),
  ];
  match report.dependencies {
    DependencySource::Module => stats.push(("Dependencies", "from go.mod".to_string())),
    DependencySource::Workspace => stats.push(("Packages bundled", report.packages.len().to_string())),
  }
  stats.push(("Files copied", report.copy.files_copied.to_string()));
  stats.push(("Size", format_bytes(report.copy.bytes_copied)));
  if !report.copy.skipped.is_empty() {
    stats.push(("Entries skipped", report.copy.skipped.len().to_string()));
  }
  stats.push(("Duration", format_duration(elapsed)));
  stats
}

/// Print the text summary of a finished staging run.
pub fn print_report(report: &StageReport, minor: u32, elapsed: Duration) {
  println!();
  println!(
    "{} Staged {}",
    "✓".if_supports_color(Stream::Stdout, |s| s.green()),
    report.staged_dir.display()
  );
  for (label, value) in report_stats(report, minor, elapsed) {
    println!("  {}: {value}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()));
  }
  if let Some(side_file) = &report.side_file {
    println!(
      "{} main package: {}",
      "•".if_supports_color(Stream::Stdout, |s| s.blue()),
      side_file.content
    );
  }
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    "✗".if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{json}");
  Ok(())
}
