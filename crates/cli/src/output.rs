//! Terminal and JSON rendering for command reports.
//!
//! A text report is a status line followed by indented `label: value` rows.
//! Warnings go to stderr so a failed-definition listing never mixes with
//! `-o json` output on stdout.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

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

/// How a status line is marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  Done,
  Partial,
  Note,
}

impl Status {
  fn marker(self) -> &'static str {
    match self {
      Status::Done => "✓",
      Status::Partial => "!",
      Status::Note => "-",
    }
  }
}

/// Print a status line. `Partial` goes to stderr.
pub fn status(kind: Status, message: &str) {
  let marker = kind.marker();
  match kind {
    Status::Done => println!("{} {message}", marker.if_supports_color(Stream::Stdout, |m| m.green())),
    Status::Note => println!("{} {message}", marker.if_supports_color(Stream::Stdout, |m| m.cyan())),
    Status::Partial => eprintln!(
      "{} {}",
      marker.if_supports_color(Stream::Stderr, |m| m.yellow()),
      message.if_supports_color(Stream::Stderr, |m| m.yellow())
    ),
  }
}

/// One indented `label: value` row under a status line.
pub fn field(label: &str, value: impl std::fmt::Display) {
  println!("  {}: {value}", label.if_supports_color(Stream::Stdout, |l| l.dimmed()));
}

pub fn json<T: serde::Serialize>(report: &T) -> anyhow::Result<()> {
  let rendered = serde_json::to_string_pretty(report).context("Failed to render report as JSON")?;
  println!("{rendered}");
  Ok(())
}

/// Leading 12 hex digits of a digest.
pub fn short_digest(hex: &str) -> &str {
  hex.get(..12).unwrap_or(hex)
}

/// Archive sizes: bytes below 1 KiB, otherwise KiB or MiB with one decimal.
pub fn human_size(bytes: u64) -> String {
  const UNITS: [(&str, u64); 2] = [("MiB", 1 << 20), ("KiB", 1 << 10)];

  UNITS
    .iter()
    .find(|(_, scale)| bytes >= *scale)
    .map(|(unit, scale)| format!("{:.1} {unit}", bytes as f64 / *scale as f64))
    .unwrap_or_else(|| format!("{bytes} B"))
}

/// Wall time of a compile run: milliseconds under a second, seconds otherwise.
pub fn elapsed(duration: Duration) -> String {
  if duration < Duration::from_secs(1) {
    format!("{}ms", duration.as_millis())
  } else {
    format!("{:.2}s", duration.as_secs_f64())
  }
}
