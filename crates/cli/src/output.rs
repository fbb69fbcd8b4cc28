//! Terminal output for `sand`.
//!
//! Status lines are a colored glyph followed by the message. Successes, info,
//! stats and items go to stdout, while errors and warnings go to stderr so
//! `--output json` keeps stdout parseable.

use std::fmt::Display;
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

#[derive(Debug, Clone, Copy)]
enum Status {
  Success,
  Error,
  Warning,
  Info,
}

impl Status {
  fn glyph(self) -> &'static str {
    match self {
      Status::Success => "✓",
      Status::Error => "✗",
      Status::Warning => "⚠",
      Status::Info => "•",
    }
  }

  fn stream(self) -> Stream {
    match self {
      Status::Success | Status::Info => Stream::Stdout,
      Status::Error | Status::Warning => Stream::Stderr,
    }
  }

  fn line(self, message: &str) -> String {
    let stream = self.stream();
    let glyph = self.glyph();
    match self {
      Status::Success => format!("{} {message}", glyph.if_supports_color(stream, |s| s.green())),
      Status::Info => format!("{} {message}", glyph.if_supports_color(stream, |s| s.blue())),
      Status::Error => format!(
        "{} {}",
        glyph.if_supports_color(stream, |s| s.red()),
        message.if_supports_color(stream, |s| s.red())
      ),
      Status::Warning => format!(
        "{} {}",
        glyph.if_supports_color(stream, |s| s.yellow()),
        message.if_supports_color(stream, |s| s.yellow())
      ),
    }
  }

  fn print(self, message: &str) {
    let line = self.line(message);
    match self.stream() {
      Stream::Stderr => eprintln!("{line}"),
      _ => println!("{line}"),
    }
  }
}

/// Compact human duration: `850ms`, `2.40s`, `3m 5s`.
pub fn format_duration(duration: Duration) -> String {
  match duration.as_millis() {
    millis @ 0..1_000 => format!("{millis}ms"),
    millis @ 1_000..60_000 => format!("{}.{:02}s", millis / 1_000, (millis % 1_000) / 10),
    millis => {
      let secs = millis / 1_000;
      format!("{}m {}s", secs / 60, secs % 60)
    }
  }
}

pub fn print_success(message: &str) {
  Status::Success.print(message);
}

pub fn print_error(message: &str) {
  Status::Error.print(message);
}

pub fn print_warning(message: &str) {
  Status::Warning.print(message);
}

pub fn print_info(message: &str) {
  Status::Info.print(message);
}

/// `  label: value`, with the label dimmed.
pub fn print_stat(label: &str, value: impl Display) {
  println!("  {}: {value}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()));
}

/// Indented `→ item` line under a stat.
pub fn print_item(item: &str) {
  println!("    {} {item}", "→".if_supports_color(Stream::Stdout, |s| s.dimmed()));
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize summary")?;
  println!("{json}");
  Ok(())
}
