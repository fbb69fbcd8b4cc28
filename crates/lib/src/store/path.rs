//! Logical path parsing.
//!
//! A logical path is the slash-delimited address of a node inside a store. The
//! last segment is the leaf name, everything before it is the directory chain
//! that backends walk one segment at a time.

use std::fmt;
use std::path::PathBuf;

use super::types::StoreError;

const SEPARATOR: char = '/';

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogicalPath {
  segments: Vec<String>,
}

impl LogicalPath {
  /// Parse a slash-delimited path.
  ///
  /// Empty paths, empty segments (`a//b`, `/a`, `a/`) and the relative
  /// segments `.`/`..` are rejected rather than normalized away.
  pub fn parse(raw: &str) -> Result<Self, StoreError> {
    if raw.is_empty() {
      return Err(invalid(raw, "path is empty"));
    }

    let mut segments = Vec::new();
    for segment in raw.split(SEPARATOR) {
      validate_segment(raw, segment)?;
      segments.push(segment.to_string());
    }

    Ok(Self { segments })
  }

  pub fn segments(&self) -> &[String] {
    &self.segments
  }

  pub fn len(&self) -> usize {
    self.segments.len()
  }

  /// Always false; parsing guarantees at least one segment.
  pub fn is_empty(&self) -> bool {
    self.segments.is_empty()
  }

  /// The final segment.
  pub fn leaf(&self) -> &str {
    self.segments.last().map(String::as_str).unwrap_or_default()
  }

  /// Every segment except the leaf.
  pub fn dir_chain(&self) -> &[String] {
    &self.segments[..self.segments.len().saturating_sub(1)]
  }

  /// The directory chain as a path of its own, `None` for single-segment paths.
  pub fn parent(&self) -> Option<LogicalPath> {
    if self.segments.len() < 2 {
      return None;
    }
    Some(Self {
      segments: self.dir_chain().to_vec(),
    })
  }

  /// Append a single child name.
  pub fn join(&self, name: &str) -> Result<LogicalPath, StoreError> {
    let mut segments = self.segments.clone();
    for segment in name.split(SEPARATOR) {
      validate_segment(name, segment)?;
      segments.push(segment.to_string());
    }
    Ok(Self { segments })
  }

  /// Append every segment of `other`.
  pub fn join_path(&self, other: &LogicalPath) -> LogicalPath {
    let mut segments = self.segments.clone();
    segments.extend(other.segments.iter().cloned());
    Self { segments }
  }

  /// The path made of the first `depth` segments, serialized.
  pub fn prefix(&self, depth: usize) -> String {
    self.segments[..depth.min(self.segments.len())].join("/")
  }

  /// The remainder after `base`, if `base` is a strict ancestor.
  pub fn strip_prefix(&self, base: &LogicalPath) -> Option<LogicalPath> {
    if base.segments.len() >= self.segments.len() || !self.segments.starts_with(&base.segments) {
      return None;
    }
    Some(Self {
      segments: self.segments[base.segments.len()..].to_vec(),
    })
  }

  /// Native relative path for on-disk backends.
  pub fn to_native(&self) -> PathBuf {
    self.segments.iter().collect()
  }
}

impl fmt::Display for LogicalPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.segments.join("/"))
  }
}

fn validate_segment(raw: &str, segment: &str) -> Result<(), StoreError> {
  match segment {
    "" => Err(invalid(raw, "empty path segment")),
    "." | ".." => Err(invalid(raw, "relative path segment")),
    _ => Ok(()),
  }
}

fn invalid(raw: &str, reason: &'static str) -> StoreError {
  StoreError::InvalidPath {
    path: raw.to_string(),
    reason,
  }
}
