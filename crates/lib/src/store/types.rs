//! Value and error types shared by every store backend.

use std::fmt;

use thiserror::Error;

use super::path::LogicalPath;

/// File content as handed to and returned from a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
  Text(String),
  Bytes(Vec<u8>),
}

impl Content {
  /// Borrow the raw bytes regardless of variant.
  pub fn as_bytes(&self) -> &[u8] {
    match self {
      Content::Text(text) => text.as_bytes(),
      Content::Bytes(bytes) => bytes,
    }
  }

  pub fn into_bytes(self) -> Vec<u8> {
    match self {
      Content::Text(text) => text.into_bytes(),
      Content::Bytes(bytes) => bytes,
    }
  }

  pub fn len(&self) -> usize {
    self.as_bytes().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Returns the text, decoding bytes as UTF-8 if necessary.
  pub fn into_text(self) -> Result<String, std::string::FromUtf8Error> {
    match self {
      Content::Text(text) => Ok(text),
      Content::Bytes(bytes) => String::from_utf8(bytes),
    }
  }

  /// Re-encode into the representation requested by `encoding`.
  pub(crate) fn decode(bytes: Vec<u8>, encoding: Encoding, path: &LogicalPath) -> Result<Self, StoreError> {
    match encoding {
      Encoding::Binary => Ok(Content::Bytes(bytes)),
      Encoding::Utf8 => String::from_utf8(bytes)
        .map(Content::Text)
        .map_err(|_| StoreError::InvalidUtf8 { path: path.to_string() }),
    }
  }
}

impl From<String> for Content {
  fn from(value: String) -> Self {
    Content::Text(value)
  }
}

impl From<&str> for Content {
  fn from(value: &str) -> Self {
    Content::Text(value.to_string())
  }
}

impl From<Vec<u8>> for Content {
  fn from(value: Vec<u8>) -> Self {
    Content::Bytes(value)
  }
}

impl From<&[u8]> for Content {
  fn from(value: &[u8]) -> Self {
    Content::Bytes(value.to_vec())
  }
}

/// How `read_file` should hand back content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
  #[default]
  Utf8,
  Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
  File,
  Dir,
}

impl EntryKind {
  pub fn as_str(self) -> &'static str {
    match self {
      EntryKind::File => "file",
      EntryKind::Dir => "directory",
    }
  }
}

impl fmt::Display for EntryKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A direct child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
  pub name: String,
  pub kind: EntryKind,
}

/// Reference to a directory that existed (or was created) when it was resolved.
///
/// Handles are not cached; each one is produced by a fresh resolution walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirRef {
  path: LogicalPath,
}

impl DirRef {
  pub(crate) fn new(path: LogicalPath) -> Self {
    Self { path }
  }

  pub fn path(&self) -> &LogicalPath {
    &self.path
  }
}

/// Reference to a file obtained from a lookup or a traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
  path: LogicalPath,
}

impl FileRef {
  pub(crate) fn new(path: LogicalPath) -> Self {
    Self { path }
  }

  pub fn path(&self) -> &LogicalPath {
    &self.path
  }
}

/// Errors produced by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
  /// The path is empty or contains an empty, `.` or `..` segment.
  #[error("invalid path '{path}': {reason}")]
  InvalidPath { path: String, reason: &'static str },

  /// A segment of the path does not exist.
  #[error("not found: '{segment}' in '{path}'")]
  NotFound { path: String, segment: String },

  /// A segment exists but is the wrong kind.
  #[error("'{segment}' in '{path}' is not a {expected}")]
  KindMismatch {
    path: String,
    segment: String,
    expected: EntryKind,
  },

  /// A file read as UTF-8 text contains invalid bytes.
  #[error("'{path}' is not valid UTF-8")]
  InvalidUtf8 { path: String },

  #[error("io error on '{path}': {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },
}

impl StoreError {
  pub fn is_not_found(&self) -> bool {
    matches!(self, StoreError::NotFound { .. })
  }

  pub fn is_kind_mismatch(&self) -> bool {
    matches!(self, StoreError::KindMismatch { .. })
  }

  pub(crate) fn not_found(path: &LogicalPath, depth: usize) -> Self {
    StoreError::NotFound {
      path: path.to_string(),
      segment: path.prefix(depth),
    }
  }

  pub(crate) fn kind_mismatch(path: &LogicalPath, depth: usize, expected: EntryKind) -> Self {
    StoreError::KindMismatch {
      path: path.to_string(),
      segment: path.prefix(depth),
      expected,
    }
  }

  pub(crate) fn io(path: impl fmt::Display, source: std::io::Error) -> Self {
    StoreError::Io {
      path: path.to_string(),
      source,
    }
  }
}
