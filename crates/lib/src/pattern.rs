//! Path patterns for exclusions and file handlers.
//!
//! Patterns are globs matched against output-root-relative paths such as
//! `datapack/data/ns/function/main.mcfunction`. `*` and `?` never cross a
//! `/`; use `**` to match any depth.

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

#[derive(Debug, thiserror::Error)]
#[error("invalid path pattern '{pattern}': {source}")]
pub struct PatternError {
  pub pattern: String,
  #[source]
  pub source: globset::Error,
}

fn compile(pattern: &str) -> Result<Glob, PatternError> {
  GlobBuilder::new(pattern)
    .literal_separator(true)
    .build()
    .map_err(|source| PatternError {
      pattern: pattern.to_string(),
      source,
    })
}

/// A compiled set of globs; matches when any of them does.
#[derive(Debug, Clone)]
pub struct PathMatcher {
  patterns: Vec<String>,
  set: GlobSet,
}

impl PathMatcher {
  pub fn new<I, S>(patterns: I) -> Result<Self, PatternError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut builder = GlobSetBuilder::new();
    let mut sources = Vec::new();
    for pattern in patterns {
      let pattern = pattern.as_ref();
      builder.add(compile(pattern)?);
      sources.push(pattern.to_string());
    }
    let set = builder.build().map_err(|source| PatternError {
      pattern: sources.join(", "),
      source,
    })?;
    Ok(Self { patterns: sources, set })
  }

  /// A matcher that matches nothing.
  pub fn empty() -> Self {
    Self {
      patterns: Vec::new(),
      set: GlobSet::empty(),
    }
  }

  pub fn is_match(&self, path: &str) -> bool {
    self.set.is_match(path)
  }

  pub fn is_empty(&self) -> bool {
    self.patterns.is_empty()
  }

  pub fn patterns(&self) -> &[String] {
    &self.patterns
  }
}

impl Default for PathMatcher {
  fn default() -> Self {
    Self::empty()
  }
}
