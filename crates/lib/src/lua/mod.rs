//! Lua project host.
//!
//! Projects are described by a `sandstone.lua` config and generated by an
//! entry script, both evaluated in one Lua runtime per build.
//!
//! # Submodules
//!
//! - [`entry`] - Entry script execution (`sandstone.emit`, pack types)
//! - [`project`] - Config parsing, Lua file handlers and hooks
//! - [`runtime`] - Low-level Lua VM setup and file loading

pub mod entry;
pub mod project;
pub mod runtime;

use std::path::PathBuf;

use mlua::prelude::LuaError;
use thiserror::Error;

use crate::pattern::PatternError;

pub use entry::LuaEntryModule;
pub use project::LuaProjectLoader;

/// Errors that can occur while loading a Lua project.
#[derive(Debug, Error)]
pub enum LuaHostError {
  #[error("config file not found: {}", .0.display())]
  ConfigNotFound(PathBuf),

  #[error("{} must return a table", .0.display())]
  NotATable(PathBuf),

  #[error("missing required field '{0}' in project config")]
  MissingField(&'static str),

  /// Entry `n` (1-based) of `saveOptions.resources.handle` is malformed.
  #[error("invalid file handler #{0}: {1}")]
  InvalidHandler(usize, &'static str),

  #[error(transparent)]
  Pattern(#[from] PatternError),

  #[error("lua error: {0}")]
  Lua(#[from] LuaError),
}
