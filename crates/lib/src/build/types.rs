//! Types for the build pipeline.
//!
//! This module defines the build context, the project description handed back
//! by a [`ProjectLoader`], the collaborator traits and the build report.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;

use crate::materialize::{
  ExclusionRules, FileHandlers, FileOutcome, FileSink, MaterializeError, MaterializeReport, PackType,
};
use crate::pattern::PathMatcher;
use crate::store::Content;

/// Parameters of one build run.
///
/// Passed explicitly to the loader, the entry module and the pipeline; nothing
/// is read from the process environment.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildContext {
  /// Project root. Stores are rooted here.
  pub root_dir: PathBuf,
  /// Config file override, relative to `root_dir` unless absolute.
  pub config_path: Option<PathBuf>,
  pub production: bool,
  pub dry: bool,
  pub verbose: bool,
  /// Wait for each archive before moving on, even in production.
  pub await_archives: bool,
}

/// Resource handling options from the project config.
#[derive(Debug, Clone, Default)]
pub struct ResourceOptions {
  pub exclude: ExclusionRules,
  pub handle: FileHandlers,
}

/// Save options from the project config.
///
/// Only `resources` is interpreted by the pipeline; the rest is carried for
/// entry modules.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
  pub world: Option<String>,
  pub root: Option<String>,
  pub indentation: Option<u32>,
  pub custom_file_handler: bool,
  pub resources: ResourceOptions,
}

/// Project configuration.
#[derive(Debug, Clone, Default)]
pub struct ProjectConfig {
  /// Pack name, used in archive file names.
  pub name: String,
  pub pack_uid: Option<String>,
  pub namespace: Option<String>,
  pub on_conflict: Option<String>,
  pub packs: serde_json::Value,
  pub save_options: SaveOptions,
}

pub type HookFuture = BoxFuture<'static, anyhow::Result<()>>;

/// Zero-argument lifecycle hook.
pub type Hook = Arc<dyn Fn() -> HookFuture + Send + Sync>;

/// Optional lifecycle hooks.
#[derive(Clone, Default)]
pub struct Scripts {
  pub before_all: Option<Hook>,
  pub before_save: Option<Hook>,
  pub after_all: Option<Hook>,
}

impl std::fmt::Debug for Scripts {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Scripts")
      .field("before_all", &self.before_all.is_some())
      .field("before_save", &self.before_save.is_some())
      .field("after_all", &self.after_all.is_some())
      .finish()
  }
}

/// Options passed to [`EntryModule::save`].
#[derive(Debug, Clone)]
pub struct SaveRequest {
  pub dry: bool,
  pub verbose: bool,
  pub context: BuildContext,
}

/// User code that generates the pack.
///
/// Generated files go to `sink` one at a time; the returned pack types drive
/// resource copying and archiving.
#[async_trait]
pub trait EntryModule: Send + Sync {
  async fn save(&self, options: &SaveRequest, sink: &dyn FileSink) -> anyhow::Result<Vec<PackType>>;
}

/// A loaded project.
#[derive(Clone)]
pub struct Project {
  pub config: ProjectConfig,
  pub entry: Arc<dyn EntryModule>,
  pub scripts: Scripts,
}

impl std::fmt::Debug for Project {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Project")
      .field("config", &self.config)
      .field("scripts", &self.scripts)
      .finish_non_exhaustive()
  }
}

/// Loads the project config and entry module for a build.
#[async_trait]
pub trait ProjectLoader: Send + Sync {
  async fn load(&self, ctx: &BuildContext) -> anyhow::Result<Project>;
}

/// Sink used for dry runs: records what would be written.
#[derive(Debug, Default)]
pub struct DrySink {
  exclude: PathMatcher,
  paths: Mutex<Vec<String>>,
}

impl DrySink {
  pub fn new(exclude: PathMatcher) -> Self {
    Self {
      exclude,
      paths: Mutex::new(Vec::new()),
    }
  }

  /// Paths that would have been written, in emission order.
  pub fn into_paths(self) -> Vec<String> {
    self.paths.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

#[async_trait]
impl FileSink for DrySink {
  async fn file(&self, relative_path: &str, _content: Content) -> Result<FileOutcome, MaterializeError> {
    if self.exclude.is_match(relative_path) {
      return Ok(FileOutcome::Excluded);
    }
    self
      .paths
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .push(relative_path.to_string());
    Ok(FileOutcome::Written)
  }
}

/// Errors that stop a build. Recorded in [`BuildReport::error`].
#[derive(Debug, Error)]
pub enum BuildError {
  /// The project could not be loaded.
  #[error("failed to load project: {0}")]
  Load(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// A lifecycle hook failed.
  #[error("{hook} script failed: {source}")]
  Hook {
    hook: &'static str,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// The entry module's save failed.
  #[error("failed to save pack: {0}")]
  Save(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("failed to write output: {0}")]
  Materialize(#[from] MaterializeError),
}

/// Outcome of a build run.
#[derive(Debug, Default)]
pub struct BuildReport {
  /// Pack name, once the project is loaded.
  pub project: Option<String>,
  /// Paths a dry run would have written.
  pub dry_run_files: Vec<String>,
  /// Materialization summary; detached archives are already awaited.
  pub materialize: Option<MaterializeReport>,
  pub error: Option<BuildError>,
}

impl BuildReport {
  pub fn is_success(&self) -> bool {
    self.error.is_none()
  }
}
