//! Types for output materialization.
//!
//! Configuration, pack type descriptors, handler callbacks, reports and the
//! error type used by [`super::Materializer`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::consts::{OUTPUT_ROOT, RESOURCES_ROOT};
use crate::pattern::{PathMatcher, PatternError};
use crate::store::{Content, Encoding, LogicalPath, SharedStore, StoreError};

/// Errors that can occur while materializing output.
#[derive(Debug, Error)]
pub enum MaterializeError {
  #[error("store error: {0}")]
  Store(#[from] StoreError),

  #[error(transparent)]
  Pattern(#[from] PatternError),

  /// A file handler callback failed.
  #[error("file handler failed for '{path}': {source}")]
  Handler {
    path: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// A pack type's output handler failed.
  #[error("output handler for pack type '{pack_type}' failed: {source}")]
  OutputHandler {
    pack_type: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("archive error: {0}")]
  Archive(#[from] zip::result::ZipError),

  /// A spawned archive task panicked or was cancelled.
  #[error("archive task failed: {0}")]
  Join(#[from] tokio::task::JoinError),
}

/// Whether this is a production build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildMode {
  /// Output directories are ensured up front and archives are awaited in turn.
  #[default]
  Development,
  /// Output directories are left to the caller and archives may run detached.
  Production,
}

/// How archive creation is sequenced relative to the next pack type.
///
/// `Detached` only takes effect in production builds: archive tasks are
/// spawned and the materializer moves on to the next pack type without
/// waiting. There is then no ordering between "archive N finished" and "pack
/// type N+1 started"; callers get the handles back in
/// [`MaterializeReport::pending_archives`]. Use `Await` for strict ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArchivePolicy {
  Await,
  #[default]
  Detached,
}

/// Exclusion globs for generated artifacts and pre-existing resources.
#[derive(Debug, Clone, Default)]
pub struct ExclusionRules {
  pub generated: PathMatcher,
  pub existing: PathMatcher,
}

impl ExclusionRules {
  pub fn new<S: AsRef<str>>(generated: &[S], existing: &[S]) -> Result<Self, PatternError> {
    Ok(Self {
      generated: PathMatcher::new(generated)?,
      existing: PathMatcher::new(existing)?,
    })
  }
}

pub type HandlerFuture = BoxFuture<'static, anyhow::Result<Content>>;

/// Content transform applied to matching paths.
pub type HandlerCallback = Arc<dyn Fn(Content) -> HandlerFuture + Send + Sync>;

#[derive(Clone)]
pub struct FileHandler {
  matcher: PathMatcher,
  callback: HandlerCallback,
}

impl FileHandler {
  pub fn new<F>(pattern: &str, callback: F) -> Result<Self, PatternError>
  where
    F: Fn(Content) -> HandlerFuture + Send + Sync + 'static,
  {
    Ok(Self {
      matcher: PathMatcher::new([pattern])?,
      callback: Arc::new(callback),
    })
  }

  /// A handler whose transform does not need to await anything.
  pub fn sync<F>(pattern: &str, transform: F) -> Result<Self, PatternError>
  where
    F: Fn(Content) -> anyhow::Result<Content> + Send + Sync + 'static,
  {
    Self::new(pattern, move |content| {
      let result = transform(content);
      async move { result }.boxed()
    })
  }

  pub fn matches(&self, path: &str) -> bool {
    self.matcher.is_match(path)
  }
}

impl fmt::Debug for FileHandler {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FileHandler")
      .field("patterns", &self.matcher.patterns())
      .finish_non_exhaustive()
  }
}

/// Ordered list of file handlers.
#[derive(Debug, Clone, Default)]
pub struct FileHandlers {
  handlers: Vec<FileHandler>,
}

impl FileHandlers {
  pub fn new(handlers: Vec<FileHandler>) -> Self {
    Self { handlers }
  }

  pub fn push(&mut self, handler: FileHandler) {
    self.handlers.push(handler);
  }

  pub fn len(&self) -> usize {
    self.handlers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.handlers.is_empty()
  }

  /// Thread `content` through every handler matching `path`, in list order.
  pub async fn apply(&self, path: &str, mut content: Content) -> Result<Content, MaterializeError> {
    for handler in self.handlers.iter().filter(|handler| handler.matches(path)) {
      content = (handler.callback)(content)
        .await
        .map_err(|e| MaterializeError::Handler {
          path: path.to_string(),
          source: e.into(),
        })?;
    }
    Ok(content)
  }
}

/// Read/write access to the output root handed to output handlers.
///
/// Paths are relative to the output root, e.g. `datapack/pack.mcmeta`.
#[derive(Debug, Clone)]
pub struct OutputIo {
  store: SharedStore,
  root: LogicalPath,
}

impl OutputIo {
  pub(crate) fn new(store: SharedStore, root: LogicalPath) -> Self {
    Self { store, root }
  }

  fn resolve(&self, relative_path: &str) -> Result<LogicalPath, StoreError> {
    Ok(self.root.join_path(&LogicalPath::parse(relative_path)?))
  }

  pub async fn read(&self, relative_path: &str, encoding: Encoding) -> Result<Content, StoreError> {
    let path = self.resolve(relative_path)?;
    let bytes = self.store.read(&path).await?;
    Content::decode(bytes, encoding, &path)
  }

  /// Write `content`, or delete the path when `content` is `None`.
  ///
  /// Deleting a path that does not exist is not an error.
  pub async fn write(&self, relative_path: &str, content: Option<Content>) -> Result<(), StoreError> {
    let path = self.resolve(relative_path)?;
    match content {
      Some(content) => self.store.write(&path, content).await,
      None => match self.store.remove(&path.to_string()).await {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
      },
    }
  }
}

/// Custom post-processing for a pack type's output.
#[async_trait]
pub trait OutputHandler: Send + Sync {
  async fn handle_output(&self, subfolder: &str, io: &OutputIo) -> anyhow::Result<()>;
}

/// A category of generated output with its own directory and archive.
#[derive(Clone)]
pub struct PackType {
  pub name: String,
  pub archive_output: bool,
  pub handle_output: Option<Arc<dyn OutputHandler>>,
}

impl PackType {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      archive_output: false,
      handle_output: None,
    }
  }

  pub fn archived(mut self) -> Self {
    self.archive_output = true;
    self
  }

  pub fn with_output_handler(mut self, handler: Arc<dyn OutputHandler>) -> Self {
    self.handle_output = Some(handler);
    self
  }
}

impl fmt::Debug for PackType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PackType")
      .field("name", &self.name)
      .field("archive_output", &self.archive_output)
      .field("handle_output", &self.handle_output.is_some())
      .finish()
  }
}

/// Receives generated files from user code.
#[async_trait]
pub trait FileSink: Send + Sync {
  async fn file(&self, relative_path: &str, content: Content) -> Result<FileOutcome, MaterializeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
  Written,
  Excluded,
}

/// Materializer settings.
#[derive(Debug, Clone)]
pub struct MaterializeConfig {
  /// Logical path of the output root inside the store.
  pub output_root: String,
  /// Logical path of the resources directory inside the store.
  pub resources_root: String,
  /// Pack name used in archive file names.
  pub pack_name: String,
  pub mode: BuildMode,
  pub archive_policy: ArchivePolicy,
  pub exclude: ExclusionRules,
  pub handlers: FileHandlers,
}

impl MaterializeConfig {
  pub fn new(pack_name: impl Into<String>) -> Self {
    Self {
      output_root: OUTPUT_ROOT.to_string(),
      resources_root: RESOURCES_ROOT.to_string(),
      pack_name: pack_name.into(),
      mode: BuildMode::default(),
      archive_policy: ArchivePolicy::default(),
      exclude: ExclusionRules::default(),
      handlers: FileHandlers::default(),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileStats {
  pub written: usize,
  pub excluded: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceReport {
  pub copied: usize,
  pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
  Archived { path: String, files: usize },
  NothingToArchive,
}

impl ArchiveOutcome {
  pub fn is_archived(&self) -> bool {
    matches!(self, ArchiveOutcome::Archived { .. })
  }
}

/// An archive task started without waiting for it.
#[derive(Debug)]
pub struct PendingArchive {
  pub pack_type: String,
  pub(crate) handle: JoinHandle<Result<ArchiveOutcome, MaterializeError>>,
}

impl PendingArchive {
  pub async fn wait(self) -> Result<ArchiveOutcome, MaterializeError> {
    self.handle.await?
  }
}

/// Summary of one materialization pass.
#[derive(Debug, Default)]
pub struct MaterializeReport {
  pub files: FileStats,
  pub resources: Vec<(String, ResourceReport)>,
  pub archives: Vec<(String, ArchiveOutcome)>,
  pub pending_archives: Vec<PendingArchive>,
  pub pruned_dirs: usize,
}
