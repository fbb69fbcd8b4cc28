//! Output materialization.
//!
//! Turns generated artifacts plus the hand-written `resources/<packType>`
//! trees into the output tree:
//!
//! ```text
//! <project>/
//! ├── resources/<packType>/...        # copied, filtered, transformed
//! └── .sandstone/output/
//!     ├── <packType>/...              # generated + resources
//!     └── archives/<pack>_<type>.zip  # optional
//! ```
//!
//! Generated artifacts arrive one at a time through [`FileSink`]; resources,
//! output handlers and archives are processed per pack type by
//! [`Materializer::materialize`], which finishes by pruning directories left
//! without any file.

pub mod archive;
pub mod types;

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::FutureExt;
use futures::StreamExt;
use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use crate::consts::{ARCHIVES_DIR, OUTPUT_SUBFOLDER};
use crate::store::{Content, EntryKind, Encoding, LogicalPath, SharedStore, Store, StoreError};
use crate::walk::{WalkEntry, WalkOptions, walk};

pub use archive::{archive_name, archive_pack};
pub use types::{
  ArchiveOutcome, ArchivePolicy, BuildMode, ExclusionRules, FileHandler, FileHandlers, FileOutcome, FileSink,
  FileStats, HandlerCallback, HandlerFuture, MaterializeConfig, MaterializeError, MaterializeReport, OutputHandler,
  OutputIo, PackType, PendingArchive, ResourceReport,
};

/// Writes generated files and resources into the output tree of a store.
#[derive(Debug)]
pub struct Materializer {
  store: SharedStore,
  config: MaterializeConfig,
  output_root: LogicalPath,
  resources_root: LogicalPath,
  written: AtomicUsize,
  excluded: AtomicUsize,
}

impl Materializer {
  pub fn new(store: SharedStore, config: MaterializeConfig) -> Result<Self, MaterializeError> {
    let output_root = LogicalPath::parse(&config.output_root)?;
    let resources_root = LogicalPath::parse(&config.resources_root)?;
    Ok(Self {
      store,
      config,
      output_root,
      resources_root,
      written: AtomicUsize::new(0),
      excluded: AtomicUsize::new(0),
    })
  }

  pub fn config(&self) -> &MaterializeConfig {
    &self.config
  }

  pub fn store(&self) -> &SharedStore {
    &self.store
  }

  pub fn output_root(&self) -> &LogicalPath {
    &self.output_root
  }

  pub fn file_stats(&self) -> FileStats {
    FileStats {
      written: self.written.load(Ordering::Relaxed),
      excluded: self.excluded.load(Ordering::Relaxed),
    }
  }

  fn detached_archives(&self) -> bool {
    self.config.mode == BuildMode::Production && self.config.archive_policy == ArchivePolicy::Detached
  }

  /// Ensure the output root exists before user code starts emitting files.
  ///
  /// Production builds leave the output directory to the caller.
  pub async fn prepare(&self) -> Result<(), MaterializeError> {
    if self.config.mode == BuildMode::Development {
      self.store.create_dir_all(&self.output_root).await?;
    }
    Ok(())
  }

  /// Handle one generated artifact.
  ///
  /// `relative_path` is relative to the output root and starts with the pack
  /// type, e.g. `datapack/data/ns/function/main.mcfunction`.
  pub async fn handle_file(&self, relative_path: &str, content: Content) -> Result<FileOutcome, MaterializeError> {
    let relative = LogicalPath::parse(relative_path)?;

    if self.config.exclude.generated.is_match(relative_path) {
      debug!(path = %relative_path, "generated file excluded");
      self.excluded.fetch_add(1, Ordering::Relaxed);
      return Ok(FileOutcome::Excluded);
    }

    let content = self.config.handlers.apply(relative_path, content).await?;
    self.write_output(&relative, content).await?;
    self.written.fetch_add(1, Ordering::Relaxed);
    Ok(FileOutcome::Written)
  }

  async fn write_output(&self, relative: &LogicalPath, content: Content) -> Result<(), StoreError> {
    let target = self.output_root.join_path(relative);
    if let Some(parent) = target.parent() {
      self.store.create_dir_all(&parent).await?;
    }
    self.store.write(&target, content).await
  }

  /// Copy `resources/<packType>` into the pack type's output directory.
  ///
  /// Copying is best effort: a file that fails to read, transform or write is
  /// logged and skipped.
  pub async fn copy_resources(&self, pack: &PackType) -> Result<ResourceReport, MaterializeError> {
    let mut report = ResourceReport::default();
    let source = self.resources_root.join(&pack.name)?;
    if !self.store.path_exists(&source.to_string()).await {
      debug!(pack_type = %pack.name, "no resources directory");
      return Ok(report);
    }

    let prefix = format!("{}/", self.resources_root);
    let existing = self.config.exclude.existing.clone();
    let options = WalkOptions::with_filter(move |path| {
      let relative = path.strip_prefix(prefix.as_str()).unwrap_or(path);
      !existing.is_match(relative)
    });

    let mut files = walk(self.store.clone(), &source.to_string(), options).await?;
    while let Some(entry) = files.next().await {
      let result = match entry {
        Ok(entry) => self.copy_resource(&entry).await,
        Err(e) => Err(e.into()),
      };
      match result {
        Ok(()) => report.copied += 1,
        Err(e) => {
          warn!(pack_type = %pack.name, error = %e, "skipping resource file");
          report.skipped += 1;
        }
      }
    }

    Ok(report)
  }

  async fn copy_resource(&self, entry: &WalkEntry) -> Result<(), MaterializeError> {
    let relative = entry
      .path()
      .strip_prefix(&self.resources_root)
      .ok_or_else(|| StoreError::not_found(entry.path(), 1))?;
    let content = entry.read(Encoding::Binary).await?;
    let content = self.config.handlers.apply(&relative.to_string(), content).await?;
    self.write_output(&relative, content).await?;
    debug!(path = %relative, "resource copied");
    Ok(())
  }

  /// Give the pack type's output handler a read/write pass over the output root.
  pub async fn run_output_handler(&self, pack: &PackType) -> Result<(), MaterializeError> {
    let Some(handler) = &pack.handle_output else {
      return Ok(());
    };
    let io = OutputIo::new(self.store.clone(), self.output_root.clone());
    handler
      .handle_output(OUTPUT_SUBFOLDER, &io)
      .await
      .map_err(|e| MaterializeError::OutputHandler {
        pack_type: pack.name.clone(),
        source: e.into(),
      })
  }

  /// Archive the pack type's output directory and wait for it.
  pub async fn archive(&self, pack: &PackType) -> Result<ArchiveOutcome, MaterializeError> {
    archive_pack(
      self.store.clone(),
      self.output_root.clone(),
      self.config.pack_name.clone(),
      pack.name.clone(),
    )
    .await
  }

  fn spawn_archive(&self, pack: &PackType) -> PendingArchive {
    let handle = tokio::spawn(archive_pack(
      self.store.clone(),
      self.output_root.clone(),
      self.config.pack_name.clone(),
      pack.name.clone(),
    ));
    PendingArchive {
      pack_type: pack.name.clone(),
      handle,
    }
  }

  /// Run the pack type's output handler, then archive its output if requested.
  ///
  /// Archives are recorded in `report`, either as finished outcomes or as
  /// pending tasks when they run detached.
  pub async fn finish_pack(&self, pack: &PackType, report: &mut MaterializeReport) -> Result<(), MaterializeError> {
    self.run_output_handler(pack).await?;

    if !pack.archive_output {
      return Ok(());
    }
    if self.detached_archives() {
      debug!(pack_type = %pack.name, "archiving in the background");
      report.pending_archives.push(self.spawn_archive(pack));
    } else {
      let outcome = self.archive(pack).await?;
      report.archives.push((pack.name.clone(), outcome));
    }
    Ok(())
  }

  /// Delete every directory below the output root that holds no file,
  /// directly or transitively. The output root itself is kept. Returns the
  /// number of directories removed.
  pub async fn prune_empty_dirs(&self) -> Result<usize, MaterializeError> {
    self.prune_empty_dirs_except(&[]).await
  }

  /// Like [`Self::prune_empty_dirs`], leaving the `keep` subtrees untouched.
  async fn prune_empty_dirs_except(&self, keep: &[LogicalPath]) -> Result<usize, MaterializeError> {
    if !self.store.path_exists(&self.output_root.to_string()).await {
      return Ok(0);
    }
    let (_, removed) = prune_below(&*self.store, &self.output_root, keep).await?;
    if removed > 0 {
      info!(removed, "pruned empty output directories");
    }
    Ok(removed)
  }

  /// Process every pack type in order, then prune empty directories.
  ///
  /// Pack type directories with a pending archive and the archives directory
  /// are not pruned while detached archives run; prune again once they are
  /// awaited.
  pub async fn materialize(&self, packs: &[PackType]) -> Result<MaterializeReport, MaterializeError> {
    let mut report = MaterializeReport::default();

    for pack in packs {
      if self.config.mode == BuildMode::Development {
        self.store.create_dir_all(&self.output_root.join(&pack.name)?).await?;
      }

      let resources = self.copy_resources(pack).await?;
      info!(
        pack_type = %pack.name,
        copied = resources.copied,
        skipped = resources.skipped,
        "resources copied"
      );
      report.resources.push((pack.name.clone(), resources));

      self.finish_pack(pack, &mut report).await?;
    }

    let mut keep = Vec::with_capacity(report.pending_archives.len() + 1);
    for pending in &report.pending_archives {
      keep.push(self.output_root.join(&pending.pack_type)?);
    }
    if !keep.is_empty() {
      keep.push(self.output_root.join(ARCHIVES_DIR)?);
    }
    report.pruned_dirs = self.prune_empty_dirs_except(&keep).await?;
    report.files = self.file_stats();
    Ok(report)
  }
}

#[async_trait]
impl FileSink for Materializer {
  async fn file(&self, relative_path: &str, content: Content) -> Result<FileOutcome, MaterializeError> {
    self.handle_file(relative_path, content).await
  }
}

/// Returns whether `dir` holds any file and how many directories were removed below it.
/// Directories in `keep` count as holding files and are not descended.
fn prune_below<'a>(
  store: &'a dyn Store,
  dir: &'a LogicalPath,
  keep: &'a [LogicalPath],
) -> BoxFuture<'a, Result<(bool, usize), StoreError>> {
  async move {
    let mut has_files = false;
    let mut removed = 0;

    for entry in store.list(dir).await? {
      match entry.kind {
        EntryKind::File => has_files = true,
        EntryKind::Dir => {
          let child = dir.join(&entry.name)?;
          if keep.contains(&child) {
            has_files = true;
            continue;
          }
          let (child_has_files, child_removed) = prune_below(store, &child, keep).await?;
          removed += child_removed;
          if child_has_files {
            has_files = true;
          } else {
            store.remove_dir_all(&child).await?;
            debug!(path = %child, "removed empty directory");
            removed += 1;
          }
        }
      }
    }

    Ok((has_files, removed))
  }
  .boxed()
}
