//! Build orchestration.
//!
//! [`build`] runs one build of a project:
//!
//! 1. Load the project config and entry module
//! 2. Run the `beforeAll` script
//! 3. Ensure the output root (development builds)
//! 4. Run the `beforeSave` script
//! 5. Save: the entry module emits files into the materializer
//! 6. Copy resources, run output handlers, archive, prune
//! 7. Wait for detached archives and prune what they held back
//! 8. Run the `afterAll` script
//!
//! A build never fails outward. The first error stops the run, is logged and
//! is recorded in the returned [`BuildReport`].

mod types;

pub use types::*;

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::materialize::{ArchivePolicy, BuildMode, MaterializeConfig, Materializer, PendingArchive};
use crate::store::{DiskStore, SharedStore};

/// Build the project at `ctx.root_dir` into its on-disk output directory.
pub async fn build(ctx: &BuildContext, loader: &dyn ProjectLoader) -> BuildReport {
  let store: SharedStore = Arc::new(DiskStore::new(&ctx.root_dir));
  build_with_store(ctx, loader, store).await
}

/// Build against an arbitrary store; `ctx.root_dir` is only passed through.
pub async fn build_with_store(ctx: &BuildContext, loader: &dyn ProjectLoader, store: SharedStore) -> BuildReport {
  let mut report = BuildReport::default();
  if let Err(e) = run(ctx, loader, store, &mut report).await {
    error!(error = %e, "build failed");
    report.error = Some(e);
  }
  report
}

async fn run(
  ctx: &BuildContext,
  loader: &dyn ProjectLoader,
  store: SharedStore,
  report: &mut BuildReport,
) -> Result<(), BuildError> {
  info!(root = %ctx.root_dir.display(), production = ctx.production, dry = ctx.dry, "starting build");

  let project = loader.load(ctx).await.map_err(|e| BuildError::Load(e.into()))?;
  report.project = Some(project.config.name.clone());
  info!(name = %project.config.name, "project loaded");

  run_hook("beforeAll", project.scripts.before_all.as_ref()).await?;

  let request = SaveRequest {
    dry: ctx.dry,
    verbose: ctx.verbose,
    context: ctx.clone(),
  };

  if ctx.dry {
    run_hook("beforeSave", project.scripts.before_save.as_ref()).await?;
    let sink = DrySink::new(project.config.save_options.resources.exclude.generated.clone());
    project
      .entry
      .save(&request, &sink)
      .await
      .map_err(|e| BuildError::Save(e.into()))?;
    report.dry_run_files = sink.into_paths();
    info!(files = report.dry_run_files.len(), "dry run, nothing written");
  } else {
    let materializer = Materializer::new(store, materialize_config(ctx, &project.config))?;
    materializer.prepare().await?;

    run_hook("beforeSave", project.scripts.before_save.as_ref()).await?;
    let packs = project
      .entry
      .save(&request, &materializer)
      .await
      .map_err(|e| BuildError::Save(e.into()))?;
    debug!(pack_types = packs.len(), "entry module saved");

    let mut result = materializer.materialize(&packs).await?;
    // Record the report before waiting so a failed archive still leaves it behind.
    let pending = std::mem::take(&mut result.pending_archives);
    report.materialize = Some(result);
    if !pending.is_empty() {
      await_archives(pending, report).await?;
      let pruned = materializer.prune_empty_dirs().await?;
      if let Some(materialized) = report.materialize.as_mut() {
        materialized.pruned_dirs += pruned;
      }
    }
  }

  run_hook("afterAll", project.scripts.after_all.as_ref()).await?;
  info!("build finished");
  Ok(())
}

fn materialize_config(ctx: &BuildContext, config: &ProjectConfig) -> MaterializeConfig {
  let mut materialize = MaterializeConfig::new(config.name.clone());
  materialize.mode = if ctx.production {
    BuildMode::Production
  } else {
    BuildMode::Development
  };
  if ctx.await_archives {
    materialize.archive_policy = ArchivePolicy::Await;
  }
  materialize.exclude = config.save_options.resources.exclude.clone();
  materialize.handlers = config.save_options.resources.handle.clone();
  materialize
}

async fn await_archives(pending: Vec<PendingArchive>, report: &mut BuildReport) -> Result<(), BuildError> {
  for archive in pending {
    let pack_type = archive.pack_type.clone();
    let outcome = archive.wait().await?;
    debug!(pack_type = %pack_type, "detached archive finished");
    if let Some(materialized) = report.materialize.as_mut() {
      materialized.archives.push((pack_type, outcome));
    }
  }
  Ok(())
}

async fn run_hook(name: &'static str, hook: Option<&Hook>) -> Result<(), BuildError> {
  let Some(hook) = hook else {
    return Ok(());
  };
  debug!(hook = name, "running script");
  hook().await.map_err(|e| BuildError::Hook {
    hook: name,
    source: e.into(),
  })
}
