//! Implementation of the `sand build` command.
//!
//! Loads the project, runs its entry script and writes the output tree under
//! `.sandstone/output`, printing a summary of what was written.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use serde::Serialize;

use sandstone_lib::build::{BuildContext, BuildReport, build};
use sandstone_lib::lua::LuaProjectLoader;
use sandstone_lib::materialize::ArchiveOutcome;

use crate::output::{
  OutputFormat, format_duration, print_error, print_info, print_item, print_json, print_stat, print_success,
  print_warning,
};

/// Options for the build command.
#[derive(Debug, Clone)]
pub struct BuildArgs {
  pub project: PathBuf,
  pub config: Option<PathBuf>,
  pub production: bool,
  pub dry: bool,
  pub await_archives: bool,
  pub verbose: bool,
  pub output: OutputFormat,
}

/// Machine-readable build summary for `-o json`.
#[derive(Debug, Default, Serialize)]
struct BuildSummary {
  project: Option<String>,
  success: bool,
  error: Option<String>,
  dry_run_files: Vec<String>,
  files_written: usize,
  files_excluded: usize,
  resources_copied: usize,
  resources_skipped: usize,
  archives: Vec<String>,
  pruned_dirs: usize,
}

impl BuildSummary {
  fn from_report(report: &BuildReport) -> Self {
    let mut summary = BuildSummary {
      project: report.project.clone(),
      success: report.is_success(),
      error: report.error.as_ref().map(|e| e.to_string()),
      dry_run_files: report.dry_run_files.clone(),
      ..Default::default()
    };
    if let Some(materialized) = &report.materialize {
      summary.files_written = materialized.files.written;
      summary.files_excluded = materialized.files.excluded;
      for (_, resources) in &materialized.resources {
        summary.resources_copied += resources.copied;
        summary.resources_skipped += resources.skipped;
      }
      summary.archives = materialized
        .archives
        .iter()
        .filter_map(|(_, outcome)| match outcome {
          ArchiveOutcome::Archived { path, .. } => Some(path.clone()),
          ArchiveOutcome::NothingToArchive => None,
        })
        .collect();
      summary.pruned_dirs = materialized.pruned_dirs;
    }
    summary
  }
}

/// Execute the build command.
///
/// Returns an error after printing the summary when the build failed, so the
/// process exits non-zero.
pub fn cmd_build(args: &BuildArgs) -> Result<()> {
  let start = Instant::now();

  let ctx = BuildContext {
    root_dir: args.project.clone(),
    config_path: args.config.clone(),
    production: args.production,
    dry: args.dry,
    verbose: args.verbose,
    await_archives: args.await_archives,
  };

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt.block_on(build(&ctx, &LuaProjectLoader));
  let summary = BuildSummary::from_report(&report);

  if args.output.is_json() {
    print_json(&summary)?;
  } else {
    print_summary(&summary, args.dry);
    print_stat("Duration", &format_duration(start.elapsed()));
  }

  if let Some(err) = &report.error {
    if !args.output.is_json() {
      print_error(&format!("Build failed: {err}"));
    }
    bail!("build failed");
  }
  Ok(())
}

fn print_summary(summary: &BuildSummary, dry: bool) {
  println!();
  if !summary.success {
    return;
  }

  let name = summary.project.as_deref().unwrap_or("project");
  if dry {
    print_info(&format!("Dry run of {name} - no files written"));
    print_stat("Files", &summary.dry_run_files.len().to_string());
    for path in &summary.dry_run_files {
      print_item(path);
    }
    return;
  }

  print_success(&format!("Built {name}"));
  print_stat("Files written", &summary.files_written.to_string());
  print_stat("Files excluded", &summary.files_excluded.to_string());
  print_stat("Resources copied", &summary.resources_copied.to_string());
  if summary.resources_skipped > 0 {
    print_warning(&format!(
      "{} resource file(s) could not be copied",
      summary.resources_skipped
    ));
  }
  print_stat("Archives", &summary.archives.len().to_string());
  for path in &summary.archives {
    print_item(path);
  }
  print_stat("Empty directories removed", &summary.pruned_dirs.to_string());
}
