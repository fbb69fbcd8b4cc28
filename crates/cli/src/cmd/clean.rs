//! Implementation of the `sand clean` command.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use sandstone_lib::consts::OUTPUT_ROOT;
use sandstone_lib::store::{DiskStore, Store};

use crate::output::{print_info, print_success};

/// Remove the project's output tree, archives included.
pub fn cmd_clean(project: &Path) -> Result<()> {
  let store = DiskStore::new(project);

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  rt.block_on(async {
    if !store.path_exists(OUTPUT_ROOT).await {
      print_info("Nothing to clean");
      return Ok(());
    }
    store
      .remove(OUTPUT_ROOT)
      .await
      .with_context(|| format!("Failed to remove {OUTPUT_ROOT}"))?;
    info!(path = OUTPUT_ROOT, "output removed");
    print_success(&format!("Removed {OUTPUT_ROOT}"));
    Ok(())
  })
}
