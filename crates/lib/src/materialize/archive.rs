//! Zip archives of pack type output directories.

use std::io::{Cursor, Write};

use tracing::{debug, info};
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::types::{ArchiveOutcome, MaterializeError};
use crate::consts::ARCHIVES_DIR;
use crate::store::{Content, Encoding, LogicalPath, SharedStore};
use crate::walk::{WalkOptions, collect_files, walk};

/// File name of a pack type's archive.
pub fn archive_name(pack_name: &str, pack_type: &str) -> String {
  format!("{}_{}.zip", pack_name, pack_type)
}

/// Zip `<output_root>/<pack_type>` into `<output_root>/archives/<pack>_<type>.zip`.
///
/// Directories without any file are never archived. An existing archive is
/// overwritten.
pub async fn archive_pack(
  store: SharedStore,
  output_root: LogicalPath,
  pack_name: String,
  pack_type: String,
) -> Result<ArchiveOutcome, MaterializeError> {
  let source = output_root.join(&pack_type)?;
  if !store.path_exists(&source.to_string()).await {
    debug!(pack_type = %pack_type, "no output directory, nothing to archive");
    return Ok(ArchiveOutcome::NothingToArchive);
  }

  let entries = collect_files(walk(store.clone(), &source.to_string(), WalkOptions::default()).await?).await?;
  if entries.is_empty() {
    debug!(pack_type = %pack_type, "output directory is empty, nothing to archive");
    return Ok(ArchiveOutcome::NothingToArchive);
  }

  let mut files = Vec::with_capacity(entries.len());
  for entry in &entries {
    let name = entry
      .path()
      .strip_prefix(&source)
      .map(|relative| relative.to_string())
      .unwrap_or_else(|| entry.path().leaf().to_string());
    let content = entry.read(Encoding::Binary).await?;
    files.push((name, content.into_bytes()));
  }

  let file_count = files.len();
  let bytes = tokio::task::spawn_blocking(move || zip_files(files)).await??;

  let target = output_root
    .join(ARCHIVES_DIR)?
    .join(&archive_name(&pack_name, &pack_type))?;
  store.write(&target, Content::Bytes(bytes)).await?;

  info!(pack_type = %pack_type, path = %target, files = file_count, "archive written");
  Ok(ArchiveOutcome::Archived {
    path: target.to_string(),
    files: file_count,
  })
}

fn zip_files(files: Vec<(String, Vec<u8>)>) -> Result<Vec<u8>, zip::result::ZipError> {
  let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
  let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

  for (name, bytes) in files {
    writer.start_file(name, options)?;
    writer.write_all(&bytes)?;
  }

  Ok(writer.finish()?.into_inner())
}
