//! On-disk store rooted at a real directory.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::path::LogicalPath;
use super::types::{Content, DirEntry, DirRef, EntryKind, StoreError};
use super::Store;

/// Store backed by the local filesystem.
///
/// Logical paths are resolved below `base`. The base directory is created and
/// canonicalized on first use and the result is kept for the lifetime of the
/// store.
#[derive(Debug)]
pub struct DiskStore {
  base: PathBuf,
  root: OnceCell<PathBuf>,
}

impl DiskStore {
  pub fn new(base: impl Into<PathBuf>) -> Self {
    Self {
      base: base.into(),
      root: OnceCell::new(),
    }
  }

  /// The directory this store was created for, as given.
  pub fn base(&self) -> &Path {
    &self.base
  }

  /// The resolved root directory, creating it on first call.
  pub async fn root(&self) -> Result<&Path, StoreError> {
    let root = self
      .root
      .get_or_try_init(|| async {
        fs::create_dir_all(&self.base)
          .await
          .map_err(|e| StoreError::io(self.base.display(), e))?;
        let resolved = dunce::canonicalize(&self.base).map_err(|e| StoreError::io(self.base.display(), e))?;
        debug!(root = %resolved.display(), "resolved store root");
        Ok::<_, StoreError>(resolved)
      })
      .await?;
    Ok(root.as_path())
  }

  /// Native path of a logical path, without touching the filesystem beyond the root.
  pub async fn native_path(&self, path: &LogicalPath) -> Result<PathBuf, StoreError> {
    Ok(self.root().await?.join(path.to_native()))
  }

  /// Walk the first `depth` segments, checking that each one is a directory.
  async fn resolve_dirs(&self, path: &LogicalPath, depth: usize, create: bool) -> Result<PathBuf, StoreError> {
    let mut current = self.root().await?.to_path_buf();
    for (index, segment) in path.segments()[..depth].iter().enumerate() {
      current.push(segment);
      match fs::metadata(&current).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(StoreError::kind_mismatch(path, index + 1, EntryKind::Dir)),
        Err(e) if e.kind() == io::ErrorKind::NotFound && create => match fs::create_dir(&current).await {
          Ok(()) => {}
          Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
          Err(e) => return Err(StoreError::io(current.display(), e)),
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(StoreError::not_found(path, index + 1)),
        Err(e) => return Err(StoreError::io(current.display(), e)),
      }
    }
    Ok(current)
  }

  /// Resolve the directory chain and probe the leaf.
  async fn resolve_leaf(&self, path: &LogicalPath) -> Result<(PathBuf, EntryKind), StoreError> {
    let leaf = self.resolve_dirs(path, path.len() - 1, false).await?.join(path.leaf());
    match fs::metadata(&leaf).await {
      Ok(meta) if meta.is_dir() => Ok((leaf, EntryKind::Dir)),
      Ok(_) => Ok((leaf, EntryKind::File)),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::not_found(path, path.len())),
      Err(e) => Err(StoreError::io(leaf.display(), e)),
    }
  }

  async fn expect_leaf(&self, path: &LogicalPath, expected: EntryKind) -> Result<PathBuf, StoreError> {
    let (leaf, kind) = self.resolve_leaf(path).await?;
    if kind != expected {
      return Err(StoreError::kind_mismatch(path, path.len(), expected));
    }
    Ok(leaf)
  }
}

#[async_trait]
impl Store for DiskStore {
  async fn kind_of(&self, path: &LogicalPath) -> Result<EntryKind, StoreError> {
    let (_, kind) = self.resolve_leaf(path).await?;
    Ok(kind)
  }

  async fn create_dir_all(&self, path: &LogicalPath) -> Result<DirRef, StoreError> {
    self.resolve_dirs(path, path.len(), true).await?;
    Ok(DirRef::new(path.clone()))
  }

  /// Writes go to a uniquely named temp file in the leaf's directory that is
  /// renamed over the leaf. Readers never observe a partially written file.
  async fn write(&self, path: &LogicalPath, content: Content) -> Result<(), StoreError> {
    let parent = self.resolve_dirs(path, path.len() - 1, true).await?;
    let leaf = parent.join(path.leaf());

    if fs::metadata(&leaf).await.is_ok_and(|meta| meta.is_dir()) {
      return Err(StoreError::kind_mismatch(path, path.len(), EntryKind::File));
    }

    let bytes = content.into_bytes();
    let target = leaf.clone();
    tokio::task::spawn_blocking(move || persist_atomic(&parent, &target, &bytes))
      .await
      .map_err(|e| StoreError::io(leaf.display(), io::Error::other(e)))?
      .map_err(|e| StoreError::io(leaf.display(), e))
  }

  async fn read(&self, path: &LogicalPath) -> Result<Vec<u8>, StoreError> {
    let leaf = self.expect_leaf(path, EntryKind::File).await?;
    fs::read(&leaf).await.map_err(|e| StoreError::io(leaf.display(), e))
  }

  async fn list(&self, path: &LogicalPath) -> Result<Vec<DirEntry>, StoreError> {
    let dir = self.resolve_dirs(path, path.len(), false).await?;
    let mut reader = fs::read_dir(&dir).await.map_err(|e| StoreError::io(dir.display(), e))?;

    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await.map_err(|e| StoreError::io(dir.display(), e))? {
      let name = match entry.file_name().into_string() {
        Ok(name) => name,
        Err(raw) => {
          warn!(dir = %dir.display(), name = ?raw, "skipping entry with non UTF-8 name");
          continue;
        }
      };
      let file_type = entry
        .file_type()
        .await
        .map_err(|e| StoreError::io(entry.path().display(), e))?;
      let is_dir = if file_type.is_symlink() {
        fs::metadata(entry.path()).await.map(|meta| meta.is_dir()).unwrap_or(false)
      } else {
        file_type.is_dir()
      };
      let kind = if is_dir { EntryKind::Dir } else { EntryKind::File };
      entries.push(DirEntry { name, kind });
    }
    Ok(entries)
  }

  async fn remove_file(&self, path: &LogicalPath) -> Result<(), StoreError> {
    let leaf = self.expect_leaf(path, EntryKind::File).await?;
    fs::remove_file(&leaf)
      .await
      .map_err(|e| StoreError::io(leaf.display(), e))
  }

  async fn remove_dir_all(&self, path: &LogicalPath) -> Result<(), StoreError> {
    let leaf = self.expect_leaf(path, EntryKind::Dir).await?;
    fs::remove_dir_all(&leaf)
      .await
      .map_err(|e| StoreError::io(leaf.display(), e))
  }
}

/// Write `bytes` to a fresh temp file in `dir`, then rename it onto `target`.
/// The temp file is removed if anything fails before the rename.
fn persist_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> io::Result<()> {
  let mut temp = tempfile::Builder::new()
    .prefix(".sandstone-")
    .suffix(".tmp")
    .tempfile_in(dir)?;
  temp.write_all(bytes)?;
  temp.persist(target).map_err(|e| e.error)?;
  Ok(())
}
