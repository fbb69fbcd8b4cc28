//! Hierarchical stores.
//!
//! A store is a tree of named directories and files reachable from a root.
//! Everything above this module (walker, materializer, build pipeline) talks
//! to the [`Store`] trait only, so the in-memory and on-disk backends are
//! interchangeable.
//!
//! # Layout
//!
//! ```text
//! store/
//! ├── path.rs     # LogicalPath: directory chain + leaf
//! ├── types.rs    # Content, handles, StoreError
//! ├── memory.rs   # MemoryStore: owned in-memory tree
//! └── disk.rs     # DiskStore: rooted at a real directory
//! ```
//!
//! Backends implement the primitive operations over parsed [`LogicalPath`]s.
//! The string-addressed operations used by callers are provided methods on
//! top of them.

pub mod disk;
pub mod memory;
pub mod path;
pub mod types;

#[cfg(test)]
pub(crate) mod conformance;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

pub use disk::DiskStore;
pub use memory::MemoryStore;
pub use path::LogicalPath;
pub use types::{Content, DirEntry, DirRef, Encoding, EntryKind, FileRef, StoreError};

/// Shared handle to a store backend.
pub type SharedStore = Arc<dyn Store>;

#[async_trait]
pub trait Store: Send + Sync + fmt::Debug {
  /// Kind of the node at `path`, without creating anything.
  ///
  /// Fails with `NotFound` naming the first missing segment, or with
  /// `KindMismatch` when a file sits where the directory chain needs a
  /// directory.
  async fn kind_of(&self, path: &LogicalPath) -> Result<EntryKind, StoreError>;

  /// Create every segment of `path` as a directory.
  async fn create_dir_all(&self, path: &LogicalPath) -> Result<DirRef, StoreError>;

  /// Create the directory chain and overwrite the leaf file.
  async fn write(&self, path: &LogicalPath, content: Content) -> Result<(), StoreError>;

  /// Read the leaf file's bytes.
  async fn read(&self, path: &LogicalPath) -> Result<Vec<u8>, StoreError>;

  /// Direct children of the directory at `path`.
  async fn list(&self, path: &LogicalPath) -> Result<Vec<DirEntry>, StoreError>;

  async fn remove_file(&self, path: &LogicalPath) -> Result<(), StoreError>;

  async fn remove_dir_all(&self, path: &LogicalPath) -> Result<(), StoreError>;

  /// Whether anything exists at `path`. Never fails.
  async fn path_exists(&self, path: &str) -> bool {
    match LogicalPath::parse(path) {
      Ok(path) => self.kind_of(&path).await.is_ok(),
      Err(_) => false,
    }
  }

  async fn stat(&self, path: &str) -> Result<EntryKind, StoreError> {
    self.kind_of(&LogicalPath::parse(path)?).await
  }

  async fn ensure_dir(&self, path: &str) -> Result<DirRef, StoreError> {
    self.create_dir_all(&LogicalPath::parse(path)?).await
  }

  async fn write_file(&self, path: &str, content: Content) -> Result<(), StoreError> {
    self.write(&LogicalPath::parse(path)?, content).await
  }

  async fn read_file(&self, path: &str, encoding: Encoding) -> Result<Content, StoreError> {
    let path = LogicalPath::parse(path)?;
    let bytes = self.read(&path).await?;
    Content::decode(bytes, encoding, &path)
  }

  /// Read through a handle obtained from a traversal, skipping path parsing.
  async fn read_entry(&self, file: &FileRef, encoding: Encoding) -> Result<Content, StoreError> {
    let bytes = self.read(file.path()).await?;
    Content::decode(bytes, encoding, file.path())
  }

  async fn readdir(&self, path: &str) -> Result<Vec<String>, StoreError> {
    let entries = self.list(&LogicalPath::parse(path)?).await?;
    Ok(entries.into_iter().map(|entry| entry.name).collect())
  }

  async fn entries(&self, path: &str) -> Result<Vec<DirEntry>, StoreError> {
    self.list(&LogicalPath::parse(path)?).await
  }

  /// Remove a file, or a directory and everything below it.
  ///
  /// The kind is probed first, so a failure inside the directory chain is
  /// reported as-is instead of being retried as the other kind.
  async fn remove(&self, path: &str) -> Result<(), StoreError> {
    let path = LogicalPath::parse(path)?;
    match self.kind_of(&path).await? {
      EntryKind::File => self.remove_file(&path).await,
      EntryKind::Dir => self.remove_dir_all(&path).await,
    }
  }
}
