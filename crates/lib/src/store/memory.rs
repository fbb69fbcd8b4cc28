//! In-memory store.
//!
//! The virtual backend: a tree of owned child maps. Parents own their children
//! outright and every lookup starts at the root, so no back references are
//! needed.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::path::LogicalPath;
use super::types::{Content, DirEntry, DirRef, EntryKind, StoreError};
use super::Store;

type Children = BTreeMap<String, Node>;

#[derive(Debug)]
enum Node {
  File(Vec<u8>),
  Dir(Children),
}

impl Node {
  fn kind(&self) -> EntryKind {
    match self {
      Node::File(_) => EntryKind::File,
      Node::Dir(_) => EntryKind::Dir,
    }
  }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
  root: RwLock<Children>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

/// Follow the first `depth` segments of `path`, each of which must be a directory.
fn dir_at<'a>(root: &'a Children, path: &LogicalPath, depth: usize) -> Result<&'a Children, StoreError> {
  let mut dir = root;
  for (index, segment) in path.segments()[..depth].iter().enumerate() {
    dir = match dir.get(segment) {
      Some(Node::Dir(children)) => children,
      Some(Node::File(_)) => return Err(StoreError::kind_mismatch(path, index + 1, EntryKind::Dir)),
      None => return Err(StoreError::not_found(path, index + 1)),
    };
  }
  Ok(dir)
}

/// Mutable variant of [`dir_at`], optionally creating missing directories.
fn dir_at_mut<'a>(
  root: &'a mut Children,
  path: &LogicalPath,
  depth: usize,
  create: bool,
) -> Result<&'a mut Children, StoreError> {
  let mut dir = root;
  for (index, segment) in path.segments()[..depth].iter().enumerate() {
    let node = if create {
      dir
        .entry(segment.clone())
        .or_insert_with(|| Node::Dir(Children::new()))
    } else {
      dir
        .get_mut(segment)
        .ok_or_else(|| StoreError::not_found(path, index + 1))?
    };
    dir = match node {
      Node::Dir(children) => children,
      Node::File(_) => return Err(StoreError::kind_mismatch(path, index + 1, EntryKind::Dir)),
    };
  }
  Ok(dir)
}

#[async_trait]
impl Store for MemoryStore {
  async fn kind_of(&self, path: &LogicalPath) -> Result<EntryKind, StoreError> {
    let root = self.root.read().await;
    let parent = dir_at(&root, path, path.len() - 1)?;
    parent
      .get(path.leaf())
      .map(Node::kind)
      .ok_or_else(|| StoreError::not_found(path, path.len()))
  }

  async fn create_dir_all(&self, path: &LogicalPath) -> Result<DirRef, StoreError> {
    let mut root = self.root.write().await;
    dir_at_mut(&mut root, path, path.len(), true)?;
    Ok(DirRef::new(path.clone()))
  }

  async fn write(&self, path: &LogicalPath, content: Content) -> Result<(), StoreError> {
    let mut root = self.root.write().await;
    let parent = dir_at_mut(&mut root, path, path.len() - 1, true)?;
    if let Some(Node::Dir(_)) = parent.get(path.leaf()) {
      return Err(StoreError::kind_mismatch(path, path.len(), EntryKind::File));
    }
    parent.insert(path.leaf().to_string(), Node::File(content.into_bytes()));
    Ok(())
  }

  async fn read(&self, path: &LogicalPath) -> Result<Vec<u8>, StoreError> {
    let root = self.root.read().await;
    let parent = dir_at(&root, path, path.len() - 1)?;
    match parent.get(path.leaf()) {
      Some(Node::File(bytes)) => Ok(bytes.clone()),
      Some(Node::Dir(_)) => Err(StoreError::kind_mismatch(path, path.len(), EntryKind::File)),
      None => Err(StoreError::not_found(path, path.len())),
    }
  }

  async fn list(&self, path: &LogicalPath) -> Result<Vec<DirEntry>, StoreError> {
    let root = self.root.read().await;
    let dir = dir_at(&root, path, path.len())?;
    Ok(
      dir
        .iter()
        .map(|(name, node)| DirEntry {
          name: name.clone(),
          kind: node.kind(),
        })
        .collect(),
    )
  }

  async fn remove_file(&self, path: &LogicalPath) -> Result<(), StoreError> {
    let mut root = self.root.write().await;
    let parent = dir_at_mut(&mut root, path, path.len() - 1, false)?;
    match parent.get(path.leaf()) {
      Some(Node::File(_)) => {
        parent.remove(path.leaf());
        Ok(())
      }
      Some(Node::Dir(_)) => Err(StoreError::kind_mismatch(path, path.len(), EntryKind::File)),
      None => Err(StoreError::not_found(path, path.len())),
    }
  }

  async fn remove_dir_all(&self, path: &LogicalPath) -> Result<(), StoreError> {
    let mut root = self.root.write().await;
    let parent = dir_at_mut(&mut root, path, path.len() - 1, false)?;
    match parent.get(path.leaf()) {
      Some(Node::Dir(_)) => {
        parent.remove(path.leaf());
        Ok(())
      }
      Some(Node::File(_)) => Err(StoreError::kind_mismatch(path, path.len(), EntryKind::Dir)),
      None => Err(StoreError::not_found(path, path.len())),
    }
  }
}
