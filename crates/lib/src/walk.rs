//! Lazy depth-first traversal over a store subtree.
//!
//! [`walk`] resolves the root directory eagerly and then yields file entries
//! as the consumer polls. Directories are listed only when the walk reaches
//! them, so a filter that rejects a directory prunes it without ever listing
//! its contents. Entries carry a deferred reader; content is only loaded when
//! [`WalkEntry::read`] is called.

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::stream::{BoxStream, Stream, StreamExt};
use tracing::trace;

use crate::store::{Content, DirEntry, Encoding, EntryKind, FileRef, LogicalPath, SharedStore, StoreError};

/// Predicate over full logical paths; returning `false` skips the entry and,
/// for directories, everything below it.
pub type WalkFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

#[derive(Clone, Default)]
pub struct WalkOptions {
  pub filter: Option<WalkFilter>,
}

impl WalkOptions {
  pub fn with_filter(filter: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
    Self {
      filter: Some(Arc::new(filter)),
    }
  }
}

impl fmt::Debug for WalkOptions {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("WalkOptions")
      .field("filter", &self.filter.is_some())
      .finish()
  }
}

/// A file found by the walk.
#[derive(Debug, Clone)]
pub struct WalkEntry {
  store: SharedStore,
  file: FileRef,
}

impl WalkEntry {
  pub fn path(&self) -> &LogicalPath {
    self.file.path()
  }

  pub fn file(&self) -> &FileRef {
    &self.file
  }

  /// Load the file's content through the store it was found in.
  pub async fn read(&self, encoding: Encoding) -> Result<Content, StoreError> {
    self.store.read_entry(&self.file, encoding).await
  }
}

/// One directory's children, snapshotted when the directory was reached.
struct Frame {
  path: LogicalPath,
  pending: VecDeque<DirEntry>,
}

struct WalkState {
  store: SharedStore,
  filter: Option<WalkFilter>,
  stack: Vec<Frame>,
}

impl WalkState {
  fn accepts(&self, path: &LogicalPath) -> bool {
    match &self.filter {
      Some(filter) => filter(&path.to_string()),
      None => true,
    }
  }

  /// Advance to the next file, descending into directories as they come up.
  async fn next_entry(&mut self) -> Option<Result<WalkEntry, StoreError>> {
    loop {
      let frame = self.stack.last_mut()?;
      let Some(child) = frame.pending.pop_front() else {
        self.stack.pop();
        continue;
      };

      let path = match frame.path.join(&child.name) {
        Ok(path) => path,
        Err(e) => return Some(Err(e)),
      };
      if !self.accepts(&path) {
        trace!(path = %path, "walk filter rejected entry");
        continue;
      }

      match child.kind {
        EntryKind::File => {
          return Some(Ok(WalkEntry {
            store: self.store.clone(),
            file: FileRef::new(path),
          }));
        }
        EntryKind::Dir => match self.store.list(&path).await {
          Ok(children) => self.stack.push(Frame {
            path,
            pending: children.into(),
          }),
          Err(e) => return Some(Err(e)),
        },
      }
    }
  }
}

/// Stream of files below a directory, see [`walk`].
pub struct Walk {
  inner: BoxStream<'static, Result<WalkEntry, StoreError>>,
}

impl Stream for Walk {
  type Item = Result<WalkEntry, StoreError>;

  fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    self.inner.poll_next_unpin(cx)
  }
}

/// Start a walk over the directory at `root`.
///
/// Fails immediately if `root` is missing or not a directory. Errors hit while
/// listing nested directories are yielded in place and the walk carries on
/// with the remaining siblings.
pub async fn walk(store: SharedStore, root: &str, options: WalkOptions) -> Result<Walk, StoreError> {
  let root = LogicalPath::parse(root)?;
  let children = store.list(&root).await?;

  let state = WalkState {
    store,
    filter: options.filter,
    stack: vec![Frame {
      path: root,
      pending: children.into(),
    }],
  };

  let inner = futures::stream::unfold(state, |mut state| async move {
    let item = state.next_entry().await?;
    Some((item, state))
  })
  .boxed();

  Ok(Walk { inner })
}

/// Drain a walk, failing on the first error.
pub async fn collect_files(mut walk: Walk) -> Result<Vec<WalkEntry>, StoreError> {
  let mut files = Vec::new();
  while let Some(entry) = walk.next().await {
    files.push(entry?);
  }
  Ok(files)
}
