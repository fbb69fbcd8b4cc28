//! `DiskStore` behavior against the real filesystem.

use std::sync::Arc;

use futures::StreamExt;

use sandstone_lib::store::{Content, DiskStore, Encoding, EntryKind, SharedStore, Store};
use sandstone_lib::walk::{WalkOptions, collect_files, walk};

use super::common::{files_under, project, write};

#[tokio::test]
async fn sees_files_written_outside_the_store() {
  let temp = project(&[("resources/datapack/pack.mcmeta", "{}")]);
  let store = DiskStore::new(temp.path());

  assert_eq!(store.stat("resources/datapack").await.unwrap(), EntryKind::Dir);
  assert_eq!(
    store
      .read_file("resources/datapack/pack.mcmeta", Encoding::Utf8)
      .await
      .unwrap(),
    Content::from("{}")
  );
}

#[tokio::test]
async fn writes_create_real_directories() {
  let temp = project(&[]);
  let store = DiskStore::new(temp.path());

  store
    .write_file("out/datapack/data/ns/a.json", Content::from("[]"))
    .await
    .unwrap();

  assert_eq!(files_under(temp.path()), vec!["out/datapack/data/ns/a.json"]);
}

#[tokio::test]
async fn walk_prunes_rejected_directories_on_disk() {
  let temp = project(&[
    ("a/b/file1", "1"),
    ("a/c/file2", "2"),
    ("a/c/deeper/file3", "3"),
  ]);
  let store: SharedStore = Arc::new(DiskStore::new(temp.path()));

  let options = WalkOptions::with_filter(|path| !path.contains("/b"));
  let files = collect_files(walk(store, "a", options).await.unwrap()).await.unwrap();
  let mut paths: Vec<String> = files.iter().map(|entry| entry.path().to_string()).collect();
  paths.sort();

  assert_eq!(paths, vec!["a/c/deeper/file3", "a/c/file2"]);
}

#[tokio::test]
async fn walk_reads_content_lazily() {
  let temp = project(&[("r/one.txt", "first")]);
  let store: SharedStore = Arc::new(DiskStore::new(temp.path()));

  let mut files = walk(store, "r", WalkOptions::default()).await.unwrap();
  let entry = files.next().await.unwrap().unwrap();
  std::fs::write(temp.path().join("r/one.txt"), "changed").unwrap();

  assert_eq!(entry.read(Encoding::Utf8).await.unwrap(), Content::from("changed"));
  assert!(files.next().await.is_none());
}

#[tokio::test]
async fn remove_dispatches_on_kind() {
  let temp = project(&[("d/f.txt", "f"), ("d/sub/g.txt", "g"), ("keep.txt", "k")]);
  let store = DiskStore::new(temp.path());

  store.remove("d/f.txt").await.unwrap();
  assert!(!temp.path().join("d/f.txt").exists());
  assert!(temp.path().join("d/sub").is_dir());

  store.remove("d").await.unwrap();
  assert!(!temp.path().join("d").exists());

  let err = store.remove("d").await.unwrap_err();
  assert!(err.is_not_found());
  assert_eq!(files_under(temp.path()), vec!["keep.txt"]);
}

#[tokio::test]
async fn file_in_directory_chain_is_a_kind_mismatch() {
  let temp = project(&[]);
  write(temp.path(), "blocker", b"x");
  let store = DiskStore::new(temp.path());

  let err = store
    .write_file("blocker/inner.txt", Content::from("y"))
    .await
    .unwrap_err();

  assert!(err.is_kind_mismatch(), "{err}");
  assert!(!store.path_exists("blocker/inner.txt").await);
}
