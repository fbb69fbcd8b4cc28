//! Behaviour every store backend must share.
//!
//! Each backend's test module calls [`run_all`] with a fresh, empty store.

use std::sync::Arc;

use super::{Content, Encoding, EntryKind, Store, StoreError};

pub(crate) async fn run_all(store: Arc<dyn Store>) {
  text_round_trip(&*store).await;
  bytes_round_trip(&*store).await;
  write_overwrites(&*store).await;
  ensure_dir_is_idempotent(&*store).await;
  ensure_dir_names_conflicting_segment(&*store).await;
  path_exists_never_fails(&*store).await;
  read_missing_and_directories(&*store).await;
  readdir_lists_direct_children(&*store).await;
  remove_file_only(&*store).await;
  remove_directory_recursively(&*store).await;
  remove_missing_is_not_found(&*store).await;
  remove_keeps_mid_chain_errors(&*store).await;
  read_entry_uses_handle(&*store).await;
}

async fn text_round_trip(store: &dyn Store) {
  store
    .write_file("rt/text/data.json", Content::from("{\"a\": 1}"))
    .await
    .unwrap();
  let read = store.read_file("rt/text/data.json", Encoding::Utf8).await.unwrap();
  assert_eq!(read, Content::from("{\"a\": 1}"));
}

async fn bytes_round_trip(store: &dyn Store) {
  let bytes: Vec<u8> = (0..=255).collect();
  store
    .write_file("rt/bytes/all.bin", Content::from(bytes.clone()))
    .await
    .unwrap();
  let read = store.read_file("rt/bytes/all.bin", Encoding::Binary).await.unwrap();
  assert_eq!(read, Content::Bytes(bytes));

  // Invalid UTF-8 cannot be handed back as text.
  let err = store.read_file("rt/bytes/all.bin", Encoding::Utf8).await.unwrap_err();
  assert!(matches!(err, StoreError::InvalidUtf8 { .. }));
}

async fn write_overwrites(store: &dyn Store) {
  store.write_file("ow/file.txt", "a longer first value".into()).await.unwrap();
  store.write_file("ow/file.txt", "short".into()).await.unwrap();
  let read = store.read_file("ow/file.txt", Encoding::Utf8).await.unwrap();
  assert_eq!(read, Content::from("short"));
}

async fn ensure_dir_is_idempotent(store: &dyn Store) {
  let first = store.ensure_dir("idem/a/b").await.unwrap();
  let second = store.ensure_dir("idem/a/b").await.unwrap();
  assert_eq!(first, second);
  assert_eq!(store.stat("idem/a/b").await.unwrap(), EntryKind::Dir);
}

async fn ensure_dir_names_conflicting_segment(store: &dyn Store) {
  store.write_file("conflict/file", "x".into()).await.unwrap();
  let err = store.ensure_dir("conflict/file/sub").await.unwrap_err();
  match err {
    StoreError::KindMismatch { segment, expected, .. } => {
      assert_eq!(segment, "conflict/file");
      assert_eq!(expected, EntryKind::Dir);
    }
    other => panic!("expected KindMismatch, got {other}"),
  }

  // Writing a file over a directory is a mismatch too.
  store.ensure_dir("conflict/dir").await.unwrap();
  let err = store.write_file("conflict/dir", "x".into()).await.unwrap_err();
  assert!(err.is_kind_mismatch());
}

async fn path_exists_never_fails(store: &dyn Store) {
  store.write_file("exists/here.txt", "x".into()).await.unwrap();
  assert!(store.path_exists("exists/here.txt").await);
  assert!(store.path_exists("exists").await);
  assert!(!store.path_exists("exists/missing.txt").await);
  assert!(!store.path_exists("nope/deeper/still").await);
  assert!(!store.path_exists("exists/here.txt/below").await);
  for malformed in ["", "/", "a//b", "../x", "trailing/"] {
    assert!(!store.path_exists(malformed).await, "{malformed:?}");
  }
}

async fn read_missing_and_directories(store: &dyn Store) {
  let err = store.read_file("missing/dir/file.txt", Encoding::Utf8).await.unwrap_err();
  match err {
    StoreError::NotFound { segment, .. } => assert_eq!(segment, "missing"),
    other => panic!("expected NotFound, got {other}"),
  }

  store.ensure_dir("readdir_kind/sub").await.unwrap();
  let err = store.read_file("readdir_kind/sub", Encoding::Utf8).await.unwrap_err();
  assert!(err.is_kind_mismatch());
}

async fn readdir_lists_direct_children(store: &dyn Store) {
  store.write_file("ls/one.txt", "1".into()).await.unwrap();
  store.write_file("ls/nested/two.txt", "2".into()).await.unwrap();

  let mut names = store.readdir("ls").await.unwrap();
  names.sort();
  assert_eq!(names, vec!["nested", "one.txt"]);

  let mut entries = store.entries("ls").await.unwrap();
  entries.sort_by(|a, b| a.name.cmp(&b.name));
  assert_eq!(entries[0].kind, EntryKind::Dir);
  assert_eq!(entries[1].kind, EntryKind::File);

  assert!(store.readdir("ls/absent").await.unwrap_err().is_not_found());
}

async fn remove_file_only(store: &dyn Store) {
  store.write_file("rmf/keep.txt", "k".into()).await.unwrap();
  store.write_file("rmf/drop.txt", "d".into()).await.unwrap();

  store.remove("rmf/drop.txt").await.unwrap();

  assert!(!store.path_exists("rmf/drop.txt").await);
  assert!(store.path_exists("rmf/keep.txt").await);
  assert!(store.path_exists("rmf").await);
}

async fn remove_directory_recursively(store: &dyn Store) {
  store.write_file("rmd/tree/a/b/c.txt", "c".into()).await.unwrap();
  store.write_file("rmd/tree/d.txt", "d".into()).await.unwrap();
  store.write_file("rmd/other.txt", "o".into()).await.unwrap();

  store.remove("rmd/tree").await.unwrap();

  assert!(!store.path_exists("rmd/tree").await);
  assert!(!store.path_exists("rmd/tree/a/b/c.txt").await);
  assert!(store.path_exists("rmd/other.txt").await);
}

async fn remove_missing_is_not_found(store: &dyn Store) {
  let err = store.remove("rm_missing/nothing").await.unwrap_err();
  assert!(err.is_not_found());
}

async fn remove_keeps_mid_chain_errors(store: &dyn Store) {
  store.write_file("rm_chain/file.txt", "x".into()).await.unwrap();
  let err = store.remove("rm_chain/file.txt/child").await.unwrap_err();
  assert!(err.is_kind_mismatch(), "expected KindMismatch, got {err}");
  assert!(store.path_exists("rm_chain/file.txt").await);
}

async fn read_entry_uses_handle(store: &dyn Store) {
  store.write_file("handle/x.txt", "via handle".into()).await.unwrap();
  let entries = store.entries("handle").await.unwrap();
  assert_eq!(entries.len(), 1);

  let path = super::LogicalPath::parse("handle/x.txt").unwrap();
  let file = super::FileRef::new(path);
  let read = store.read_entry(&file, Encoding::Utf8).await.unwrap();
  assert_eq!(read, Content::from("via handle"));
}
