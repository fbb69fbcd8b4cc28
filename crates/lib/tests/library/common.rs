//! Shared helpers for library integration tests.

use std::path::Path;

use tempfile::TempDir;
use walkdir::WalkDir;

use sandstone_lib::build::BuildContext;

/// Create a project directory from `(relative path, content)` pairs.
pub fn project(files: &[(&str, &str)]) -> TempDir {
  let temp = TempDir::new().unwrap();
  for (path, content) in files {
    write(temp.path(), path, content.as_bytes());
  }
  temp
}

pub fn write(root: &Path, relative_path: &str, content: &[u8]) {
  let path = root.join(relative_path);
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(path, content).unwrap();
}

pub fn context(root: &Path) -> BuildContext {
  BuildContext {
    root_dir: root.to_path_buf(),
    ..Default::default()
  }
}

/// Files below `root`, relative to it with `/` separators, sorted.
pub fn files_under(root: &Path) -> Vec<String> {
  if !root.exists() {
    return Vec::new();
  }
  let mut files: Vec<String> = WalkDir::new(root)
    .into_iter()
    .filter_map(Result::ok)
    .filter(|entry| entry.file_type().is_file())
    .map(|entry| {
      entry
        .path()
        .strip_prefix(root)
        .unwrap()
        .to_string_lossy()
        .replace('\\', "/")
    })
    .collect();
  files.sort();
  files
}
