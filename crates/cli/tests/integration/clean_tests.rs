use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn clean_removes_output_and_archives() {
  let env = TestEnv::project(
    r#"return { name = "tidy" }"#,
    r#"sandstone.emit("datapack/a.txt", "a") return { { type = "datapack", archive = true } }"#,
  );
  env.write_file("resources/datapack/pack.mcmeta", "{}");
  env.sand_cmd().arg("build").assert().success();
  assert!(!env.output_files().is_empty());

  env
    .sand_cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Removed .sandstone/output"));

  assert!(!env.output_path().exists());
  assert!(env.root().join("resources/datapack/pack.mcmeta").is_file());
}

#[test]
fn clean_twice_is_fine() {
  let env = TestEnv::empty();
  env.write_file(".sandstone/output/datapack/a.txt", "a");

  env.sand_cmd().arg("clean").assert().success();
  env
    .sand_cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Nothing to clean"));
}
