use predicates::prelude::*;

use super::common::TestEnv;

const CONFIG: &str = r#"
return {
  name = "demo",
  saveOptions = {
    resources = {
      exclude = {
        generated = { "datapack/**/*.tmp" },
        existing = { "datapack/notes" },
      },
      handle = {
        { path = "**/*.mcmeta", callback = function(content) return (content:gsub("FORMAT", "48")) end },
      },
    },
  },
}
"#;

const ENTRY: &str = r#"
sandstone.emit("datapack/data/demo/function/load.mcfunction", "say " .. sandstone.name)
sandstone.emit("datapack/data/demo/function/scratch.tmp", "ignored")
return { { type = "datapack", archive = true } }
"#;

fn demo_project() -> TestEnv {
  let env = TestEnv::project(CONFIG, ENTRY);
  env.write_file("resources/datapack/pack.mcmeta", r#"{"pack":{"pack_format":FORMAT}}"#);
  env.write_file("resources/datapack/notes/todo.md", "internal");
  env
}

#[test]
fn build_writes_generated_files_and_resources() {
  let env = demo_project();

  env
    .sand_cmd()
    .arg("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("Built demo"));

  assert_eq!(
    env.output_files(),
    vec![
      "archives/demo_datapack.zip",
      "datapack/data/demo/function/load.mcfunction",
      "datapack/pack.mcmeta",
    ]
  );
  assert_eq!(
    env.read_output("datapack/data/demo/function/load.mcfunction"),
    "say demo"
  );
  assert_eq!(
    env.read_output("datapack/pack.mcmeta"),
    r#"{"pack":{"pack_format":48}}"#
  );
}

#[test]
fn production_build_finishes_archives_before_exit() {
  let env = TestEnv::project(
    r#"return { name = "prod" }"#,
    r#"
      sandstone.emit("datapack/a.txt", tostring(sandstone.production))
      sandstone.emit("resourcepack/b.txt", "b")
      return {
        { type = "datapack", archive = true },
        { type = "resourcepack", archive = true },
      }
    "#,
  );

  env.sand_cmd().args(["build", "--production"]).assert().success();

  assert_eq!(env.read_output("datapack/a.txt"), "true");
  assert!(env.output_path().join("archives/prod_datapack.zip").is_file());
  assert!(env.output_path().join("archives/prod_resourcepack.zip").is_file());
}

#[test]
fn dry_run_writes_nothing() {
  let env = demo_project();

  env
    .sand_cmd()
    .args(["build", "--dry"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Dry run"))
    .stdout(predicate::str::contains("datapack/data/demo/function/load.mcfunction"))
    .stdout(predicate::str::contains("scratch.tmp").not());

  assert!(!env.root().join(".sandstone").exists());
}

#[test]
fn json_output_reports_counts() {
  let env = demo_project();

  env
    .sand_cmd()
    .args(["build", "-o", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains(r#""files_written": 1"#))
    .stdout(predicate::str::contains(r#""files_excluded": 1"#))
    .stdout(predicate::str::contains(r#""resources_copied": 1"#));
}

#[test]
fn hooks_run_around_the_build() {
  let env = TestEnv::project(
    r#"
      local function mark(name)
        local file = assert(io.open(sandstone.root .. "/" .. name, "w"))
        file:write(name)
        file:close()
      end
      return {
        name = "hooks",
        scripts = {
          beforeAll = function() mark("before_all.txt") end,
          afterAll = function() mark("after_all.txt") end,
        },
      }
    "#,
    "return nil",
  );

  env.sand_cmd().arg("build").assert().success();

  assert!(env.root().join("before_all.txt").is_file());
  assert!(env.root().join("after_all.txt").is_file());
}

#[test]
fn failing_hook_fails_the_build() {
  let env = TestEnv::project(
    r#"return { name = "x", scripts = { beforeSave = function() error("not today") end } }"#,
    r#"sandstone.emit("datapack/a.txt", "a") return { "datapack" }"#,
  );

  env
    .sand_cmd()
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("beforeSave script failed"));

  assert!(env.output_files().is_empty());
}

#[test]
fn fully_excluded_pack_type_leaves_no_directory() {
  let env = TestEnv::project(
    r#"
      return {
        name = "prune",
        saveOptions = { resources = { exclude = { generated = { "beta/**" }, existing = { "beta/**" } } } },
      }
    "#,
    r#"
      sandstone.emit("alpha/keep.txt", "keep")
      sandstone.emit("beta/drop.txt", "drop")
      return { "alpha", "beta" }
    "#,
  );
  env.write_file("resources/beta/nested/file.txt", "existing");

  env.sand_cmd().arg("build").assert().success();

  assert_eq!(env.output_files(), vec!["alpha/keep.txt"]);
  assert!(!env.output_path().join("beta").exists());
}

#[test]
fn binary_resources_are_copied_verbatim() {
  let env = TestEnv::project(r#"return { name = "bin" }"#, r#"return { "resourcepack" }"#);
  let png = [0x89u8, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0xff, 0x00];
  env.write_file("resources/resourcepack/pack.png", png);

  env.sand_cmd().arg("build").assert().success();

  let copied = std::fs::read(env.output_path().join("resourcepack/pack.png")).unwrap();
  assert_eq!(copied, png);
}

#[test]
fn config_flag_selects_another_file() {
  let env = TestEnv::empty();
  env.write_file("configs/alt.lua", r#"return { name = "alt", entry = "gen.lua" }"#);
  env.write_file("gen.lua", r#"sandstone.emit("datapack/alt.txt", "alt") return { "datapack" }"#);

  env
    .sand_cmd()
    .args(["build", "--config", "configs/alt.lua"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Built alt"));

  assert_eq!(env.read_output("datapack/alt.txt"), "alt");
}

#[test]
fn rebuild_keeps_previous_output() {
  let env = TestEnv::project(
    r#"return { name = "again" }"#,
    r#"sandstone.emit("datapack/a.txt", "a") return { "datapack" }"#,
  );
  env.sand_cmd().arg("build").assert().success();

  env.write_file("src/main.lua", r#"sandstone.emit("datapack/b.txt", "b") return { "datapack" }"#);
  env.sand_cmd().arg("build").assert().success();

  assert_eq!(env.output_files(), vec!["datapack/a.txt", "datapack/b.txt"]);
}
