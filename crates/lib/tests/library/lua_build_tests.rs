//! End-to-end builds of Lua projects through the library API.

use sandstone_lib::build::{BuildContext, BuildError, build};
use sandstone_lib::lua::LuaProjectLoader;
use sandstone_lib::materialize::ArchiveOutcome;

use super::common::{context, files_under, project};

const CONFIG: &str = r##"
return {
  name = "e2e",
  saveOptions = {
    resources = {
      exclude = { generated = { "**/*.draft" }, existing = { "datapack/wip" } },
      handle = {
        { path = "datapack/**/*.mcfunction", callback = function(content) return "# generated\n" .. content end },
      },
    },
  },
}
"##;

const ENTRY: &str = r#"
local functions = require("functions")
for name, body in pairs(functions) do
  sandstone.emit("datapack/data/e2e/function/" .. name .. ".mcfunction", body)
end
sandstone.emit("datapack/data/e2e/function/idea.draft", "not yet")
return { { type = "datapack", archive = true } }
"#;

const FUNCTIONS: &str = r#"return { load = "say loaded", tick = "say tick" }"#;

#[tokio::test]
async fn lua_project_builds_into_output_tree() {
  let temp = project(&[
    ("sandstone.lua", CONFIG),
    ("src/main.lua", ENTRY),
    ("src/functions.lua", FUNCTIONS),
    ("resources/datapack/pack.mcmeta", "{}"),
    ("resources/datapack/wip/half.mcfunction", "say wip"),
  ]);

  let report = build(&context(temp.path()), &LuaProjectLoader).await;

  assert!(report.is_success(), "{:?}", report.error);
  let output = temp.path().join(".sandstone/output");
  assert_eq!(
    files_under(&output),
    vec![
      "archives/e2e_datapack.zip",
      "datapack/data/e2e/function/load.mcfunction",
      "datapack/data/e2e/function/tick.mcfunction",
      "datapack/pack.mcmeta",
    ]
  );
  assert_eq!(
    std::fs::read_to_string(output.join("datapack/data/e2e/function/load.mcfunction")).unwrap(),
    "# generated\nsay loaded"
  );

  let materialized = report.materialize.unwrap();
  assert_eq!(materialized.files.written, 2);
  assert_eq!(materialized.files.excluded, 1);
  assert!(matches!(
    materialized.archives.as_slice(),
    [(pack_type, ArchiveOutcome::Archived { files: 3, .. })] if pack_type == "datapack"
  ));
}

#[tokio::test]
async fn production_build_skips_empty_output_creation() {
  let temp = project(&[("sandstone.lua", r#"return { name = "quiet" }"#), ("src/main.lua", "return nil")]);
  let ctx = BuildContext {
    production: true,
    ..context(temp.path())
  };

  let report = build(&ctx, &LuaProjectLoader).await;

  assert!(report.is_success(), "{:?}", report.error);
  assert!(!temp.path().join(".sandstone").exists());
}

#[tokio::test]
async fn entry_error_is_reported_without_output() {
  let temp = project(&[
    ("sandstone.lua", r#"return { name = "broken" }"#),
    ("src/main.lua", r#"sandstone.emit("datapack/a.txt", "a") error("bad pack")"#),
  ]);

  let report = build(&context(temp.path()), &LuaProjectLoader).await;

  assert!(matches!(report.error, Some(BuildError::Save(_))));
  assert_eq!(report.project.as_deref(), Some("broken"));
  assert!(files_under(&temp.path().join(".sandstone/output")).is_empty());
}

#[tokio::test]
async fn missing_entry_script_is_a_save_error() {
  let temp = project(&[("sandstone.lua", r#"return { name = "noentry", entry = "gen/missing.lua" }"#)]);

  let report = build(&context(temp.path()), &LuaProjectLoader).await;

  let err = report.error.expect("build should fail");
  assert!(err.to_string().contains("missing.lua"), "{err}");
}
