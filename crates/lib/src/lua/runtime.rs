use std::path::Path;

use mlua::prelude::*;

use crate::build::BuildContext;
use crate::consts::APP_NAME;
use crate::store::Content;

/// Create a Lua runtime for one build.
///
/// `package.path` is extended with the project's `src/` and root directories,
/// and the `sandstone` global table is registered with the build flags.
pub fn create_runtime(ctx: &BuildContext) -> LuaResult<Lua> {
  let lua = Lua::new();

  let root = ctx.root_dir.to_string_lossy();
  let package: LuaTable = lua.globals().get("package")?;
  let package_path = package.get::<String>("path")?;
  package.set(
    "path",
    format!("{root}/src/?.lua;{root}/src/?/init.lua;{root}/?.lua;{package_path}"),
  )?;

  let sandstone = lua.create_table()?;
  sandstone.set("root", root.to_string())?;
  sandstone.set("dry", ctx.dry)?;
  sandstone.set("verbose", ctx.verbose)?;
  sandstone.set("production", ctx.production)?;
  lua.globals().set(APP_NAME, sandstone)?;

  Ok(lua)
}

/// Load and execute a Lua file, returning whatever it returns.
/// Sets `sandstone.dir` to the directory of the loaded file.
pub fn load_file(lua: &Lua, path: &Path) -> LuaResult<LuaValue> {
  let canonical_path = dunce::canonicalize(path)
    .map_err(|e| LuaError::external(format!("cannot canonicalize '{}': {}", path.display(), e)))?;
  let content = std::fs::read_to_string(&canonical_path)
    .map_err(|e| LuaError::external(format!("cannot read '{}': {}", canonical_path.display(), e)))?;

  let sandstone: LuaTable = lua.globals().get(APP_NAME)?;
  sandstone.set(
    "dir",
    canonical_path
      .parent()
      .unwrap_or(Path::new(""))
      .to_string_lossy()
      .to_string(),
  )?;

  lua
    .load(&content)
    .set_name(format!("@{}", canonical_path.display()))
    .eval::<LuaValue>()
}

/// Turn a Lua string into content, keeping it as text when it is valid UTF-8.
pub(crate) fn lua_to_content(value: &LuaString) -> Content {
  let bytes = value.as_bytes();
  match std::str::from_utf8(&bytes) {
    Ok(text) => Content::Text(text.to_string()),
    Err(_) => Content::Bytes(bytes.to_vec()),
  }
}
