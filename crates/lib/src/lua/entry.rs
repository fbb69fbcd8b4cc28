//! Entry script execution.
//!
//! The entry script generates the pack. It sees the `sandstone` global with
//! the build flags and an `emit(path, content)` function, and returns the pack
//! types to materialize:
//!
//! ```lua
//! sandstone.emit("datapack/data/mypack/function/load.mcfunction", "say loaded")
//! return {
//!   { type = "datapack", archive = true },
//!   "resourcepack",
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mlua::prelude::*;
use tracing::debug;

use super::runtime::{self, lua_to_content};
use crate::build::{EntryModule, SaveRequest};
use crate::consts::APP_NAME;
use crate::materialize::{FileSink, PackType};
use crate::store::Content;

type Emitted = Arc<Mutex<Vec<(String, Content)>>>;

/// Runs an entry script in the runtime the project config was loaded in.
pub struct LuaEntryModule {
  lua: Lua,
  path: PathBuf,
  name: String,
}

impl LuaEntryModule {
  pub fn new(lua: Lua, path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
    Self {
      lua,
      path: path.into(),
      name: name.into(),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn run_script(&self, options: &SaveRequest, emitted: Emitted) -> LuaResult<Vec<PackType>> {
    let sandstone: LuaTable = self.lua.globals().get(APP_NAME)?;
    sandstone.set("name", self.name.as_str())?;
    sandstone.set("dry", options.dry)?;
    sandstone.set("verbose", options.verbose)?;
    sandstone.set("production", options.context.production)?;
    sandstone.set("context", self.lua.to_value(&options.context)?)?;

    let emit = self
      .lua
      .create_function(move |_, (path, content): (String, LuaString)| {
        emitted
          .lock()
          .map_err(|_| LuaError::external("emit buffer poisoned"))?
          .push((path, lua_to_content(&content)));
        Ok(())
      })?;
    sandstone.set("emit", emit)?;

    let value = runtime::load_file(&self.lua, &self.path)?;
    parse_pack_types(value)
  }
}

#[async_trait]
impl EntryModule for LuaEntryModule {
  async fn save(&self, options: &SaveRequest, sink: &dyn FileSink) -> anyhow::Result<Vec<PackType>> {
    let emitted: Emitted = Arc::default();
    let packs = self.run_script(options, emitted.clone())?;

    let files = std::mem::take(&mut *emitted.lock().map_err(|_| anyhow::anyhow!("emit buffer poisoned"))?);
    debug!(files = files.len(), pack_types = packs.len(), "entry script finished");
    for (path, content) in files {
      sink.file(&path, content).await?;
    }
    Ok(packs)
  }
}

/// Parse the entry script's return value into pack types.
///
/// Accepts `nil`, or a list whose items are either a type name or a table
/// `{ type = "...", archive = bool }`.
fn parse_pack_types(value: LuaValue) -> LuaResult<Vec<PackType>> {
  let table = match value {
    LuaValue::Nil => return Ok(Vec::new()),
    LuaValue::Table(table) => table,
    _ => return Err(LuaError::external("entry script must return a list of pack types or nil")),
  };

  let mut packs = Vec::new();
  for item in table.sequence_values::<LuaValue>() {
    let pack = match item? {
      LuaValue::String(name) => PackType::new(name.to_str()?.to_string()),
      LuaValue::Table(entry) => {
        let name: String = entry
          .get::<Option<String>>("type")?
          .ok_or_else(|| LuaError::external("pack type entry is missing 'type'"))?;
        let mut pack = PackType::new(name);
        pack.archive_output = entry.get::<Option<bool>>("archive")?.unwrap_or(false);
        pack
      }
      _ => return Err(LuaError::external("pack type must be a string or a table")),
    };
    packs.push(pack);
  }
  Ok(packs)
}
