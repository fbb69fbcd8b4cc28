//! Project config loading.
//!
//! `sandstone.lua` returns a table describing the project:
//!
//! ```lua
//! return {
//!   name = "mypack",
//!   packUid = "b7c1e2",
//!   namespace = "mypack",
//!   onConflict = "warn",
//!   packs = { datapack = { description = "My pack" } },
//!   entry = "src/main.lua",
//!   saveOptions = {
//!     indentation = 2,
//!     resources = {
//!       exclude = { generated = { "**/*.bak" }, existing = { "datapack/notes" } },
//!       handle = {
//!         { path = "**/*.json", callback = function(content) return content end },
//!       },
//!     },
//!   },
//!   scripts = {
//!     beforeAll = function() end,
//!     afterAll = function() end,
//!   },
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use futures::FutureExt;
use mlua::prelude::*;
use tracing::{debug, info};

use super::LuaHostError;
use super::entry::LuaEntryModule;
use super::runtime::{self, lua_to_content};
use crate::build::{BuildContext, Hook, Project, ProjectConfig, ProjectLoader, ResourceOptions, SaveOptions, Scripts};
use crate::consts::{CONFIG_FILENAME, DEFAULT_ENTRY};
use crate::materialize::{ExclusionRules, FileHandler, FileHandlers};

/// Loads `sandstone.lua` (or `ctx.config_path`) and the entry script it names.
#[derive(Debug, Clone, Copy, Default)]
pub struct LuaProjectLoader;

impl LuaProjectLoader {
  pub fn config_path(ctx: &BuildContext) -> PathBuf {
    match &ctx.config_path {
      Some(path) if path.is_absolute() => path.clone(),
      Some(path) => ctx.root_dir.join(path),
      None => ctx.root_dir.join(CONFIG_FILENAME),
    }
  }
}

#[async_trait]
impl ProjectLoader for LuaProjectLoader {
  async fn load(&self, ctx: &BuildContext) -> anyhow::Result<Project> {
    let config_path = Self::config_path(ctx);
    if !config_path.exists() {
      return Err(LuaHostError::ConfigNotFound(config_path).into());
    }
    info!(config = %config_path.display(), "loading project config");

    let lua = runtime::create_runtime(ctx)?;
    let value = runtime::load_file(&lua, &config_path)
      .map_err(anyhow::Error::from)
      .with_context(|| format!("failed to evaluate {}", config_path.display()))?;
    let LuaValue::Table(table) = value else {
      return Err(LuaHostError::NotATable(config_path).into());
    };

    let config = parse_config(&lua, &table)?;
    let scripts = parse_scripts(&table)?;

    let entry = table
      .get::<Option<String>>("entry")?
      .unwrap_or_else(|| DEFAULT_ENTRY.to_string());
    let entry_path = ctx.root_dir.join(entry);
    debug!(entry = %entry_path.display(), "entry script");

    Ok(Project {
      entry: Arc::new(LuaEntryModule::new(lua, entry_path, config.name.clone())),
      config,
      scripts,
    })
  }
}

fn parse_config(lua: &Lua, table: &LuaTable) -> Result<ProjectConfig, LuaHostError> {
  let name = table
    .get::<Option<String>>("name")?
    .ok_or(LuaHostError::MissingField("name"))?;

  let packs = match table.get::<LuaValue>("packs")? {
    LuaValue::Nil => serde_json::Value::Null,
    value => lua.from_value::<serde_json::Value>(value)?,
  };

  let save_options = match table.get::<Option<LuaTable>>("saveOptions")? {
    Some(options) => parse_save_options(lua, &options)?,
    None => SaveOptions::default(),
  };

  Ok(ProjectConfig {
    name,
    pack_uid: table.get("packUid")?,
    namespace: table.get("namespace")?,
    on_conflict: table.get("onConflict")?,
    packs,
    save_options,
  })
}

fn parse_save_options(lua: &Lua, options: &LuaTable) -> Result<SaveOptions, LuaHostError> {
  let resources = match options.get::<Option<LuaTable>>("resources")? {
    Some(resources) => parse_resources(lua, &resources)?,
    None => ResourceOptions::default(),
  };

  Ok(SaveOptions {
    world: options.get("world")?,
    root: options.get("root")?,
    indentation: options.get("indentation")?,
    custom_file_handler: options.get::<Option<bool>>("customFileHandler")?.unwrap_or(false),
    resources,
  })
}

fn parse_resources(lua: &Lua, resources: &LuaTable) -> Result<ResourceOptions, LuaHostError> {
  let (generated, existing) = match resources.get::<Option<LuaTable>>("exclude")? {
    Some(exclude) => (
      exclude.get::<Option<Vec<String>>>("generated")?.unwrap_or_default(),
      exclude.get::<Option<Vec<String>>>("existing")?.unwrap_or_default(),
    ),
    None => (Vec::new(), Vec::new()),
  };
  let exclude = ExclusionRules::new(generated.as_slice(), existing.as_slice())?;

  let mut handle = FileHandlers::default();
  if let Some(handlers) = resources.get::<Option<LuaTable>>("handle")? {
    for (index, entry) in handlers.sequence_values::<LuaTable>().enumerate() {
      let entry = entry?;
      let pattern: String = entry
        .get::<Option<String>>("path")?
        .ok_or_else(|| LuaHostError::InvalidHandler(index + 1, "missing 'path'"))?;
      let callback: LuaFunction = entry
        .get::<Option<LuaFunction>>("callback")?
        .ok_or_else(|| LuaHostError::InvalidHandler(index + 1, "missing 'callback'"))?;
      handle.push(lua_handler(lua, &pattern, callback)?);
    }
  }

  Ok(ResourceOptions { exclude, handle })
}

/// Wrap a Lua function as a file handler.
///
/// The function receives the content as a string and returns the new content;
/// returning `nil` keeps the content unchanged.
fn lua_handler(lua: &Lua, pattern: &str, callback: LuaFunction) -> Result<FileHandler, LuaHostError> {
  let lua = lua.clone();
  let handler = FileHandler::sync(pattern, move |content| {
    let input = lua.create_string(content.as_bytes())?;
    match callback.call::<LuaValue>(input)? {
      LuaValue::Nil => Ok(content),
      LuaValue::String(output) => Ok(lua_to_content(&output)),
      other => anyhow::bail!("file handler returned {}, expected a string", other.type_name()),
    }
  })?;
  Ok(handler)
}

fn parse_scripts(table: &LuaTable) -> Result<Scripts, LuaHostError> {
  let Some(scripts) = table.get::<Option<LuaTable>>("scripts")? else {
    return Ok(Scripts::default());
  };
  Ok(Scripts {
    before_all: scripts.get::<Option<LuaFunction>>("beforeAll")?.map(lua_hook),
    before_save: scripts.get::<Option<LuaFunction>>("beforeSave")?.map(lua_hook),
    after_all: scripts.get::<Option<LuaFunction>>("afterAll")?.map(lua_hook),
  })
}

fn lua_hook(function: LuaFunction) -> Hook {
  Arc::new(move || {
    let result = function.call::<()>(()).map_err(anyhow::Error::from);
    async move { result }.boxed()
  })
}
