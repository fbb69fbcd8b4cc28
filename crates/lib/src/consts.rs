//! Well-known names shared by the pipeline and the CLI.

pub const APP_NAME: &str = "sandstone";

/// Project configuration file, relative to the project root.
pub const CONFIG_FILENAME: &str = "sandstone.lua";

/// Default entry script when the config does not name one.
pub const DEFAULT_ENTRY: &str = "src/main.lua";

/// Live output root, relative to the project root.
pub const OUTPUT_ROOT: &str = ".sandstone/output";

/// Directory under the output root that receives zip archives.
pub const ARCHIVES_DIR: &str = "archives";

/// Directory holding hand-written resources, one subdirectory per pack type.
pub const RESOURCES_ROOT: &str = "resources";

/// Subfolder name passed to output handlers.
pub const OUTPUT_SUBFOLDER: &str = "output";
