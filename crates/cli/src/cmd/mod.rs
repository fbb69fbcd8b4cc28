mod build;
mod clean;

pub use build::{BuildArgs, cmd_build};
pub use clean::cmd_clean;
