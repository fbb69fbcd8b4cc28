//! sandstone-lib: build pipeline for sandstone projects
//!
//! This crate provides the pieces a build is made of:
//! - `Store`: hierarchical file store, in memory or on disk
//! - `walk`: lazy depth-first traversal over a store subtree
//! - `Materializer`: writes generated files and resources into the output tree
//! - `build`: one build run, from loading the project to archiving its output
//! - `lua`: the Lua host that loads `sandstone.lua` and runs entry scripts

pub mod build;
pub mod consts;
pub mod lua;
pub mod materialize;
pub mod pattern;
pub mod store;
pub mod walk;
