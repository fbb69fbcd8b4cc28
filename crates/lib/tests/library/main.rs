//! Library integration tests: the public API driven against real directories.

mod common;
mod disk_store_tests;
mod lua_build_tests;
