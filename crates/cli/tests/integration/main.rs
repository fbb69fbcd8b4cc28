//! Integration tests for the sand CLI.

mod build_tests;
mod clean_tests;
