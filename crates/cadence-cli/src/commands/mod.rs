//! CLI command handlers

pub mod common;
pub mod moves;
pub mod run;
pub mod validate;
