// src/cli/handlers/mod.rs

// One module per command.

pub mod commons;
pub mod get;
pub mod profile;
pub mod set;
pub mod show;
pub mod unset;
