// src/core/mod.rs

pub mod defaults;
pub mod defaults_merge;
pub mod lifecycle;
pub mod path_resolver;
pub mod paths;
pub mod profile_store;
pub mod storage;
pub mod view;
