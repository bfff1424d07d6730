// src/watch/mod.rs

//! File watching and resource refresh.
//!
//! This module is responsible for:
//! - Wiring up a cross-platform filesystem watcher (`notify`) on the tool
//!   directory and each resource directory.
//! - Mapping raw events to resource categories.
//! - Coalescing bursts of events per category before rescanning.
//!
//! It never touches tasks; it only refreshes the registry and tells the
//! notification bridge which category changed.

pub mod debounce;
pub mod path_utils;
pub mod watcher;

pub use debounce::Debouncer;
pub use path_utils::CategoryDirs;
pub use watcher::{rescan, spawn_watcher, WatcherHandle};
