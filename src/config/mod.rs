// src/config/mod.rs

//! Configuration loading and validation for the launcher.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate it and resolve paths (`validate.rs`).
//! - Persist opaque user settings (`settings.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{config_root_dir, default_config_path, ensure_directories, load_and_validate, load_from_path};
pub use model::{
    LauncherConfig, LauncherPaths, PathsSection, RawLauncherConfig, TaskOptions, TaskSection,
    WatchOptions, WatchSection,
};
pub use settings::SettingsStore;
