// src/config/loader.rs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::model::{LauncherConfig, LauncherPaths, RawLauncherConfig};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawLauncherConfig`.
///
/// A missing file is not an error: every section has defaults, so the
/// launcher runs with the default layout. This performs TOML
/// deserialization only; use [`load_and_validate`] for the checked form.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawLauncherConfig> {
    let path = path.as_ref();
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!(?path, "config file not found; using defaults");
            return Ok(RawLauncherConfig::default());
        }
        Err(e) => return Err(e.into()),
    };

    let config: RawLauncherConfig = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a configuration file from path, anchor a relative `[paths].root`
/// at the directory containing the config file, and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<LauncherConfig> {
    let path = path.as_ref();
    let mut raw = load_from_path(path)?;

    if raw.paths.root.is_relative() {
        raw.paths.root = config_root_dir(path).join(&raw.paths.root);
    }

    LauncherConfig::try_from(raw)
}

/// Figure out the directory relative paths are anchored at.
///
/// - If the config path has a non-empty parent (e.g. "conf/Launcher.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Launcher.toml" (parent = ""),
///   we fall back to the current working directory.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("Launcher.toml")
}

/// Create every directory of the layout that does not exist yet.
pub fn ensure_directories(paths: &LauncherPaths) -> Result<()> {
    for dir in paths.directories() {
        if !dir.is_dir() {
            debug!(?dir, "creating directory");
            fs::create_dir_all(dir)?;
        }
    }
    Ok(())
}
