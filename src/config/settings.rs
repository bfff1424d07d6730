// src/config/settings.rs

//! Opaque persisted user settings.
//!
//! The launcher does not interpret settings; it loads a TOML table at
//! startup, lets the presentation layer read and write typed values by key,
//! and saves the table at shutdown.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::{LauncherError, Result};

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    table: toml::Table,
}

impl SettingsStore {
    /// Empty store that will be saved to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: toml::Table::new(),
        }
    }

    /// Load the settings file; a missing file yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let table = match fs::read_to_string(&path) {
            Ok(contents) => toml::from_str::<toml::Table>(&contents)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(?path, "no settings file yet");
                toml::Table::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, table })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &toml::Table {
        &self.table
    }

    /// Typed read. A value of the wrong shape is reported and treated as
    /// absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.table.get(key)?.clone();
        match value.try_into() {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(key, error = %e, "ignoring malformed setting");
                None
            }
        }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let value = toml::Value::try_from(value)?;
        self.table.insert(key.to_string(), value);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<toml::Value> {
        self.table.remove(key)
    }

    /// Write the table next to its final location, then rename over it so a
    /// crash never leaves a truncated file behind.
    pub fn save(&self) -> Result<()> {
        let contents = toml::to_string(&self.table)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            LauncherError::IoError(io::Error::new(
                e.kind(),
                format!("replacing {:?}: {e}", self.path),
            ))
        })?;

        debug!(path = ?self.path, "settings saved");
        Ok(())
    }
}
