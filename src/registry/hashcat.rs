// src/registry/hashcat.rs

//! Binding to the external recovery tool: where it lives and which
//! algorithms it supports.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::errors::{LauncherError, Result};
use crate::registry::inventory::Algorithm;

/// Location of the tool binary and its install directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hashcat {
    pub binary: PathBuf,
    pub dir: PathBuf,
}

impl Hashcat {
    pub fn new(binary: impl Into<PathBuf>, dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            dir: dir.into(),
        }
    }
}

/// Where the algorithm catalog comes from.
///
/// Production code asks the binary itself ([`HelpOutputSource`]); tests use
/// [`StaticAlgorithms`].
pub trait AlgorithmSource: Send + Sync + Debug {
    fn load(&self, hashcat: &Hashcat) -> Result<Vec<Algorithm>>;
}

/// Runs `<binary> --help` in the install directory and parses the
/// "Hash modes" table.
#[derive(Debug, Clone, Default)]
pub struct HelpOutputSource;

impl AlgorithmSource for HelpOutputSource {
    fn load(&self, hashcat: &Hashcat) -> Result<Vec<Algorithm>> {
        if !hashcat.dir.is_dir() {
            return Err(LauncherError::IoError(io::Error::new(
                io::ErrorKind::NotFound,
                format!("tool directory {:?} is not readable", hashcat.dir),
            )));
        }
        if !hashcat.binary.is_file() {
            return Err(LauncherError::LaunchError(format!(
                "binary not found at {:?}",
                hashcat.binary
            )));
        }

        debug!(binary = ?hashcat.binary, "querying algorithm catalog");
        let output = Command::new(&hashcat.binary)
            .arg("--help")
            .current_dir(&hashcat.dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| LauncherError::LaunchError(format!("running {:?}: {e}", hashcat.binary)))?;

        let text = String::from_utf8_lossy(&output.stdout);
        let algorithms = parse_hash_modes(&text);
        info!(count = algorithms.len(), "algorithm catalog loaded");
        Ok(algorithms)
    }
}

/// A fixed catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticAlgorithms(pub Vec<Algorithm>);

impl AlgorithmSource for StaticAlgorithms {
    fn load(&self, _hashcat: &Hashcat) -> Result<Vec<Algorithm>> {
        Ok(self.0.clone())
    }
}

static HASH_MODE_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)\s*\|\s*([^|]*?)\s*\|\s*(.*?)\s*$").expect("valid hash mode regex")
});

/// Parse the rows of the "Hash modes" section of the tool's help text:
///
/// ```text
/// - [ Hash modes ] -
///
///       # | Name                      | Category
///   ======+===========================+=================
///     900 | MD4                       | Raw Hash
///       0 | MD5                       | Raw Hash
/// ```
///
/// Other tables in the help text are ignored. The result is sorted by
/// numeric id; duplicate ids keep the first occurrence.
pub fn parse_hash_modes(text: &str) -> Vec<Algorithm> {
    let mut in_section = false;
    let mut by_id: BTreeMap<u32, Algorithm> = BTreeMap::new();

    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("- [") {
            in_section = trimmed.to_ascii_lowercase().contains("hash modes");
            continue;
        }
        if !in_section {
            continue;
        }

        let Some(caps) = HASH_MODE_ROW.captures(line) else {
            continue;
        };
        let Ok(id) = caps[1].parse::<u32>() else {
            continue;
        };
        by_id
            .entry(id)
            .or_insert_with(|| Algorithm::new(id.to_string(), &caps[2], &caps[3]));
    }

    by_id.into_values().collect()
}

