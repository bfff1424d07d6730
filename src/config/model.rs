// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::types::ResourceCategory;

/// Launcher configuration as read from `Launcher.toml`.
///
/// ```toml
/// [paths]
/// root = "."
/// hashcat_dir = "hashcat"
///
/// [watch]
/// debounce = "250ms"
/// exclude = [".*", "*.tmp"]
///
/// [task]
/// status_timer = 5
/// max_runtime = "12h"
/// ```
///
/// All sections are optional. This is the unchecked form; it becomes a
/// [`LauncherConfig`] through `TryFrom`, which validates it and resolves
/// every path against the root.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLauncherConfig {
    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub task: TaskSection,
}

/// `[paths]` section. Relative paths are resolved against `root`.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    #[serde(default = "default_root")]
    pub root: PathBuf,

    #[serde(default = "default_hashcat_dir")]
    pub hashcat_dir: PathBuf,

    /// Defaults to `hashcat.bin` (`hashcat.exe` on Windows) in `hashcat_dir`.
    #[serde(default)]
    pub binary: Option<PathBuf>,

    /// The four resource directories default to subdirectories of
    /// `hashcat_dir`.
    #[serde(default)]
    pub hashes_dir: Option<PathBuf>,
    #[serde(default)]
    pub dictionaries_dir: Option<PathBuf>,
    #[serde(default)]
    pub rules_dir: Option<PathBuf>,
    #[serde(default)]
    pub masks_dir: Option<PathBuf>,

    #[serde(default = "default_exported_dir")]
    pub exported_dir: PathBuf,

    #[serde(default = "default_settings_file")]
    pub settings_file: PathBuf,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_hashcat_dir() -> PathBuf {
    PathBuf::from("hashcat")
}

fn default_exported_dir() -> PathBuf {
    PathBuf::from("exported")
}

fn default_settings_file() -> PathBuf {
    PathBuf::from("settings.toml")
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            hashcat_dir: default_hashcat_dir(),
            binary: None,
            hashes_dir: None,
            dictionaries_dir: None,
            rules_dir: None,
            masks_dir: None,
            exported_dir: default_exported_dir(),
            settings_file: default_settings_file(),
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Quiet period before a burst of events on one directory turns into a
    /// single rescan (e.g. `"250ms"`). `"0ms"` rescans on every raw event.
    #[serde(default = "default_debounce")]
    pub debounce: String,

    /// Skip the watcher notification when a rescan produced the same
    /// inventory digest as before.
    #[serde(default)]
    pub skip_unchanged: bool,

    /// File-name globs ignored by every inventory scan.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_debounce() -> String {
    "250ms".to_string()
}

fn default_exclude() -> Vec<String> {
    vec![".*".to_string(), "*.tmp".to_string(), "*.part".to_string()]
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce: default_debounce(),
            skip_unchanged: false,
            exclude: default_exclude(),
        }
    }
}

/// `[task]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSection {
    /// Seconds between status lines emitted by the tool.
    #[serde(default = "default_status_timer")]
    pub status_timer: u32,

    /// Maximum wall-clock runtime (e.g. `"12h"`); unset means no limit.
    #[serde(default)]
    pub max_runtime: Option<String>,

    /// Extra arguments appended verbatim before the hash target.
    #[serde(default)]
    pub extra_args: Vec<String>,

    #[serde(default = "default_stderr_tail_lines")]
    pub stderr_tail_lines: usize,

    #[serde(default = "default_journal_limit")]
    pub journal_limit: usize,

    /// Write recovered values to `<exported_dir>/<task id>.txt`.
    #[serde(default = "default_true")]
    pub export_recovered: bool,
}

fn default_status_timer() -> u32 {
    5
}

fn default_stderr_tail_lines() -> usize {
    20
}

fn default_journal_limit() -> usize {
    200
}

impl Default for TaskSection {
    fn default() -> Self {
        Self {
            status_timer: default_status_timer(),
            max_runtime: None,
            extra_args: Vec::new(),
            stderr_tail_lines: default_stderr_tail_lines(),
            journal_limit: default_journal_limit(),
            export_recovered: true,
        }
    }
}

/// Validated launcher configuration.
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub paths: LauncherPaths,
    pub watch: WatchOptions,
    pub task: TaskOptions,
}

impl LauncherConfig {
    /// Default configuration rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            paths: LauncherPaths::from_root(root),
            watch: WatchOptions::default(),
            task: TaskOptions::default(),
        }
    }
}

/// Absolute (root-resolved) locations used by the launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherPaths {
    pub root: PathBuf,
    pub hashcat_dir: PathBuf,
    pub binary: PathBuf,
    pub hashes_dir: PathBuf,
    pub dictionaries_dir: PathBuf,
    pub rules_dir: PathBuf,
    pub masks_dir: PathBuf,
    pub exported_dir: PathBuf,
    pub settings_file: PathBuf,
}

impl LauncherPaths {
    /// The default layout under `root`:
    ///
    /// ```text
    /// <root>/hashcat/hashcat.bin
    /// <root>/hashcat/{hashes,dictionaries,rules,masks}/
    /// <root>/exported/
    /// <root>/settings.toml
    /// ```
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let hashcat_dir = root.join("hashcat");
        Self {
            binary: hashcat_dir.join(default_binary_name()),
            hashes_dir: hashcat_dir.join("hashes"),
            dictionaries_dir: hashcat_dir.join("dictionaries"),
            rules_dir: hashcat_dir.join("rules"),
            masks_dir: hashcat_dir.join("masks"),
            exported_dir: root.join("exported"),
            settings_file: root.join("settings.toml"),
            hashcat_dir,
            root,
        }
    }

    /// Directory backing a category. `Tool` maps to the install directory.
    pub fn category_dir(&self, category: ResourceCategory) -> &Path {
        match category {
            ResourceCategory::Hashes => &self.hashes_dir,
            ResourceCategory::Dictionaries => &self.dictionaries_dir,
            ResourceCategory::Rules => &self.rules_dir,
            ResourceCategory::Masks => &self.masks_dir,
            ResourceCategory::Tool => &self.hashcat_dir,
        }
    }

    /// Every directory the launcher expects to exist.
    pub fn directories(&self) -> Vec<&Path> {
        vec![
            &self.hashcat_dir,
            &self.hashes_dir,
            &self.dictionaries_dir,
            &self.rules_dir,
            &self.masks_dir,
            &self.exported_dir,
        ]
    }
}

pub fn default_binary_name() -> &'static str {
    if cfg!(windows) {
        "hashcat.exe"
    } else {
        "hashcat.bin"
    }
}

#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub enabled: bool,
    pub debounce: Duration,
    pub skip_unchanged: bool,
    pub exclude: Vec<String>,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce: Duration::from_millis(250),
            skip_unchanged: false,
            exclude: default_exclude(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskOptions {
    pub status_timer: u32,
    pub max_runtime: Option<Duration>,
    pub extra_args: Vec<String>,
    pub stderr_tail_lines: usize,
    pub journal_limit: usize,
    pub export_recovered: bool,
}

impl Default for TaskOptions {
    fn default() -> Self {
        let section = TaskSection::default();
        Self {
            status_timer: section.status_timer,
            max_runtime: None,
            extra_args: section.extra_args,
            stderr_tail_lines: section.stderr_tail_lines,
            journal_limit: section.journal_limit,
            export_recovered: section.export_recovered,
        }
    }
}
