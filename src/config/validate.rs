// src/config/validate.rs

use std::path::{Path, PathBuf};

use globset::Glob;

use crate::config::duration::parse_duration;
use crate::config::model::{
    default_binary_name, LauncherConfig, LauncherPaths, PathsSection, RawLauncherConfig,
    TaskOptions, TaskSection, WatchOptions, WatchSection,
};
use crate::errors::{LauncherError, Result};

impl TryFrom<RawLauncherConfig> for LauncherConfig {
    type Error = LauncherError;

    fn try_from(raw: RawLauncherConfig) -> std::result::Result<Self, Self::Error> {
        Ok(LauncherConfig {
            paths: resolve_paths(&raw.paths),
            watch: validate_watch(&raw.watch)?,
            task: validate_task(&raw.task)?,
        })
    }
}

fn resolve_paths(section: &PathsSection) -> LauncherPaths {
    let root = section.root.clone();
    let hashcat_dir = join(&root, &section.hashcat_dir);
    let under_hashcat = |explicit: &Option<PathBuf>, name: &str| match explicit {
        Some(p) => join(&root, p),
        None => hashcat_dir.join(name),
    };

    LauncherPaths {
        binary: under_hashcat(&section.binary, default_binary_name()),
        hashes_dir: under_hashcat(&section.hashes_dir, "hashes"),
        dictionaries_dir: under_hashcat(&section.dictionaries_dir, "dictionaries"),
        rules_dir: under_hashcat(&section.rules_dir, "rules"),
        masks_dir: under_hashcat(&section.masks_dir, "masks"),
        exported_dir: join(&root, &section.exported_dir),
        settings_file: join(&root, &section.settings_file),
        hashcat_dir,
        root,
    }
}

fn join(root: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}

fn validate_watch(section: &WatchSection) -> Result<WatchOptions> {
    let debounce = parse_duration(&section.debounce)
        .map_err(|e| LauncherError::ConfigError(format!("[watch].debounce: {e}")))?;

    for pattern in &section.exclude {
        Glob::new(pattern).map_err(|e| {
            LauncherError::ConfigError(format!(
                "[watch].exclude: invalid glob '{pattern}': {e}"
            ))
        })?;
    }

    Ok(WatchOptions {
        enabled: section.enabled,
        debounce,
        skip_unchanged: section.skip_unchanged,
        exclude: section.exclude.clone(),
    })
}

fn validate_task(section: &TaskSection) -> Result<TaskOptions> {
    if section.status_timer == 0 {
        return Err(LauncherError::ConfigError(
            "[task].status_timer must be >= 1 (got 0)".to_string(),
        ));
    }

    let max_runtime = match section.max_runtime.as_deref() {
        Some(s) => {
            let dur = parse_duration(s)
                .map_err(|e| LauncherError::ConfigError(format!("[task].max_runtime: {e}")))?;
            if dur.is_zero() {
                return Err(LauncherError::ConfigError(
                    "[task].max_runtime must be greater than zero".to_string(),
                ));
            }
            Some(dur)
        }
        None => None,
    };

    Ok(TaskOptions {
        status_timer: section.status_timer,
        max_runtime,
        extra_args: section.extra_args.clone(),
        stderr_tail_lines: section.stderr_tail_lines,
        journal_limit: section.journal_limit,
        export_recovered: section.export_recovered,
    })
}
