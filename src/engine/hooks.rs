// src/engine/hooks.rs

//! Pre- and post-process hooks run by the task driver.
//!
//! Both run on the blocking pool while the task's driver waits for them,
//! outside the manager lock: the pre-process hook before the process is
//! launched, the post-process hook after it ended and before the terminal
//! notification. A panicking hook counts as a failed hook.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{LauncherError, Result};
use crate::fs::{into_io_error, FileSystem, RealFileSystem};

use super::core::Task;

pub trait TaskHooks: Send + Sync {
    /// An error fails the task without launching it.
    fn pre_process(&self, task: &Task) -> Result<()>;

    /// Returns the path results were exported to, if any. An error is
    /// recorded on the task but does not change its outcome.
    fn post_process(&self, task: &Task) -> Result<Option<PathBuf>>;
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl TaskHooks for NoopHooks {
    fn pre_process(&self, _task: &Task) -> Result<()> {
        Ok(())
    }

    fn post_process(&self, _task: &Task) -> Result<Option<PathBuf>> {
        Ok(None)
    }
}

/// Production hooks.
///
/// - pre-process: every resolved input file still exists and the export
///   directory can be created;
/// - post-process: recovered values are written as `<hash>:<plain>` lines
///   to `<exported_dir>/<task id>.txt`.
#[derive(Debug, Clone)]
pub struct DefaultHooks {
    fs: Arc<dyn FileSystem>,
    exported_dir: PathBuf,
    export_recovered: bool,
}

impl DefaultHooks {
    pub fn new(exported_dir: impl Into<PathBuf>, export_recovered: bool) -> Self {
        Self::with_fs(Arc::new(RealFileSystem), exported_dir, export_recovered)
    }

    pub fn with_fs(
        fs: Arc<dyn FileSystem>,
        exported_dir: impl Into<PathBuf>,
        export_recovered: bool,
    ) -> Self {
        Self {
            fs,
            exported_dir: exported_dir.into(),
            export_recovered,
        }
    }

    pub fn export_path(&self, task_id: &str) -> PathBuf {
        self.exported_dir.join(format!("{task_id}.txt"))
    }
}

impl TaskHooks for DefaultHooks {
    fn pre_process(&self, task: &Task) -> Result<()> {
        let missing: Vec<String> = task
            .job
            .files()
            .into_iter()
            .filter(|p| !self.fs.is_file(p))
            .map(|p| p.display().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LauncherError::ValidationError(format!(
                "input files disappeared: {}",
                missing.join(", ")
            )));
        }

        if self.export_recovered {
            self.fs
                .create_dir_all(&self.exported_dir)
                .map_err(into_io_error)?;
        }
        debug!(task = %task.id, "pre-process checks passed");
        Ok(())
    }

    fn post_process(&self, task: &Task) -> Result<Option<PathBuf>> {
        if !self.export_recovered || task.recovered.is_empty() {
            return Ok(None);
        }

        let path = self.export_path(&task.id);
        let mut contents = String::new();
        for r in &task.recovered {
            contents.push_str(&r.hash);
            contents.push(':');
            contents.push_str(&r.plain);
            contents.push('\n');
        }
        self.fs
            .write(&path, contents.as_bytes())
            .map_err(into_io_error)?;

        info!(task = %task.id, path = ?path, count = task.recovered.len(), "exported recovered values");
        Ok(Some(path))
    }
}
