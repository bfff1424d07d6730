// src/registry/scan.rs

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, trace};

use crate::errors::{LauncherError, Result};
use crate::fs::{into_io_error, FileSystem};
use crate::registry::inventory::Resource;

/// Compile the file-name exclusion globs shared by every category.
pub fn build_exclude_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for p in patterns {
        let glob = Glob::new(p).map_err(|e| {
            LauncherError::ConfigError(format!("invalid exclude glob '{p}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| LauncherError::ConfigError(format!("building exclude globs: {e}")))
}

/// List the regular files directly inside `dir`, skipping excluded names,
/// sorted by name.
///
/// Fails with `IoError` if the directory cannot be read. Entries that
/// vanish between listing and stat are skipped.
pub fn scan_directory(fs: &dyn FileSystem, dir: &Path, exclude: &GlobSet) -> Result<Vec<Resource>> {
    let entries = fs
        .read_dir(dir)
        .map_err(|e| LauncherError::IoError(into_io_error(e)))?;

    let mut resources = Vec::with_capacity(entries.len());
    for path in entries {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            trace!(?path, "skipping entry without a UTF-8 file name");
            continue;
        };

        if exclude.is_match(name) {
            trace!(?path, "excluded by glob");
            continue;
        }

        if !fs.is_file(&path) {
            continue;
        }

        let meta = fs.metadata(&path).ok();
        resources.push(Resource {
            name: name.to_string(),
            path: path.clone(),
            meta,
        });
    }

    resources.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(?dir, count = resources.len(), "directory scanned");
    Ok(resources)
}
