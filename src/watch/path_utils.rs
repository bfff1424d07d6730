// src/watch/path_utils.rs

//! Mapping of event paths to resource categories.

use std::path::{Path, PathBuf};

use crate::types::ResourceCategory;

/// The watched directory of each category, as configured and canonicalized.
#[derive(Debug, Clone, Default)]
pub struct CategoryDirs {
    dirs: Vec<(ResourceCategory, PathBuf, Option<PathBuf>)>,
}

impl CategoryDirs {
    pub fn new(dirs: impl IntoIterator<Item = (ResourceCategory, PathBuf)>) -> Self {
        Self {
            dirs: dirs
                .into_iter()
                .map(|(category, dir)| {
                    // Event paths may use a different prefix for the same
                    // directory (symlinks, /private/var on macOS).
                    let canonical = dir.canonicalize().ok();
                    (category, dir, canonical)
                })
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceCategory, &Path)> {
        self.dirs.iter().map(|(c, d, _)| (*c, d.as_path()))
    }

    fn matches(&self, candidate: &Path) -> Option<ResourceCategory> {
        self.dirs
            .iter()
            .find(|(_, dir, canonical)| {
                candidate == dir.as_path() || canonical.as_deref() == Some(candidate)
            })
            .map(|(category, _, _)| *category)
    }

    /// Category whose directory is `path` itself or, failing that, the
    /// parent of `path`. Nested directories are not part of any inventory.
    pub fn category_for(&self, path: &Path) -> Option<ResourceCategory> {
        self.matches(path)
            .or_else(|| path.parent().and_then(|parent| self.matches(parent)))
    }
}
