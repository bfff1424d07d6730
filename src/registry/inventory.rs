// src/registry/inventory.rs

use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use blake3::Hasher;
use serde::Serialize;

use crate::fs::FileMeta;

/// One inventory entry: a file directly inside a resource directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    /// File name, used as the display name and as the reference in task
    /// requests.
    pub name: String,
    pub path: PathBuf,
    #[serde(skip)]
    pub meta: Option<FileMeta>,
}

/// One entry of the tool's algorithm catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Algorithm {
    /// Numeric hash-type id as passed to the tool (e.g. `"0"` for MD5).
    pub id: String,
    pub name: String,
    pub category: String,
}

impl Algorithm {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
        }
    }
}

/// Digest of an inventory: name, size and modification time of each entry,
/// in inventory order.
pub fn fingerprint_resources(resources: &[Resource]) -> String {
    let mut hasher = Hasher::new();
    for r in resources {
        hasher.update(r.name.as_bytes());
        hasher.update(&[0]);
        if let Some(meta) = r.meta {
            hasher.update(&meta.len.to_le_bytes());
            let mtime = meta
                .modified
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_nanos())
                .unwrap_or(0);
            hasher.update(&mtime.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

pub fn fingerprint_algorithms(algorithms: &[Algorithm]) -> String {
    let mut hasher = Hasher::new();
    for a in algorithms {
        hasher.update(a.id.as_bytes());
        hasher.update(&[0]);
        hasher.update(a.name.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize().to_hex().to_string()
}
