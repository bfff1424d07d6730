// src/registry/resource_registry.rs

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use globset::GlobSet;
use tracing::{debug, info, warn};

use crate::config::{LauncherConfig, LauncherPaths};
use crate::errors::{LauncherError, Result};
use crate::fs::{into_io_error, FileSystem, RealFileSystem};
use crate::registry::hashcat::{AlgorithmSource, Hashcat, HelpOutputSource};
use crate::registry::inventory::{fingerprint_algorithms, fingerprint_resources, Algorithm, Resource};
use crate::registry::scan::{build_exclude_set, scan_directory};
use crate::types::ResourceCategory;

type Inventory = RwLock<Arc<Vec<Resource>>>;

/// In-memory inventories rebuilt from directory scans.
///
/// Readers get an `Arc` to the currently published sequence and never
/// block a scan for longer than the pointer swap.
#[derive(Debug)]
pub struct ResourceRegistry {
    fs: Arc<dyn FileSystem>,
    exclude: GlobSet,
    hashcat: Hashcat,
    algorithm_source: Arc<dyn AlgorithmSource>,

    hashes_dir: PathBuf,
    dictionaries_dir: PathBuf,
    rules_dir: PathBuf,
    masks_dir: PathBuf,

    hashes: Inventory,
    dictionaries: Inventory,
    rules: Inventory,
    masks: Inventory,
    algorithms: RwLock<Arc<Vec<Algorithm>>>,
}

impl ResourceRegistry {
    /// Build an empty registry; nothing is scanned until [`Self::scan`] or a
    /// per-category scan is called.
    pub fn new(
        paths: &LauncherPaths,
        exclude: &[String],
        fs: Arc<dyn FileSystem>,
        algorithm_source: Arc<dyn AlgorithmSource>,
    ) -> Result<Self> {
        Ok(Self {
            fs,
            exclude: build_exclude_set(exclude)?,
            hashcat: Hashcat::new(&paths.binary, &paths.hashcat_dir),
            algorithm_source,
            hashes_dir: paths.hashes_dir.clone(),
            dictionaries_dir: paths.dictionaries_dir.clone(),
            rules_dir: paths.rules_dir.clone(),
            masks_dir: paths.masks_dir.clone(),
            hashes: Inventory::default(),
            dictionaries: Inventory::default(),
            rules: Inventory::default(),
            masks: Inventory::default(),
            algorithms: RwLock::default(),
        })
    }

    /// Production registry: real filesystem, catalog from the binary.
    pub fn from_config(cfg: &LauncherConfig) -> Result<Self> {
        Self::new(
            &cfg.paths,
            &cfg.watch.exclude,
            Arc::new(RealFileSystem),
            Arc::new(HelpOutputSource),
        )
    }

    pub fn hashcat(&self) -> &Hashcat {
        &self.hashcat
    }

    /// Directory backing `category` (`Tool` is the install directory).
    pub fn category_dir(&self, category: ResourceCategory) -> &Path {
        match category {
            ResourceCategory::Hashes => &self.hashes_dir,
            ResourceCategory::Dictionaries => &self.dictionaries_dir,
            ResourceCategory::Rules => &self.rules_dir,
            ResourceCategory::Masks => &self.masks_dir,
            ResourceCategory::Tool => &self.hashcat.dir,
        }
    }

    fn slot(&self, category: ResourceCategory) -> Option<&Inventory> {
        match category {
            ResourceCategory::Hashes => Some(&self.hashes),
            ResourceCategory::Dictionaries => Some(&self.dictionaries),
            ResourceCategory::Rules => Some(&self.rules),
            ResourceCategory::Masks => Some(&self.masks),
            ResourceCategory::Tool => None,
        }
    }

    fn scan_into(&self, category: ResourceCategory) -> Result<()> {
        let Some(slot) = self.slot(category) else {
            return self.load_algorithms();
        };
        let dir = self.category_dir(category);
        let fresh = scan_directory(self.fs.as_ref(), dir, &self.exclude)?;
        debug!(%category, count = fresh.len(), "publishing inventory");
        *slot.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(fresh);
        Ok(())
    }

    pub fn scan_hashes(&self) -> Result<()> {
        self.scan_into(ResourceCategory::Hashes)
    }

    pub fn scan_dictionaries(&self) -> Result<()> {
        self.scan_into(ResourceCategory::Dictionaries)
    }

    pub fn scan_rules(&self) -> Result<()> {
        self.scan_into(ResourceCategory::Rules)
    }

    pub fn scan_masks(&self) -> Result<()> {
        self.scan_into(ResourceCategory::Masks)
    }

    /// Reload the algorithm catalog. The previous catalog is kept if the
    /// source fails.
    pub fn load_algorithms(&self) -> Result<()> {
        let fresh = self.algorithm_source.load(&self.hashcat)?;
        *self
            .algorithms
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(fresh);
        Ok(())
    }

    /// Rescan a single category (`Tool` reloads the algorithm catalog).
    pub fn scan_category(&self, category: ResourceCategory) -> Result<()> {
        self.scan_into(category)
    }

    /// Scan every directory and then reload the algorithm catalog, stopping
    /// at the first failure. Categories scanned before the failure keep
    /// their fresh inventories.
    pub fn scan(&self) -> Result<()> {
        for category in ResourceCategory::DIRECTORIES {
            if let Err(err) = self.scan_into(category) {
                warn!(%category, error = %err, "scan failed");
                return Err(err);
            }
        }
        self.load_algorithms()
    }

    pub fn inventory(&self, category: ResourceCategory) -> Arc<Vec<Resource>> {
        match self.slot(category) {
            Some(slot) => Arc::clone(&slot.read().unwrap_or_else(PoisonError::into_inner)),
            None => Arc::new(Vec::new()),
        }
    }

    pub fn hashes(&self) -> Arc<Vec<Resource>> {
        self.inventory(ResourceCategory::Hashes)
    }

    pub fn dictionaries(&self) -> Arc<Vec<Resource>> {
        self.inventory(ResourceCategory::Dictionaries)
    }

    pub fn rules(&self) -> Arc<Vec<Resource>> {
        self.inventory(ResourceCategory::Rules)
    }

    pub fn masks(&self) -> Arc<Vec<Resource>> {
        self.inventory(ResourceCategory::Masks)
    }

    pub fn algorithms(&self) -> Arc<Vec<Algorithm>> {
        Arc::clone(&self.algorithms.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Look up an entry by display name in the published inventory.
    pub fn find(&self, category: ResourceCategory, name: &str) -> Option<Resource> {
        self.inventory(category)
            .iter()
            .find(|r| r.name == name)
            .cloned()
    }

    /// Store `contents` as a new hash set called `name` and rescan the hash
    /// inventory. Returns the path written. An existing file is never
    /// overwritten.
    pub fn save_hash(&self, name: &str, contents: &[u8]) -> Result<PathBuf> {
        validate_file_name(name)?;
        if self.exclude.is_match(name) {
            return Err(LauncherError::ValidationError(format!(
                "hash file name {name:?} matches an exclude pattern"
            )));
        }

        let path = self.hashes_dir.join(name);
        if self.fs.exists(&path) {
            return Err(LauncherError::ConflictError(format!(
                "hash file {name:?} already exists"
            )));
        }
        self.fs
            .write(&path, contents)
            .map_err(|e| LauncherError::IoError(into_io_error(e)))?;
        info!(path = ?path, bytes = contents.len(), "hash file saved");

        self.scan_hashes()?;
        Ok(path)
    }

    pub fn has_algorithm(&self, id: &str) -> bool {
        self.algorithms().iter().any(|a| a.id == id)
    }

    /// Digest of the published inventory for `category`.
    pub fn fingerprint(&self, category: ResourceCategory) -> String {
        match category {
            ResourceCategory::Tool => fingerprint_algorithms(&self.algorithms()),
            other => fingerprint_resources(&self.inventory(other)),
        }
    }
}

/// A single plain file name: no separators, no leading dot, no control
/// characters.
fn validate_file_name(name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && name.len() <= 255
        && !name.starts_with('.')
        && !name.chars().any(|c| matches!(c, '/' | '\\') || c.is_control());
    if ok {
        Ok(())
    } else {
        Err(LauncherError::ValidationError(format!(
            "{name:?} is not a valid hash file name"
        )))
    }
}
