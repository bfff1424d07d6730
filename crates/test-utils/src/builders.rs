#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hashcat_launcher::config::{LauncherConfig, LauncherPaths};
use hashcat_launcher::engine::{AttackSpec, HashTarget, MaskSpec, TaskRequest};
use hashcat_launcher::fs::RealFileSystem;
use hashcat_launcher::registry::{Algorithm, ResourceRegistry, StaticAlgorithms};
use hashcat_launcher::types::ResourceCategory;
use tempfile::TempDir;

/// A launcher directory layout inside a temporary directory.
///
/// Created with every resource directory present and no files in them.
pub struct ResourceTree {
    dir: TempDir,
    pub config: LauncherConfig,
}

impl ResourceTree {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = LauncherConfig::with_root(dir.path());
        for d in config.paths.directories() {
            fs::create_dir_all(d).expect("create resource dir");
        }
        Self { dir, config }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn paths(&self) -> &LauncherPaths {
        &self.config.paths
    }

    pub fn add(&self, category: ResourceCategory, name: &str, contents: &str) -> PathBuf {
        let path = self.config.paths.category_dir(category).join(name);
        fs::write(&path, contents).expect("write resource file");
        path
    }

    pub fn add_hashes(&self, name: &str, contents: &str) -> PathBuf {
        self.add(ResourceCategory::Hashes, name, contents)
    }

    pub fn add_dictionary(&self, name: &str, contents: &str) -> PathBuf {
        self.add(ResourceCategory::Dictionaries, name, contents)
    }

    pub fn add_rule(&self, name: &str, contents: &str) -> PathBuf {
        self.add(ResourceCategory::Rules, name, contents)
    }

    pub fn add_mask(&self, name: &str, contents: &str) -> PathBuf {
        self.add(ResourceCategory::Masks, name, contents)
    }

    /// Install an executable shell script as the tool binary.
    #[cfg(unix)]
    pub fn install_tool_script(&self, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.config.paths.binary.clone();
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write tool script");
        let mut perms = fs::metadata(&path).expect("stat tool script").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("chmod tool script");
        path
    }

    /// Registry over this tree on the real filesystem with a fixed catalog.
    pub fn registry(&self, algorithms: Vec<Algorithm>) -> ResourceRegistry {
        ResourceRegistry::new(
            &self.config.paths,
            &self.config.watch.exclude,
            Arc::new(RealFileSystem),
            Arc::new(StaticAlgorithms(algorithms)),
        )
        .expect("build registry")
    }

    /// Registry scanned once.
    pub fn scanned_registry(&self, algorithms: Vec<Algorithm>) -> Arc<ResourceRegistry> {
        let registry = self.registry(algorithms);
        registry.scan().expect("initial scan");
        Arc::new(registry)
    }
}

impl Default for ResourceTree {
    fn default() -> Self {
        Self::new()
    }
}

/// A small catalog covering the ids used in tests.
pub fn sample_algorithms() -> Vec<Algorithm> {
    vec![
        Algorithm::new("0", "MD5", "Raw Hash"),
        Algorithm::new("100", "SHA1", "Raw Hash"),
        Algorithm::new("1000", "NTLM", "Operating System"),
    ]
}

/// Builder for `TaskRequest`. Defaults to an MD5 dictionary attack on a
/// literal hash with `rockyou.txt`.
pub struct TaskRequestBuilder {
    request: TaskRequest,
}

impl TaskRequestBuilder {
    pub fn new() -> Self {
        Self {
            request: TaskRequest {
                id: None,
                hashes: HashTarget::Literal("5f4dcc3b5aa765d61d8327deb882cf99".to_string()),
                algorithm: "0".to_string(),
                attack: AttackSpec::Dictionary {
                    dictionaries: vec!["rockyou.txt".to_string()],
                    rules: Vec::new(),
                },
                auto_start: true,
            },
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.request.id = Some(id.to_string());
        self
    }

    pub fn hash(mut self, hash: &str) -> Self {
        self.request.hashes = HashTarget::Literal(hash.to_string());
        self
    }

    pub fn hash_set(mut self, name: &str) -> Self {
        self.request.hashes = HashTarget::Set(name.to_string());
        self
    }

    pub fn algorithm(mut self, algorithm: &str) -> Self {
        self.request.algorithm = algorithm.to_string();
        self
    }

    pub fn dictionary(mut self, dictionaries: &[&str], rules: &[&str]) -> Self {
        self.request.attack = AttackSpec::Dictionary {
            dictionaries: dictionaries.iter().map(|s| s.to_string()).collect(),
            rules: rules.iter().map(|s| s.to_string()).collect(),
        };
        self
    }

    pub fn mask(mut self, mask: &str) -> Self {
        self.request.attack = AttackSpec::Mask {
            mask: MaskSpec::Literal(mask.to_string()),
        };
        self
    }

    pub fn attack(mut self, attack: AttackSpec) -> Self {
        self.request.attack = attack;
        self
    }

    pub fn manual_start(mut self) -> Self {
        self.request.auto_start = false;
        self
    }

    pub fn build(self) -> TaskRequest {
        self.request
    }
}

impl Default for TaskRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
