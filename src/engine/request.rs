// src/engine/request.rs

//! Task requests and their validation against the resource registry.

use serde::{Deserialize, Serialize};

use crate::errors::{LauncherError, Result};
use crate::exec::{ResolvedAttack, ResolvedJob, ResolvedMask, ResolvedTarget};
use crate::registry::ResourceRegistry;
use crate::types::{AttackMode, ResourceCategory};

/// What to attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashTarget {
    /// Name of a file in the hashes inventory.
    Set(String),
    /// A single hash passed directly on the command line.
    Literal(String),
}

/// A mask given by name from the masks inventory or as a literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskSpec {
    File(String),
    Literal(String),
}

/// Attack parameters, referring to resources by display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AttackSpec {
    Dictionary {
        dictionaries: Vec<String>,
        #[serde(default)]
        rules: Vec<String>,
    },
    Combinator {
        left: String,
        right: String,
    },
    Mask {
        mask: MaskSpec,
    },
    HybridDictMask {
        dictionary: String,
        mask: MaskSpec,
    },
    HybridMaskDict {
        mask: MaskSpec,
        dictionary: String,
    },
}

impl AttackSpec {
    pub fn mode(&self) -> AttackMode {
        match self {
            AttackSpec::Dictionary { .. } => AttackMode::Dictionary,
            AttackSpec::Combinator { .. } => AttackMode::Combinator,
            AttackSpec::Mask { .. } => AttackMode::Mask,
            AttackSpec::HybridDictMask { .. } => AttackMode::HybridDictMask,
            AttackSpec::HybridMaskDict { .. } => AttackMode::HybridMaskDict,
        }
    }
}

/// A user request for one execution of the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequest {
    /// Caller-chosen identity; generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub hashes: HashTarget,
    pub algorithm: String,
    pub attack: AttackSpec,
    /// Start driving the task immediately after it is added.
    #[serde(default = "default_auto_start")]
    pub auto_start: bool,
}

fn default_auto_start() -> bool {
    true
}

impl TaskRequest {
    /// Check every reference against the current inventories and resolve
    /// display names to paths.
    pub fn resolve(&self, registry: &ResourceRegistry) -> Result<ResolvedJob> {
        if let Some(id) = &self.id {
            validate_id(id)?;
        }

        let algorithm = self.algorithm.trim();
        if algorithm.is_empty() || !algorithm.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LauncherError::ValidationError(format!(
                "algorithm must be a numeric hash type, got {:?}",
                self.algorithm
            )));
        }
        // An empty catalog means the tool could not be queried; the launch
        // attempt reports that instead.
        if !registry.algorithms().is_empty() && !registry.has_algorithm(algorithm) {
            return Err(LauncherError::ValidationError(format!(
                "unknown algorithm {algorithm}"
            )));
        }

        let hashes = match &self.hashes {
            HashTarget::Set(name) => {
                ResolvedTarget::File(lookup(registry, ResourceCategory::Hashes, name)?)
            }
            HashTarget::Literal(value) => {
                let value = value.trim();
                if value.is_empty() {
                    return Err(LauncherError::ValidationError("empty hash".to_string()));
                }
                ResolvedTarget::Literal(value.to_string())
            }
        };

        let dict = |name: &str| lookup(registry, ResourceCategory::Dictionaries, name);
        let mask = |spec: &MaskSpec| -> Result<ResolvedMask> {
            match spec {
                MaskSpec::File(name) => Ok(ResolvedMask::File(lookup(
                    registry,
                    ResourceCategory::Masks,
                    name,
                )?)),
                MaskSpec::Literal(m) if m.trim().is_empty() => {
                    Err(LauncherError::ValidationError("empty mask".to_string()))
                }
                MaskSpec::Literal(m) => Ok(ResolvedMask::Literal(m.clone())),
            }
        };

        let attack = match &self.attack {
            AttackSpec::Dictionary {
                dictionaries,
                rules,
            } => {
                if dictionaries.is_empty() {
                    return Err(LauncherError::ValidationError(
                        "dictionary attack needs at least one dictionary".to_string(),
                    ));
                }
                ResolvedAttack::Dictionary {
                    dictionaries: dictionaries
                        .iter()
                        .map(|d| dict(d.as_str()))
                        .collect::<Result<_>>()?,
                    rules: rules
                        .iter()
                        .map(|r| lookup(registry, ResourceCategory::Rules, r))
                        .collect::<Result<_>>()?,
                }
            }
            AttackSpec::Combinator { left, right } => ResolvedAttack::Combinator {
                left: dict(left.as_str())?,
                right: dict(right.as_str())?,
            },
            AttackSpec::Mask { mask: m } => ResolvedAttack::Mask { mask: mask(m)? },
            AttackSpec::HybridDictMask {
                dictionary,
                mask: m,
            } => ResolvedAttack::HybridDictMask {
                dictionary: dict(dictionary.as_str())?,
                mask: mask(m)?,
            },
            AttackSpec::HybridMaskDict {
                mask: m,
                dictionary,
            } => ResolvedAttack::HybridMaskDict {
                mask: mask(m)?,
                dictionary: dict(dictionary.as_str())?,
            },
        };

        Ok(ResolvedJob {
            hashes,
            algorithm: algorithm.to_string(),
            attack,
        })
    }
}

fn lookup(
    registry: &ResourceRegistry,
    category: ResourceCategory,
    name: &str,
) -> Result<std::path::PathBuf> {
    registry
        .find(category, name)
        .map(|r| r.path)
        .ok_or_else(|| LauncherError::ValidationError(format!("unknown {category} entry {name:?}")))
}

/// Ids end up in file names and in `--session=`.
fn validate_id(id: &str) -> Result<()> {
    let ok = !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !id.starts_with('.');
    if ok {
        Ok(())
    } else {
        Err(LauncherError::ValidationError(format!(
            "task id {id:?} must be 1-128 characters of [A-Za-z0-9._-] not starting with '.'"
        )))
    }
}
