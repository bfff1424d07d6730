// src/exec/args.rs

//! Deterministic argument vector construction.
//!
//! The same task id, resolved job and options always produce the same
//! argument vector; nothing here reads the clock, the environment or the
//! filesystem.

use std::path::PathBuf;

use serde::Serialize;

use crate::config::TaskOptions;
use crate::types::AttackMode;

/// Hash target after resolution against the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedTarget {
    File(PathBuf),
    Literal(String),
}

/// Mask operand after resolution: a `.hcmask` file or a literal mask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedMask {
    File(PathBuf),
    Literal(String),
}

impl ResolvedMask {
    fn file(&self) -> Option<&PathBuf> {
        match self {
            ResolvedMask::File(p) => Some(p),
            ResolvedMask::Literal(_) => None,
        }
    }

    fn to_arg(&self) -> String {
        match self {
            ResolvedMask::File(p) => p.display().to_string(),
            ResolvedMask::Literal(m) => m.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ResolvedAttack {
    Dictionary {
        dictionaries: Vec<PathBuf>,
        rules: Vec<PathBuf>,
    },
    Combinator {
        left: PathBuf,
        right: PathBuf,
    },
    Mask {
        mask: ResolvedMask,
    },
    HybridDictMask {
        dictionary: PathBuf,
        mask: ResolvedMask,
    },
    HybridMaskDict {
        mask: ResolvedMask,
        dictionary: PathBuf,
    },
}

impl ResolvedAttack {
    pub fn mode(&self) -> AttackMode {
        match self {
            ResolvedAttack::Dictionary { .. } => AttackMode::Dictionary,
            ResolvedAttack::Combinator { .. } => AttackMode::Combinator,
            ResolvedAttack::Mask { .. } => AttackMode::Mask,
            ResolvedAttack::HybridDictMask { .. } => AttackMode::HybridDictMask,
            ResolvedAttack::HybridMaskDict { .. } => AttackMode::HybridMaskDict,
        }
    }

    /// Every file the attack reads, in argument order.
    pub fn files(&self) -> Vec<&PathBuf> {
        match self {
            ResolvedAttack::Dictionary { dictionaries, rules } => {
                rules.iter().chain(dictionaries.iter()).collect()
            }
            ResolvedAttack::Combinator { left, right } => vec![left, right],
            ResolvedAttack::Mask { mask } => mask.file().into_iter().collect(),
            ResolvedAttack::HybridDictMask { dictionary, mask } => {
                std::iter::once(dictionary).chain(mask.file()).collect()
            }
            ResolvedAttack::HybridMaskDict { mask, dictionary } => {
                mask.file().into_iter().chain(std::iter::once(dictionary)).collect()
            }
        }
    }

    fn operands(&self) -> Vec<String> {
        let path = |p: &PathBuf| p.display().to_string();
        match self {
            ResolvedAttack::Dictionary { dictionaries, .. } => dictionaries.iter().map(path).collect(),
            ResolvedAttack::Combinator { left, right } => vec![path(left), path(right)],
            ResolvedAttack::Mask { mask } => vec![mask.to_arg()],
            ResolvedAttack::HybridDictMask { dictionary, mask } => vec![path(dictionary), mask.to_arg()],
            ResolvedAttack::HybridMaskDict { mask, dictionary } => vec![mask.to_arg(), path(dictionary)],
        }
    }
}

/// Everything the process runner needs to know about a task's attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedJob {
    pub hashes: ResolvedTarget,
    pub algorithm: String,
    pub attack: ResolvedAttack,
}

impl ResolvedJob {
    /// Every file the job reads (hash set first).
    pub fn files(&self) -> Vec<&PathBuf> {
        let mut files = Vec::new();
        if let ResolvedTarget::File(p) = &self.hashes {
            files.push(p);
        }
        files.extend(self.attack.files());
        files
    }
}

/// Build the argument vector for one task:
///
/// ```text
/// --session=<id> --hash-type=<algo> --attack-mode=<n>
/// --status --status-json --status-timer=<n>
/// [--rules-file=<path>]... [extra args]... <hash target> <operands>...
/// ```
pub fn build_args(task_id: &str, job: &ResolvedJob, options: &TaskOptions) -> Vec<String> {
    let mut args = vec![
        format!("--session={task_id}"),
        format!("--hash-type={}", job.algorithm),
        format!("--attack-mode={}", job.attack.mode().code()),
        "--status".to_string(),
        "--status-json".to_string(),
        format!("--status-timer={}", options.status_timer),
    ];

    if let ResolvedAttack::Dictionary { rules, .. } = &job.attack {
        args.extend(rules.iter().map(|r| format!("--rules-file={}", r.display())));
    }

    args.extend(options.extra_args.iter().cloned());

    args.push(match &job.hashes {
        ResolvedTarget::File(p) => p.display().to_string(),
        ResolvedTarget::Literal(h) => h.clone(),
    });

    args.extend(job.attack.operands());
    args
}
