// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::engine::{AttackSpec, HashTarget, MaskSpec, TaskRequest};
use crate::types::AttackMode;

/// Command-line arguments for `hashcat-launcher`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "hashcat-launcher",
    version,
    about = "Supervise runs of hashcat over a managed set of hashes, wordlists, rules and masks.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the launcher config file (TOML).
    ///
    /// Default: `Launcher.toml` in the current working directory. A missing
    /// file means "all defaults".
    #[arg(long, value_name = "PATH", default_value = "Launcher.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `HASHCAT_LAUNCHER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Scan resources, print the inventories and exit.
    #[arg(long)]
    pub dry_run: bool,

    /// Hash set (file name in the hashes directory) to attack.
    #[arg(long, value_name = "NAME", conflicts_with = "hash")]
    pub hashes: Option<String>,

    /// Single hash to attack.
    #[arg(long, value_name = "VALUE")]
    pub hash: Option<String>,

    /// Hash type id.
    #[arg(long, value_name = "ID", default_value = "0")]
    pub algorithm: String,

    /// Attack mode: dictionary, combinator, mask, hybrid-dict-mask,
    /// hybrid-mask-dict.
    #[arg(long, value_name = "MODE", default_value = "dictionary")]
    pub attack: AttackMode,

    /// Dictionary file name; repeat for several (combinator uses two).
    #[arg(long = "dictionary", value_name = "NAME")]
    pub dictionaries: Vec<String>,

    /// Rule file name; repeat for several.
    #[arg(long = "rule", value_name = "NAME")]
    pub rules: Vec<String>,

    /// Mask file name from the masks directory, or a literal mask.
    #[arg(long, value_name = "NAME|MASK")]
    pub mask: Option<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl CliArgs {
    /// The task described on the command line, if any. `is_mask_file`
    /// decides whether `--mask` names an inventory entry.
    pub fn task_request(
        &self,
        is_mask_file: impl Fn(&str) -> bool,
    ) -> Result<Option<TaskRequest>, String> {
        let hashes = match (&self.hashes, &self.hash) {
            (Some(name), _) => HashTarget::Set(name.clone()),
            (None, Some(value)) => HashTarget::Literal(value.clone()),
            (None, None) => return Ok(None),
        };

        let mask = || -> Result<MaskSpec, String> {
            let mask = self
                .mask
                .clone()
                .ok_or_else(|| format!("--mask is required for {:?} attacks", self.attack))?;
            Ok(if is_mask_file(&mask) {
                MaskSpec::File(mask)
            } else {
                MaskSpec::Literal(mask)
            })
        };
        let dictionary = |index: usize| -> Result<String, String> {
            self.dictionaries
                .get(index)
                .cloned()
                .ok_or_else(|| format!("--dictionary #{} is required for {:?} attacks", index + 1, self.attack))
        };

        let attack = match self.attack {
            AttackMode::Dictionary => AttackSpec::Dictionary {
                dictionaries: self.dictionaries.clone(),
                rules: self.rules.clone(),
            },
            AttackMode::Combinator => AttackSpec::Combinator {
                left: dictionary(0)?,
                right: dictionary(1)?,
            },
            AttackMode::Mask => AttackSpec::Mask { mask: mask()? },
            AttackMode::HybridDictMask => AttackSpec::HybridDictMask {
                dictionary: dictionary(0)?,
                mask: mask()?,
            },
            AttackMode::HybridMaskDict => AttackSpec::HybridMaskDict {
                mask: mask()?,
                dictionary: dictionary(0)?,
            },
        };

        Ok(Some(TaskRequest {
            id: None,
            hashes,
            algorithm: self.algorithm.clone(),
            attack,
            auto_start: true,
        }))
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
