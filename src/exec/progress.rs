// src/exec/progress.rs

//! Parsing of the tool's line-oriented output.
//!
//! The matching rules are the most version-sensitive part of the launcher,
//! so they live behind [`ProgressParser`] and never see process handles or
//! task state.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Progress fields of a task. In a parsed line, `None` means "not reported
/// by this line"; [`Progress::merge`] keeps the previous value for those.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Progress {
    /// Tool status label (`running`, `paused`, `cracked`, `exhausted`, ...).
    pub status: Option<String>,
    pub percent: Option<f64>,
    /// Keyspace position as `(done, total)`.
    pub progress: Option<(u64, u64)>,
    /// Total speed over all devices, hashes per second.
    pub speed: Option<f64>,
    /// Human-readable remaining time as printed by the tool.
    pub eta: Option<String>,
    /// Estimated stop time, unix seconds.
    pub estimated_stop: Option<i64>,
    /// Start time reported by the tool, unix seconds.
    pub time_start: Option<i64>,
    pub recovered_hashes: Option<(u64, u64)>,
    pub rejected: Option<u64>,
    pub target: Option<String>,
    pub guess: Option<Guess>,
}

/// Candidate source currently being worked on: the base (dictionary or
/// mask) and the modifier (rules or the hybrid half), each with its
/// position among the attack's inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guess {
    pub guess_base: Option<String>,
    #[serde(default)]
    pub guess_base_offset: u64,
    #[serde(default)]
    pub guess_base_count: u64,
    pub guess_mod: Option<String>,
    #[serde(default)]
    pub guess_mod_offset: u64,
    #[serde(default)]
    pub guess_mod_count: u64,
}

impl Progress {
    pub fn merge(&mut self, update: Progress) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if update.$field.is_some() { self.$field = update.$field; })*
            };
        }
        take!(
            status,
            percent,
            progress,
            speed,
            eta,
            estimated_stop,
            time_start,
            recovered_hashes,
            rejected,
            target,
            guess
        );
    }

    pub fn is_empty(&self) -> bool {
        *self == Progress::default()
    }
}

/// A recovered `<hash>:<plain>` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recovered {
    pub hash: String,
    pub plain: String,
}

/// What a single output line meant.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    Status(Progress),
    Recovered(Recovered),
}

/// Line classifier for the tool's stdout.
pub trait ProgressParser: Send + Sync {
    /// `None` for lines that carry nothing recognisable. Must not panic on
    /// arbitrary input.
    fn parse_line(&self, line: &str) -> Option<ParsedLine>;
}

/// Status code to label mapping of the tool's `status` field.
pub fn status_label(code: u8) -> &'static str {
    match code {
        0 => "init",
        1 => "autotune",
        2 => "selftest",
        3 => "running",
        4 => "paused",
        5 => "exhausted",
        6 => "cracked",
        7 => "aborted",
        8 => "quit",
        9 => "bypass",
        10 => "aborted_checkpoint",
        11 => "aborted_runtime",
        13 => "error",
        14 => "aborted_finish",
        16 => "autodetect",
        _ => "unknown",
    }
}

#[derive(Debug, Deserialize)]
struct StatusJson {
    status: Option<u8>,
    target: Option<String>,
    progress: Option<Vec<u64>>,
    recovered_hashes: Option<Vec<u64>>,
    rejected: Option<u64>,
    devices: Option<Vec<DeviceJson>>,
    guess: Option<Guess>,
    time_start: Option<i64>,
    estimated_stop: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct DeviceJson {
    #[serde(default)]
    speed: f64,
}

fn pair(v: Option<Vec<u64>>) -> Option<(u64, u64)> {
    match v.as_deref() {
        Some([a, b, ..]) => Some((*a, *b)),
        _ => None,
    }
}

fn percent_of((done, total): (u64, u64)) -> Option<f64> {
    (total > 0).then(|| done as f64 * 100.0 / total as f64)
}

static STATUS_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Status\.+:\s*(.+?)\s*$").expect("valid regex"));
static PROGRESS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Progress\.+:\s*(\d+)/(\d+)\s*\(\s*(\d+(?:\.\d+)?)%\)").expect("valid regex")
});
static SPEED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Speed\.#(?:\*|\d+)\.+:\s*(\d+(?:\.\d+)?)\s*([kMGTP]?)H/s").expect("valid regex")
});
static ETA_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Time\.Estimated\.+:\s*(.+?)\s*$").expect("valid regex"));
static RECOVERED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Recovered\.+:\s*(\d+)/(\d+)").expect("valid regex"));
static TARGET_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Hash\.Target\.+:\s*(.+?)\s*$").expect("valid regex"));
static CRACKED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<hash>[0-9A-Fa-f]{16,}|\$[^\s:]+):(?P<plain>.*)$").expect("valid regex")
});

/// Parser for the external recovery tool's output: `--status-json` lines,
/// the human-readable status block, and `<hash>:<plain>` result lines.
#[derive(Debug, Clone, Default)]
pub struct HashcatOutputParser;

impl HashcatOutputParser {
    fn parse_json(line: &str) -> Option<ParsedLine> {
        let raw: StatusJson = serde_json::from_str(line).ok()?;
        let progress = pair(raw.progress);
        let speed = raw
            .devices
            .map(|devices| devices.iter().map(|d| d.speed).sum::<f64>());

        let update = Progress {
            status: raw.status.map(|c| status_label(c).to_string()),
            percent: progress.and_then(percent_of),
            progress,
            speed,
            eta: None,
            estimated_stop: raw.estimated_stop,
            time_start: raw.time_start,
            recovered_hashes: pair(raw.recovered_hashes),
            rejected: raw.rejected,
            target: raw.target,
            guess: raw.guess,
        };
        (!update.is_empty()).then_some(ParsedLine::Status(update))
    }

    fn parse_text(line: &str) -> Option<ParsedLine> {
        let status = |update: Progress| Some(ParsedLine::Status(update));

        if let Some(c) = STATUS_LINE.captures(line) {
            return status(Progress {
                status: Some(c[1].to_lowercase()),
                ..Default::default()
            });
        }
        if let Some(c) = PROGRESS_LINE.captures(line) {
            let done = c[1].parse().ok()?;
            let total = c[2].parse().ok()?;
            return status(Progress {
                progress: Some((done, total)),
                percent: c[3].parse().ok(),
                ..Default::default()
            });
        }
        if let Some(c) = SPEED_LINE.captures(line) {
            let value: f64 = c[1].parse().ok()?;
            let scale = match &c[2] {
                "k" => 1e3,
                "M" => 1e6,
                "G" => 1e9,
                "T" => 1e12,
                "P" => 1e15,
                _ => 1.0,
            };
            return status(Progress {
                speed: Some(value * scale),
                ..Default::default()
            });
        }
        if let Some(c) = ETA_LINE.captures(line) {
            return status(Progress {
                eta: Some(c[1].to_string()),
                ..Default::default()
            });
        }
        if let Some(c) = RECOVERED_LINE.captures(line) {
            let done = c[1].parse().ok()?;
            let total = c[2].parse().ok()?;
            return status(Progress {
                recovered_hashes: Some((done, total)),
                ..Default::default()
            });
        }
        if let Some(c) = TARGET_LINE.captures(line) {
            return status(Progress {
                target: Some(c[1].to_string()),
                ..Default::default()
            });
        }
        if let Some(c) = CRACKED_LINE.captures(line) {
            return Some(ParsedLine::Recovered(Recovered {
                hash: c["hash"].to_string(),
                plain: c["plain"].to_string(),
            }));
        }
        None
    }
}

impl ProgressParser for HashcatOutputParser {
    fn parse_line(&self, line: &str) -> Option<ParsedLine> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim_start().starts_with('{') {
            return Self::parse_json(line.trim());
        }
        Self::parse_text(line.trim_start())
    }
}
