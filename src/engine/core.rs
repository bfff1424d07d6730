// src/engine/core.rs

//! Pure task model.
//!
//! Task state, the allowed transitions, the journal and the snapshot type.
//! Nothing in here touches channels, processes or the clock except through
//! explicit `DateTime` arguments, so the transition rules can be tested
//! without Tokio.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::exec::{CancelReason, Progress, Recovered, ResolvedJob};

/// Canonical task identity type used throughout the engine.
pub type TaskId = String;

/// Lifecycle state of a task.
///
/// ```text
/// Created -> PreProcessing -> Running -> PostProcessing -> Succeeded
///    |             |                           |---------> Failed
///    |             |-> Failed                  `---------> Cancelled
///    `-------------`-> Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Created,
    PreProcessing,
    Running,
    PostProcessing,
    Succeeded,
    Failed,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed | TaskState::Cancelled
        )
    }

    /// Whether `self -> next` is a legal step. Transitions only move forward
    /// and nothing leaves a terminal state.
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        use TaskState::*;
        matches!(
            (self, next),
            (Created, PreProcessing)
                | (Created, Cancelled)
                | (PreProcessing, Running)
                | (PreProcessing, Failed)
                | (PreProcessing, Cancelled)
                | (Running, PostProcessing)
                | (PostProcessing, Succeeded)
                | (PostProcessing, Failed)
                | (PostProcessing, Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Created => "created",
            TaskState::PreProcessing => "pre_processing",
            TaskState::Running => "running",
            TaskState::PostProcessing => "post_processing",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
            TaskState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attempted a transition the state machine does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: TaskState,
    pub to: TaskState,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid transition {} -> {}", self.from, self.to)
    }
}

impl std::error::Error for InvalidTransition {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

/// Detail attached to a task that ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureDetail {
    /// The process could not be started.
    Launch { message: String },
    /// The pre-process hook rejected the task.
    PreProcess { message: String },
    /// The process exited nonzero.
    Runtime {
        exit_code: Option<i32>,
        stderr_tail: String,
    },
}

impl fmt::Display for FailureDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureDetail::Launch { message } => write!(f, "launch failed: {message}"),
            FailureDetail::PreProcess { message } => write!(f, "pre-process failed: {message}"),
            FailureDetail::Runtime {
                exit_code,
                stderr_tail,
            } => {
                match exit_code {
                    Some(code) => write!(f, "exited with code {code}")?,
                    None => f.write_str("terminated without exit code")?,
                }
                if !stderr_tail.is_empty() {
                    write!(f, ": {stderr_tail}")?;
                }
                Ok(())
            }
        }
    }
}

/// One requested execution of the external tool and its tracked state.
///
/// Owned exclusively by the task manager.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub job: ResolvedJob,
    pub args: Vec<String>,
    state: TaskState,
    pub progress: Progress,
    pub recovered: Vec<Recovered>,
    pub failure: Option<FailureDetail>,
    pub cancel_reason: Option<CancelReason>,
    pub exported_to: Option<std::path::PathBuf>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    journal: VecDeque<JournalEntry>,
    journal_limit: usize,
}

impl Task {
    pub fn new(
        id: TaskId,
        job: ResolvedJob,
        args: Vec<String>,
        journal_limit: usize,
        now: DateTime<Utc>,
    ) -> Self {
        let mut task = Self {
            id,
            job,
            args,
            state: TaskState::Created,
            progress: Progress::default(),
            recovered: Vec::new(),
            failure: None,
            cancel_reason: None,
            exported_to: None,
            created_at: now,
            started_at: None,
            finished_at: None,
            journal: VecDeque::new(),
            journal_limit,
        };
        task.log(now, "task created");
        task
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Move to `next`, stamping start/end times and journaling the step.
    pub fn transition(
        &mut self,
        next: TaskState,
        now: DateTime<Utc>,
    ) -> Result<(), InvalidTransition> {
        if !self.state.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        if next == TaskState::Running {
            self.started_at = Some(now);
        }
        if next.is_terminal() {
            self.finished_at = Some(now);
        }
        self.log(now, format!("{} -> {}", self.state, next));
        self.state = next;
        Ok(())
    }

    /// Append to the journal, dropping the oldest entries past the limit.
    pub fn log(&mut self, now: DateTime<Utc>, message: impl Into<String>) {
        if self.journal_limit == 0 {
            return;
        }
        while self.journal.len() >= self.journal_limit {
            self.journal.pop_front();
        }
        self.journal.push_back(JournalEntry {
            at: now,
            message: message.into(),
        });
    }

    pub fn journal(&self) -> impl Iterator<Item = &JournalEntry> {
        self.journal.iter()
    }

    /// Record a recovered value; repeated reports of the same hash are kept
    /// once.
    pub fn add_recovered(&mut self, recovered: Recovered) -> bool {
        if self.recovered.iter().any(|r| r.hash == recovered.hash) {
            return false;
        }
        self.recovered.push(recovered);
        true
    }

    pub fn snapshot(&self) -> TaskUpdate {
        TaskUpdate {
            id: self.id.clone(),
            state: self.state,
            algorithm: self.job.algorithm.clone(),
            attack_mode: self.job.attack.mode().code(),
            args: self.args.clone(),
            progress: self.progress.clone(),
            recovered: self.recovered.clone(),
            failure: self.failure.clone(),
            cancel_reason: self.cancel_reason,
            exported_to: self.exported_to.clone(),
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
            journal: self.journal.iter().cloned().collect(),
        }
    }
}

/// Immutable snapshot of a task's externally visible fields, passed by
/// value to observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskUpdate {
    pub id: TaskId,
    pub state: TaskState,
    pub algorithm: String,
    pub attack_mode: u8,
    pub args: Vec<String>,
    pub progress: Progress,
    pub recovered: Vec<Recovered>,
    pub failure: Option<FailureDetail>,
    pub cancel_reason: Option<CancelReason>,
    pub exported_to: Option<std::path::PathBuf>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub journal: Vec<JournalEntry>,
}

impl TaskUpdate {
    /// JSON form handed to a presentation layer.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

static TASK_SEQ: AtomicU64 = AtomicU64::new(1);

/// `<YYYYMMDDHHMMSS>-<seq>`; the sequence is process-wide, so ids never
/// repeat within one run.
pub fn generate_task_id(now: DateTime<Utc>) -> TaskId {
    let seq = TASK_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}", now.format("%Y%m%d%H%M%S"), seq)
}
