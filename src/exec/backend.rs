// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The task manager talks to an `ExecutorBackend` instead of spawning
//! processes itself. Production code uses [`super::HashcatExecutor`]; tests
//! provide a backend that replays scripted output without a real binary.
//!
//! Running a task is split in two phases so the manager can tell a launch
//! failure apart from a runtime failure:
//! - [`ExecutorBackend::launch`] returns once the process has been accepted
//!   by the OS (or fails with `LaunchError`);
//! - [`RunHandle::wait`] drives the running process to completion.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use crate::errors::Result;
use crate::exec::progress::ParsedLine;

/// Fully resolved invocation of the external tool for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub task_id: String,
    pub binary: PathBuf,
    pub working_dir: PathBuf,
    pub args: Vec<String>,
    pub max_runtime: Option<Duration>,
    pub stderr_tail_lines: usize,
}

/// Something observed on the child's output streams.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    Parsed(ParsedLine),
    Stderr(String),
}

/// Where a running process reports what it printed. Sending never blocks the
/// output reader.
pub type ProgressSink = mpsc::UnboundedSender<RunEvent>;

/// Interactive commands understood by the tool while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunControl {
    /// Print a fresh status block.
    Refresh,
    Pause,
    Resume,
    /// Skip the current attack.
    Bypass,
    /// Stop at the next restore point.
    Checkpoint,
    Quit,
}

impl RunControl {
    /// Key written to the child's stdin.
    pub fn key(&self) -> char {
        match self {
            RunControl::Refresh => 's',
            RunControl::Pause => 'p',
            RunControl::Resume => 'r',
            RunControl::Bypass => 'b',
            RunControl::Checkpoint => 'c',
            RunControl::Quit => 'q',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// Explicit stop or delete request.
    User,
    /// `max_runtime` elapsed.
    Timeout,
}

/// How a launched process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    Failed {
        exit_code: Option<i32>,
        stderr_tail: String,
    },
    Cancelled(CancelReason),
}

/// Inputs a running process listens to.
#[derive(Debug)]
pub struct RunChannels {
    pub cancel: oneshot::Receiver<CancelReason>,
    pub control: mpsc::UnboundedReceiver<RunControl>,
}

/// Trait abstracting how a task's process is started.
pub trait ExecutorBackend: Send + Sync {
    /// Start the process. Returns `LaunchError` if it could not be started;
    /// in that case nothing has run.
    fn launch(&self, invocation: Invocation, sink: ProgressSink) -> Result<Box<dyn RunHandle>>;
}

/// A started process.
pub trait RunHandle: Send {
    /// Wait for the process to end, honouring cancellation, interactive
    /// control and the runtime limit. Every event the process produced has
    /// been sent to the sink by the time the future resolves.
    fn wait(self: Box<Self>, channels: RunChannels) -> Pin<Box<dyn Future<Output = RunOutcome> + Send>>;
}
