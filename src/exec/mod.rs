// src/exec/mod.rs

//! Process runner.
//!
//! - `args`: deterministic argument vector for one task.
//! - `progress`: line parser for the tool's output.
//! - `backend`: the seam between the task manager and process execution.
//! - `runner`: the tokio-based production backend.

pub mod args;
pub mod backend;
pub mod progress;
pub mod runner;

pub use args::{build_args, ResolvedAttack, ResolvedJob, ResolvedMask, ResolvedTarget};
pub use backend::{
    CancelReason, ExecutorBackend, Invocation, ProgressSink, RunChannels, RunControl, RunEvent,
    RunHandle, RunOutcome,
};
pub use progress::{
    status_label, Guess, HashcatOutputParser, ParsedLine, Progress, ProgressParser, Recovered,
};
pub use runner::HashcatExecutor;
