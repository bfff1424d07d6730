// src/engine/runtime.rs

//! Per-task driver.
//!
//! One driver runs per started task and is the only writer of that task's
//! lifecycle state besides cancellation of a never-started task. Every state
//! change and its notification happen inside one critical section of the
//! manager lock.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::errors::{LauncherError, Result};
use crate::exec::{
    CancelReason, Invocation, ParsedLine, RunChannels, RunEvent, RunOutcome,
};

use super::core::{FailureDetail, Task, TaskId, TaskState};
use super::manager::{Entry, Inner};

/// Run `f` against the task's entry under the manager lock. `None` if the
/// task was removed meanwhile.
fn with_entry<R>(inner: &Inner, id: &str, f: impl FnOnce(&mut Entry) -> R) -> Option<R> {
    let mut tasks = inner.lock();
    tasks.get_mut(id).map(f)
}

/// Transition and emit `updated` for the new snapshot.
fn finish(inner: &Inner, id: &str, state: TaskState, apply: impl FnOnce(&mut Task)) {
    with_entry(inner, id, |entry| {
        apply(&mut entry.task);
        if let Some(update) = entry.transition(state) {
            info!(task = %id, state = %state, "task finished");
            inner.bridge.task_updated(update);
        }
    });
}

pub(super) async fn drive(inner: Arc<Inner>, id: TaskId, channels: RunChannels) {
    // Created -> PreProcessing
    let task = with_entry(&inner, &id, |entry| {
        let update = entry.transition(TaskState::PreProcessing)?;
        inner.bridge.task_preprocess(update);
        Some(entry.task.clone())
    })
    .flatten();
    let Some(task) = task else {
        debug!(task = %id, "task not startable; driver exiting");
        return;
    };

    let hooks = Arc::clone(&inner.hooks);
    let checked = task.clone();
    let pre = run_hook(&id, "pre-process", move || hooks.pre_process(&checked)).await;
    if let Err(err) = pre {
        warn!(task = %id, error = %err, "pre-process failed");
        finish(&inner, &id, TaskState::Failed, |t| {
            t.failure = Some(FailureDetail::PreProcess {
                message: err.to_string(),
            });
        });
        return;
    }

    let cancelled_early = with_entry(&inner, &id, |entry| entry.cancel_requested).unwrap_or(true);
    if cancelled_early {
        finish(&inner, &id, TaskState::Cancelled, |t| {
            t.cancel_reason = Some(CancelReason::User);
        });
        return;
    }

    let binary = inner.registry.hashcat().binary.clone();
    let working_dir = inner.registry.hashcat().dir.clone();
    let invocation = Invocation {
        task_id: id.clone(),
        binary,
        working_dir,
        args: task.args.clone(),
        max_runtime: inner.options.max_runtime,
        stderr_tail_lines: inner.options.stderr_tail_lines,
    };

    let (sink, mut events) = mpsc::unbounded_channel();
    let handle = match inner.executor.launch(invocation, sink) {
        Ok(handle) => handle,
        Err(err) => {
            warn!(task = %id, error = %err, "launch failed");
            finish(&inner, &id, TaskState::Failed, |t| {
                t.failure = Some(FailureDetail::Launch {
                    message: err.to_string(),
                });
            });
            return;
        }
    };

    // PreProcessing -> Running
    with_entry(&inner, &id, |entry| {
        if let Some(update) = entry.transition(TaskState::Running) {
            inner.bridge.task_updated(update);
        }
    });

    let wait = handle.wait(channels);
    tokio::pin!(wait);
    let outcome = loop {
        tokio::select! {
            Some(event) = events.recv() => apply_event(&inner, &id, event),
            outcome = &mut wait => break outcome,
        }
    };
    while let Ok(event) = events.try_recv() {
        apply_event(&inner, &id, event);
    }

    // Running -> PostProcessing
    let (terminal, task) = match with_entry(&inner, &id, |entry| {
        let terminal = match &outcome {
            RunOutcome::Succeeded => TaskState::Succeeded,
            RunOutcome::Failed {
                exit_code,
                stderr_tail,
            } => {
                entry.task.failure = Some(FailureDetail::Runtime {
                    exit_code: *exit_code,
                    stderr_tail: stderr_tail.clone(),
                });
                TaskState::Failed
            }
            RunOutcome::Cancelled(reason) => {
                entry.task.cancel_reason = Some(*reason);
                TaskState::Cancelled
            }
        };
        if let Some(update) = entry.transition(TaskState::PostProcessing) {
            inner.bridge.task_postprocess(update);
        }
        (terminal, entry.task.clone())
    }) {
        Some(next) => next,
        None => return,
    };

    let hooks = Arc::clone(&inner.hooks);
    let exported = run_hook(&id, "post-process", move || hooks.post_process(&task)).await;

    // PostProcessing -> terminal
    finish(&inner, &id, terminal, |t| match exported {
        Ok(path) => t.exported_to = path,
        Err(err) => {
            warn!(task = %t.id, error = %err, "post-process failed");
            t.log(Utc::now(), format!("post-process failed: {err}"));
        }
    });
}

/// Run a hook on the blocking pool. A panicking hook becomes an error so the
/// task still reaches a terminal state.
async fn run_hook<T, F>(id: &str, stage: &'static str, hook: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(hook).await {
        Ok(result) => result,
        Err(err) => {
            error!(task = %id, stage, error = %err, "hook did not complete");
            Err(LauncherError::Other(anyhow::anyhow!("{stage} hook panicked")))
        }
    }
}

fn apply_event(inner: &Inner, id: &str, event: RunEvent) {
    with_entry(inner, id, |entry| {
        let now = Utc::now();
        match event {
            RunEvent::Parsed(ParsedLine::Status(progress)) => {
                entry.task.progress.merge(progress);
                inner.bridge.task_updated(entry.task.snapshot());
            }
            RunEvent::Parsed(ParsedLine::Recovered(recovered)) => {
                debug!(task = %id, hash = %recovered.hash, "value recovered");
                entry.task.log(now, format!("recovered {}", recovered.hash));
                if entry.task.add_recovered(recovered) {
                    inner.bridge.task_updated(entry.task.snapshot());
                }
            }
            RunEvent::Stderr(line) => {
                entry.task.log(now, format!("stderr: {line}"));
            }
        }
    });
}
