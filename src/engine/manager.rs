// src/engine/manager.rs

//! Task collection and public task operations.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::bridge::NotificationBridge;
use crate::config::TaskOptions;
use crate::errors::{LauncherError, Result};
use crate::exec::{build_args, CancelReason, ExecutorBackend, Progress, RunChannels, RunControl};
use crate::registry::ResourceRegistry;

use super::core::{generate_task_id, Task, TaskId, TaskState, TaskUpdate};
use super::hooks::TaskHooks;
use super::request::TaskRequest;
use super::runtime::drive;

/// Per-task bookkeeping next to the task itself.
pub(super) struct Entry {
    pub(super) task: Task,
    /// Handed to the driver when the task starts.
    pub(super) channels: Option<RunChannels>,
    /// Taken when cancellation is requested.
    pub(super) cancel: Option<oneshot::Sender<CancelReason>>,
    pub(super) control: mpsc::UnboundedSender<RunControl>,
    pub(super) cancel_requested: bool,
    pub(super) state: watch::Sender<TaskState>,
}

impl Entry {
    /// Apply a transition, publish the new state and return the snapshot.
    pub(super) fn transition(&mut self, next: TaskState) -> Option<TaskUpdate> {
        match self.task.transition(next, Utc::now()) {
            Ok(()) => {
                self.state.send_replace(next);
                Some(self.task.snapshot())
            }
            Err(e) => {
                warn!(task = %self.task.id, error = %e, "ignoring transition");
                None
            }
        }
    }
}

#[derive(Default)]
pub(super) struct Tasks {
    /// Creation order.
    order: Vec<TaskId>,
    entries: HashMap<TaskId, Entry>,
}

impl Tasks {
    pub(super) fn get_mut(&mut self, id: &str) -> Option<&mut Entry> {
        self.entries.get_mut(id)
    }
}

pub(super) struct Inner {
    pub(super) registry: Arc<ResourceRegistry>,
    pub(super) executor: Arc<dyn ExecutorBackend>,
    pub(super) hooks: Arc<dyn TaskHooks>,
    pub(super) bridge: NotificationBridge,
    pub(super) options: TaskOptions,
    tasks: Mutex<Tasks>,
}

impl Inner {
    /// Notifications are emitted while this lock is held so that emission
    /// order matches mutation order.
    pub(super) fn lock(&self) -> MutexGuard<'_, Tasks> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns every task and drives each through its lifecycle.
///
/// Cheap to clone; clones share the same collection. Operations that start
/// a task spawn its driver with `tokio::spawn` and must be called from
/// within a Tokio runtime.
#[derive(Clone)]
pub struct TaskManager {
    inner: Arc<Inner>,
}

impl fmt::Debug for TaskManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskManager")
            .field("tasks", &self.inner.lock().order.len())
            .finish_non_exhaustive()
    }
}

impl TaskManager {
    pub fn new(
        registry: Arc<ResourceRegistry>,
        executor: Arc<dyn ExecutorBackend>,
        hooks: Arc<dyn TaskHooks>,
        bridge: NotificationBridge,
        options: TaskOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                executor,
                hooks,
                bridge,
                options,
                tasks: Mutex::new(Tasks::default()),
            }),
        }
    }

    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.inner.registry
    }

    pub fn bridge(&self) -> &NotificationBridge {
        &self.inner.bridge
    }

    /// Validate `request`, register a new task in `Created` and, unless
    /// `auto_start` is off, start driving it.
    pub fn add_task(&self, request: TaskRequest) -> Result<TaskId> {
        let job = request.resolve(&self.inner.registry)?;
        let now = Utc::now();

        let mut tasks = self.inner.lock();
        let id = match request.id {
            Some(id) => {
                if tasks.entries.contains_key(&id) {
                    return Err(LauncherError::ConflictError(format!(
                        "task {id} already exists"
                    )));
                }
                id
            }
            None => loop {
                let id = generate_task_id(now);
                if !tasks.entries.contains_key(&id) {
                    break id;
                }
            },
        };

        let args = build_args(&id, &job, &self.inner.options);
        let task = Task::new(id.clone(), job, args, self.inner.options.journal_limit, now);

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(TaskState::Created);

        info!(task = %id, algorithm = %task.job.algorithm, mode = ?task.job.attack.mode(), "task added");
        self.inner.bridge.task_added(task.snapshot());

        tasks.order.push(id.clone());
        tasks.entries.insert(
            id.clone(),
            Entry {
                task,
                channels: Some(RunChannels {
                    cancel: cancel_rx,
                    control: control_rx,
                }),
                cancel: Some(cancel_tx),
                control: control_tx,
                cancel_requested: false,
                state: state_tx,
            },
        );

        if request.auto_start {
            self.spawn_driver(&mut tasks, &id);
        }
        Ok(id)
    }

    /// Start a task that was added with `auto_start = false`.
    pub fn start_task(&self, id: &str) -> Result<()> {
        let mut tasks = self.inner.lock();
        let entry = tasks
            .entries
            .get(id)
            .ok_or_else(|| LauncherError::NotFoundError(id.to_string()))?;
        if entry.task.state() != TaskState::Created || entry.channels.is_none() {
            return Err(LauncherError::ConflictError(format!(
                "task {id} is already {}",
                entry.task.state()
            )));
        }
        self.spawn_driver(&mut tasks, id);
        Ok(())
    }

    fn spawn_driver(&self, tasks: &mut Tasks, id: &str) {
        let Some(channels) = tasks.get_mut(id).and_then(|e| e.channels.take()) else {
            return;
        };
        debug!(task = %id, "spawning task driver");
        tokio::spawn(drive(Arc::clone(&self.inner), id.to_string(), channels));
    }

    /// Request cancellation without removing the task. No-op for terminal
    /// tasks.
    pub fn cancel_task(&self, id: &str) -> Result<()> {
        let mut tasks = self.inner.lock();
        let entry = tasks
            .get_mut(id)
            .ok_or_else(|| LauncherError::NotFoundError(id.to_string()))?;
        self.request_cancel(entry);
        Ok(())
    }

    fn request_cancel(&self, entry: &mut Entry) {
        let state = entry.task.state();
        if state.is_terminal() {
            return;
        }

        if state == TaskState::Created {
            // Never started: nothing to signal.
            entry.channels = None;
            entry.task.cancel_reason = Some(CancelReason::User);
            if let Some(update) = entry.transition(TaskState::Cancelled) {
                self.inner.bridge.task_updated(update);
            }
            return;
        }

        entry.cancel_requested = true;
        if let Some(cancel) = entry.cancel.take() {
            info!(task = %entry.task.id, state = %state, "cancellation requested");
            let _ = cancel.send(CancelReason::User);
        }
    }

    /// Forward an interactive command to a running task.
    pub fn control(&self, id: &str, command: RunControl) -> Result<()> {
        let tasks = self.inner.lock();
        let entry = tasks
            .entries
            .get(id)
            .ok_or_else(|| LauncherError::NotFoundError(id.to_string()))?;
        if entry.task.state() != TaskState::Running {
            return Err(LauncherError::ConflictError(format!(
                "task {id} is {}, not running",
                entry.task.state()
            )));
        }
        entry
            .control
            .send(command)
            .map_err(|_| LauncherError::ConflictError(format!("task {id} is no longer running")))
    }

    /// Merge new progress fields into a running task and notify observers.
    pub fn update_progress(&self, id: &str, progress: Progress) -> Result<()> {
        let mut tasks = self.inner.lock();
        let entry = tasks
            .get_mut(id)
            .ok_or_else(|| LauncherError::NotFoundError(id.to_string()))?;
        if entry.task.state() != TaskState::Running {
            return Err(LauncherError::ConflictError(format!(
                "task {id} is {}, not running",
                entry.task.state()
            )));
        }
        entry.task.progress.merge(progress);
        self.inner.bridge.task_updated(entry.task.snapshot());
        Ok(())
    }

    /// Remove a task. A non-terminal task is cancelled first and removed
    /// once it has reached its terminal state.
    pub async fn delete_task(&self, id: &str) -> Result<()> {
        let mut state_rx = {
            let mut tasks = self.inner.lock();
            let entry = tasks
                .get_mut(id)
                .ok_or_else(|| LauncherError::NotFoundError(id.to_string()))?;

            if entry.task.state().is_terminal() {
                self.remove_locked(&mut tasks, id);
                return Ok(());
            }
            self.request_cancel(entry);
            if entry.task.state().is_terminal() {
                self.remove_locked(&mut tasks, id);
                return Ok(());
            }
            entry.state.subscribe()
        };

        debug!(task = %id, "waiting for cancelled task to finish");
        let _ = state_rx.wait_for(|s| s.is_terminal()).await;

        let mut tasks = self.inner.lock();
        if tasks.entries.contains_key(id) {
            self.remove_locked(&mut tasks, id);
            Ok(())
        } else {
            Err(LauncherError::NotFoundError(id.to_string()))
        }
    }

    fn remove_locked(&self, tasks: &mut Tasks, id: &str) {
        tasks.entries.remove(id);
        tasks.order.retain(|t| t != id);
        info!(task = %id, "task deleted");
        self.inner.bridge.task_deleted(id.to_string());
    }

    pub fn get_task(&self, id: &str) -> Result<TaskUpdate> {
        self.inner
            .lock()
            .entries
            .get(id)
            .map(|e| e.task.snapshot())
            .ok_or_else(|| LauncherError::NotFoundError(id.to_string()))
    }

    /// Snapshots of every task, in creation order.
    pub fn list_tasks(&self) -> Vec<TaskUpdate> {
        let tasks = self.inner.lock();
        tasks
            .order
            .iter()
            .filter_map(|id| tasks.entries.get(id))
            .map(|e| e.task.snapshot())
            .collect()
    }

    /// Wait until the task reaches a terminal state and return its final
    /// snapshot.
    pub async fn wait_for_terminal(&self, id: &str) -> Result<TaskUpdate> {
        let mut state_rx = {
            let tasks = self.inner.lock();
            let entry = tasks
                .entries
                .get(id)
                .ok_or_else(|| LauncherError::NotFoundError(id.to_string()))?;
            entry.state.subscribe()
        };
        let _ = state_rx.wait_for(|s| s.is_terminal()).await;
        self.get_task(id)
    }
}
