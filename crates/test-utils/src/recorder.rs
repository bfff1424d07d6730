use std::sync::{Arc, Mutex};

use hashcat_launcher::bridge::TaskObserver;
use hashcat_launcher::engine::{TaskId, TaskState, TaskUpdate};
use hashcat_launcher::types::ResourceCategory;

/// One delivered notification.
#[derive(Debug, Clone)]
pub enum Recorded {
    Added(TaskUpdate),
    Updated(TaskUpdate),
    PreProcess(TaskUpdate),
    PostProcess(TaskUpdate),
    Deleted(TaskId),
    Watcher(ResourceCategory),
}

impl Recorded {
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Recorded::Added(u)
            | Recorded::Updated(u)
            | Recorded::PreProcess(u)
            | Recorded::PostProcess(u) => Some(&u.id),
            Recorded::Deleted(id) => Some(id),
            Recorded::Watcher(_) => None,
        }
    }

    /// Short label, with the snapshot state for `updated`.
    pub fn label(&self) -> String {
        match self {
            Recorded::Added(_) => "added".to_string(),
            Recorded::Updated(u) => format!("updated:{}", u.state),
            Recorded::PreProcess(_) => "preprocess".to_string(),
            Recorded::PostProcess(_) => "postprocess".to_string(),
            Recorded::Deleted(_) => "deleted".to_string(),
            Recorded::Watcher(c) => format!("watcher:{c}"),
        }
    }
}

/// Observer that keeps every notification it receives, in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<Recorded>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: Recorded) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().clone()
    }

    pub fn for_task(&self, id: &str) -> Vec<Recorded> {
        self.events()
            .into_iter()
            .filter(|e| e.task_id() == Some(id))
            .collect()
    }

    /// Labels for one task with consecutive progress updates collapsed to a
    /// single `updated:running`.
    pub fn lifecycle(&self, id: &str) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for label in self.for_task(id).iter().map(Recorded::label) {
            if label == "updated:running" && labels.last().is_some_and(|l| l == &label) {
                continue;
            }
            labels.push(label);
        }
        labels
    }

    /// Updates for `id` whose snapshot state is terminal.
    pub fn terminal_updates(&self, id: &str) -> Vec<TaskUpdate> {
        self.for_task(id)
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Updated(u) if u.state.is_terminal() => Some(u),
                _ => None,
            })
            .collect()
    }

    pub fn watcher_events(&self) -> Vec<ResourceCategory> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Watcher(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    pub fn saw_state(&self, id: &str, state: TaskState) -> bool {
        self.for_task(id).iter().any(|e| match e {
            Recorded::Added(u)
            | Recorded::Updated(u)
            | Recorded::PreProcess(u)
            | Recorded::PostProcess(u) => u.state == state,
            _ => false,
        })
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl TaskObserver for RecordingObserver {
    fn on_task_added(&self, update: TaskUpdate) {
        self.push(Recorded::Added(update));
    }

    fn on_task_updated(&self, update: TaskUpdate) {
        self.push(Recorded::Updated(update));
    }

    fn on_task_preprocess(&self, update: TaskUpdate) {
        self.push(Recorded::PreProcess(update));
    }

    fn on_task_postprocess(&self, update: TaskUpdate) {
        self.push(Recorded::PostProcess(update));
    }

    fn on_task_deleted(&self, task_id: TaskId) {
        self.push(Recorded::Deleted(task_id));
    }

    fn on_watcher_event(&self, category: ResourceCategory) {
        self.push(Recorded::Watcher(category));
    }
}
