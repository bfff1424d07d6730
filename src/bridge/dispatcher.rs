// src/bridge/dispatcher.rs

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, trace, warn};

use super::TaskObserver;
use crate::engine::{TaskId, TaskUpdate};
use crate::types::ResourceCategory;

/// One queued event.
#[derive(Debug)]
pub enum Notification {
    TaskAdded(TaskUpdate),
    TaskUpdated(TaskUpdate),
    TaskPreProcess(TaskUpdate),
    TaskPostProcess(TaskUpdate),
    TaskDeleted(TaskId),
    Watcher(ResourceCategory),
    /// Completed once everything queued before it has been delivered.
    Barrier(oneshot::Sender<()>),
}

type Observers = Arc<RwLock<Vec<Arc<dyn TaskObserver>>>>;

/// Cheap to clone; all clones feed the same queue. The dispatcher thread
/// exits once every clone is dropped and the queue is drained.
#[derive(Clone)]
pub struct NotificationBridge {
    tx: mpsc::UnboundedSender<Notification>,
    observers: Observers,
}

impl std::fmt::Debug for NotificationBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBridge")
            .field("observers", &self.observer_count())
            .finish()
    }
}

impl Default for NotificationBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationBridge {
    /// Create the bridge and start its dispatcher thread.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<Notification>();
        let observers: Observers = Arc::new(RwLock::new(Vec::new()));

        let thread_observers = Arc::clone(&observers);
        let spawned = thread::Builder::new()
            .name("notification-bridge".to_string())
            .spawn(move || dispatch_loop(rx, thread_observers));
        if let Err(e) = spawned {
            // Without a dispatcher every emit is dropped; the core keeps working.
            error!(error = %e, "failed to start notification dispatcher thread");
        }

        Self { tx, observers }
    }

    pub fn register(&self, observer: Arc<dyn TaskObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Queue an event. Never blocks; if the dispatcher is gone the event is
    /// dropped.
    pub fn emit(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            debug!("notification dispatcher stopped; dropping event");
        }
    }

    pub fn task_added(&self, update: TaskUpdate) {
        self.emit(Notification::TaskAdded(update));
    }

    pub fn task_updated(&self, update: TaskUpdate) {
        self.emit(Notification::TaskUpdated(update));
    }

    pub fn task_preprocess(&self, update: TaskUpdate) {
        self.emit(Notification::TaskPreProcess(update));
    }

    pub fn task_postprocess(&self, update: TaskUpdate) {
        self.emit(Notification::TaskPostProcess(update));
    }

    pub fn task_deleted(&self, task_id: TaskId) {
        self.emit(Notification::TaskDeleted(task_id));
    }

    pub fn watcher_event(&self, category: ResourceCategory) {
        self.emit(Notification::Watcher(category));
    }

    /// Wait until every event emitted before this call has been delivered.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        self.emit(Notification::Barrier(done_tx));
        let _ = done_rx.await;
    }
}

fn dispatch_loop(mut rx: mpsc::UnboundedReceiver<Notification>, observers: Observers) {
    debug!("notification dispatcher started");

    while let Some(notification) = rx.blocking_recv() {
        if let Notification::Barrier(done) = notification {
            let _ = done.send(());
            continue;
        }

        trace!(?notification, "dispatching");
        // Snapshot the list so observers may register others from a hook.
        let current: Vec<Arc<dyn TaskObserver>> = observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for observer in current {
            deliver(observer.as_ref(), &notification);
        }
    }

    debug!("notification dispatcher finished (all senders dropped)");
}

fn deliver(observer: &dyn TaskObserver, notification: &Notification) {
    let result = catch_unwind(AssertUnwindSafe(|| match notification {
        Notification::TaskAdded(u) => observer.on_task_added(u.clone()),
        Notification::TaskUpdated(u) => observer.on_task_updated(u.clone()),
        Notification::TaskPreProcess(u) => observer.on_task_preprocess(u.clone()),
        Notification::TaskPostProcess(u) => observer.on_task_postprocess(u.clone()),
        Notification::TaskDeleted(id) => observer.on_task_deleted(id.clone()),
        Notification::Watcher(category) => observer.on_watcher_event(*category),
        Notification::Barrier(_) => {}
    }));

    if result.is_err() {
        warn!(kind = notification.kind(), "observer panicked; event skipped for it");
    }
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::TaskAdded(_) => "task_added",
            Notification::TaskUpdated(_) => "task_updated",
            Notification::TaskPreProcess(_) => "task_preprocess",
            Notification::TaskPostProcess(_) => "task_postprocess",
            Notification::TaskDeleted(_) => "task_deleted",
            Notification::Watcher(_) => "watcher",
            Notification::Barrier(_) => "barrier",
        }
    }
}
