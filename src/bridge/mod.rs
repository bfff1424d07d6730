// src/bridge/mod.rs

//! Notification bridge.
//!
//! The only surface through which lifecycle events leave the core. The
//! presentation layer (or a test) implements [`TaskObserver`] and registers
//! it with [`NotificationBridge::register`].
//!
//! Emitting never blocks: events are pushed onto a FIFO queue drained by a
//! single dispatcher thread. Because there is one queue and one consumer,
//! observers see events in exactly the order the core emitted them. Each
//! observer call is isolated with `catch_unwind`; a panicking observer is
//! logged and skipped.

mod dispatcher;

pub use dispatcher::{Notification, NotificationBridge};

use crate::engine::{TaskId, TaskUpdate};
use crate::types::ResourceCategory;

/// Hooks called by the core. Every method defaults to a no-op so observers
/// only implement what they care about.
pub trait TaskObserver: Send + Sync {
    fn on_task_added(&self, _update: TaskUpdate) {}

    /// Progress ticks and state transitions, including the single terminal
    /// snapshot (`update.state.is_terminal()`).
    fn on_task_updated(&self, _update: TaskUpdate) {}

    fn on_task_preprocess(&self, _update: TaskUpdate) {}

    fn on_task_postprocess(&self, _update: TaskUpdate) {}

    fn on_task_deleted(&self, _task_id: TaskId) {}

    /// A watched directory changed and its inventory was rescanned.
    fn on_watcher_event(&self, _category: ResourceCategory) {}
}
