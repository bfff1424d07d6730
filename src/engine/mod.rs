// src/engine/mod.rs

//! Task orchestration engine.
//!
//! This module ties together:
//! - the pure task model and its state machine ([`core`])
//! - request validation against the resource registry ([`request`])
//! - pre/post-process hooks ([`hooks`])
//! - the task collection and its public operations ([`manager`])
//! - the async per-task driver that runs the process ([`runtime`])
//!
//! Per task, observers see: added, preprocess, updated(Running),
//! updated(progress)*, postprocess, then exactly one updated snapshot whose
//! state is terminal, and finally deleted if the task is removed.

pub mod core;
pub mod hooks;
pub mod manager;
pub mod request;
mod runtime;

pub use core::{
    generate_task_id, FailureDetail, InvalidTransition, JournalEntry, Task, TaskId, TaskState,
    TaskUpdate,
};
pub use hooks::{DefaultHooks, NoopHooks, TaskHooks};
pub use manager::TaskManager;
pub use request::{AttackSpec, HashTarget, MaskSpec, TaskRequest};
