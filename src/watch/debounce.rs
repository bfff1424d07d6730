// src/watch/debounce.rs

//! Trailing-edge, per-category debounce.
//!
//! Every raw event for a category pushes that category's deadline to
//! `now + window`. A category becomes due once its deadline passes without
//! further events, so a burst of events (bulk copy into a dictionary
//! directory) results in one rescan. A zero window makes every event due
//! immediately.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::types::ResourceCategory;

#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    pending: BTreeMap<ResourceCategory, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: BTreeMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a raw event for `category` at `now`.
    pub fn record(&mut self, category: ResourceCategory, now: Instant) {
        self.pending.insert(category, now + self.window);
    }

    /// Remove and return every category whose deadline is at or before
    /// `now`, in category order.
    pub fn due(&mut self, now: Instant) -> Vec<ResourceCategory> {
        let ready: Vec<ResourceCategory> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(category, _)| *category)
            .collect();
        for category in &ready {
            self.pending.remove(category);
        }
        ready
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}
