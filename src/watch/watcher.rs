// src/watch/watcher.rs

use std::sync::Arc;

use anyhow::Context;
use globset::GlobSet;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::bridge::NotificationBridge;
use crate::config::WatchOptions;
use crate::errors::Result;
use crate::registry::{build_exclude_set, ResourceRegistry};
use crate::types::ResourceCategory;
use crate::watch::debounce::Debouncer;
use crate::watch::path_utils::CategoryDirs;

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle stops file watching and ends the
/// event loop.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    watched: Vec<ResourceCategory>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("watched", &self.watched)
            .finish()
    }
}

impl WatcherHandle {
    /// Categories whose directory is actually being watched.
    pub fn watched(&self) -> &[ResourceCategory] {
        &self.watched
    }
}

/// Watch the tool directory and every resource directory of `registry`
/// (non-recursively). Changes trigger a debounced rescan of the affected
/// category followed by `on_watcher_event` on the bridge.
///
/// A directory that cannot be watched is logged and skipped; that category
/// then only refreshes on manual rescans.
pub fn spawn_watcher(
    registry: Arc<ResourceRegistry>,
    bridge: NotificationBridge,
    options: &WatchOptions,
) -> Result<WatcherHandle> {
    let exclude = build_exclude_set(&options.exclude)?;
    let dirs = CategoryDirs::new(
        ResourceCategory::DIRECTORIES
            .into_iter()
            .chain([ResourceCategory::Tool])
            .map(|c| (c, registry.category_dir(c).to_path_buf())),
    );

    // Channel from the blocking notify callback into the async world.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let _ = event_tx.send(event);
            }
            Err(err) => warn!(error = %err, "file watch error"),
        },
        Config::default(),
    )
    .context("creating filesystem watcher")?;

    let mut watched = Vec::new();
    for (category, dir) in dirs.iter() {
        match watcher.watch(dir, RecursiveMode::NonRecursive) {
            Ok(()) => {
                debug!(%category, dir = ?dir, "watching");
                watched.push(category);
            }
            Err(err) => {
                warn!(%category, dir = ?dir, error = %err, "cannot watch directory; live refresh disabled");
            }
        }
    }
    info!(?watched, debounce = ?options.debounce, "file watcher started");

    let debouncer = Debouncer::new(options.debounce);
    let skip_unchanged = options.skip_unchanged;
    tokio::spawn(event_loop(
        event_rx,
        dirs,
        exclude,
        debouncer,
        registry,
        bridge,
        skip_unchanged,
    ));

    Ok(WatcherHandle {
        _inner: watcher,
        watched,
    })
}

async fn event_loop(
    mut event_rx: mpsc::UnboundedReceiver<Event>,
    dirs: CategoryDirs,
    exclude: GlobSet,
    mut debouncer: Debouncer,
    registry: Arc<ResourceRegistry>,
    bridge: NotificationBridge,
    skip_unchanged: bool,
) {
    loop {
        let next = debouncer.next_deadline();
        let timer = async move {
            match next {
                Some(at) => sleep_until(Instant::from_std(at)).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            event = event_rx.recv() => match event {
                Some(event) => record_event(&mut debouncer, &dirs, &exclude, event),
                None => break,
            },
            _ = timer => {}
        }

        for category in debouncer.due(std::time::Instant::now()) {
            rescan(&registry, &bridge, category, skip_unchanged).await;
        }
    }
    debug!("watcher event loop finished");
}

fn record_event(debouncer: &mut Debouncer, dirs: &CategoryDirs, exclude: &GlobSet, event: Event) {
    if matches!(event.kind, EventKind::Access(_)) {
        return;
    }
    debug!(?event, "received notify event");

    for path in &event.paths {
        let excluded = path
            .file_name()
            .is_some_and(|name| exclude.is_match(name));
        if excluded {
            continue;
        }
        if let Some(category) = dirs.category_for(path) {
            debouncer.record(category, std::time::Instant::now());
        }
    }
}

/// Rescan one category on the blocking pool and notify observers.
pub async fn rescan(
    registry: &Arc<ResourceRegistry>,
    bridge: &NotificationBridge,
    category: ResourceCategory,
    skip_unchanged: bool,
) {
    let before = skip_unchanged.then(|| registry.fingerprint(category));

    let scan_registry = Arc::clone(registry);
    let result = tokio::task::spawn_blocking(move || scan_registry.scan_category(category)).await;

    match result {
        Ok(Ok(())) => {
            if before.is_some_and(|b| b == registry.fingerprint(category)) {
                debug!(%category, "inventory unchanged; not notifying");
                return;
            }
            info!(%category, "rescanned after filesystem change");
            bridge.watcher_event(category);
        }
        Ok(Err(err)) => {
            warn!(%category, error = %err, "rescan failed; keeping previous inventory");
        }
        Err(err) => {
            warn!(%category, error = %err, "rescan task failed");
        }
    }
}
