// src/lib.rs

pub mod bridge;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod registry;
pub mod types;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};

use crate::bridge::{NotificationBridge, TaskObserver};
use crate::cli::CliArgs;
use crate::config::{ensure_directories, load_and_validate, LauncherConfig, SettingsStore};
use crate::engine::{DefaultHooks, TaskId, TaskManager, TaskState, TaskUpdate};
use crate::exec::HashcatExecutor;
use crate::registry::ResourceRegistry;
use crate::types::ResourceCategory;

/// Settings key holding the number of launcher starts.
const SETTINGS_RUNS_KEY: &str = "launcher.runs";

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// This wires together:
/// - config loading and directory bootstrap
/// - settings load (start) and save (exit)
/// - resource registry
/// - notification bridge with a logging observer
/// - task manager and process executor
/// - (optional) file watcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<i32> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    ensure_directories(&cfg.paths)?;

    let mut settings = SettingsStore::load(&cfg.paths.settings_file)?;
    let runs = settings.get::<i64>(SETTINGS_RUNS_KEY).unwrap_or(0) + 1;
    settings.set(SETTINGS_RUNS_KEY, runs)?;

    let registry = Arc::new(ResourceRegistry::from_config(&cfg)?);
    // A missing category must not block startup.
    if let Err(err) = registry.scan() {
        warn!(error = %err, "initial resource scan incomplete");
    }

    if args.dry_run {
        print_dry_run(&cfg, &registry);
        settings.save()?;
        return Ok(0);
    }

    let bridge = NotificationBridge::new();
    bridge.register(Arc::new(LoggingObserver));

    let manager = TaskManager::new(
        Arc::clone(&registry),
        Arc::new(HashcatExecutor::default()),
        Arc::new(DefaultHooks::new(
            &cfg.paths.exported_dir,
            cfg.task.export_recovered,
        )),
        bridge.clone(),
        cfg.task.clone(),
    );

    let _watcher = if cfg.watch.enabled {
        match watch::spawn_watcher(Arc::clone(&registry), bridge.clone(), &cfg.watch) {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!(error = %err, "file watcher unavailable; resources refresh only on restart");
                None
            }
        }
    } else {
        None
    };

    let outcome = serve(&args, &manager, &registry).await;

    bridge.flush().await;
    // Settings are written even when the session ended with an error.
    let saved = settings.save();
    let code = outcome?;
    saved?;
    Ok(code)
}

/// Submit the task described on the command line and wait for it, or run
/// headless until Ctrl-C.
async fn serve(args: &CliArgs, manager: &TaskManager, registry: &ResourceRegistry) -> Result<i32> {
    let request = args
        .task_request(|name| registry.find(ResourceCategory::Masks, name).is_some())
        .map_err(|e| anyhow!(e))?;

    match request {
        Some(request) => {
            let id = manager.add_task(request)?;
            let outcome = run_until_terminal(manager, &id).await?;
            print_result(&outcome);
            Ok(if outcome.state == TaskState::Succeeded { 0 } else { 2 })
        }
        None => {
            info!("running headless; press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
            info!("shutdown requested");
            shutdown(manager).await;
            Ok(0)
        }
    }
}

/// Wait for the task, cancelling it on Ctrl-C.
async fn run_until_terminal(manager: &TaskManager, id: &TaskId) -> Result<TaskUpdate> {
    tokio::select! {
        res = manager.wait_for_terminal(id) => Ok(res?),
        _ = tokio::signal::ctrl_c() => {
            info!(task = %id, "interrupted; cancelling task");
            manager.cancel_task(id)?;
            Ok(manager.wait_for_terminal(id).await?)
        }
    }
}

/// Cancel and remove every task before exiting.
async fn shutdown(manager: &TaskManager) {
    for task in manager.list_tasks() {
        if let Err(err) = manager.delete_task(&task.id).await {
            debug!(task = %task.id, error = %err, "task already gone at shutdown");
        }
    }
}

fn print_result(update: &TaskUpdate) {
    println!("task {}: {}", update.id, update.state);
    for r in &update.recovered {
        println!("{}:{}", r.hash, r.plain);
    }
    if let Some(failure) = &update.failure {
        println!("  {failure}");
    }
    if let Some(path) = &update.exported_to {
        println!("  exported to {}", path.display());
    }
}

/// Simple dry-run output: print directories and inventories.
fn print_dry_run(cfg: &LauncherConfig, registry: &ResourceRegistry) {
    println!("hashcat-launcher dry-run");
    println!("  binary = {}", cfg.paths.binary.display());
    println!("  exported_dir = {}", cfg.paths.exported_dir.display());
    println!();

    for category in ResourceCategory::DIRECTORIES {
        let inventory = registry.inventory(category);
        println!(
            "{category} ({}) in {}:",
            inventory.len(),
            registry.category_dir(category).display()
        );
        for resource in inventory.iter() {
            println!("  - {}", resource.name);
        }
    }

    let algorithms = registry.algorithms();
    println!("algorithms ({}):", algorithms.len());
    for algorithm in algorithms.iter().take(20) {
        println!("  {:>6} | {}", algorithm.id, algorithm.name);
    }
    if algorithms.len() > 20 {
        println!("  ...");
    }

    debug!("dry-run complete (no execution)");
}

/// Observer used by the headless binary: every event becomes a log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl TaskObserver for LoggingObserver {
    fn on_task_added(&self, update: TaskUpdate) {
        info!(task = %update.id, "added");
    }

    fn on_task_updated(&self, update: TaskUpdate) {
        match (&update.progress.percent, update.state) {
            (_, state) if state.is_terminal() => {
                info!(task = %update.id, state = %state, recovered = update.recovered.len(), "finished")
            }
            (Some(percent), state) => {
                info!(task = %update.id, state = %state, percent = %format!("{percent:.2}"), speed = ?update.progress.speed, "progress")
            }
            (None, state) => info!(task = %update.id, state = %state, "updated"),
        }
    }

    fn on_task_preprocess(&self, update: TaskUpdate) {
        debug!(task = %update.id, "pre-processing");
    }

    fn on_task_postprocess(&self, update: TaskUpdate) {
        debug!(task = %update.id, "post-processing");
    }

    fn on_task_deleted(&self, task_id: TaskId) {
        info!(task = %task_id, "deleted");
    }

    fn on_watcher_event(&self, category: ResourceCategory) {
        info!(%category, "resources changed");
    }
}
