// tests/bridge.rs

mod common;
use crate::common::{init_tracing, with_timeout, FakeExecutor, FakeScript, Harness, RecordingObserver, TaskRequestBuilder};

use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hashcat_launcher::bridge::{NotificationBridge, TaskObserver};
use hashcat_launcher::engine::{TaskState, TaskUpdate};
use hashcat_launcher::types::ResourceCategory;

type TestResult = Result<(), Box<dyn Error>>;

struct Panicky;

impl TaskObserver for Panicky {
    fn on_watcher_event(&self, category: ResourceCategory) {
        if category == ResourceCategory::Rules {
            panic!("observer bug");
        }
    }
}

#[derive(Default)]
struct Counting {
    updates: AtomicUsize,
}

impl TaskObserver for Counting {
    fn on_task_updated(&self, _update: TaskUpdate) {
        self.updates.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn events_arrive_in_emission_order() -> TestResult {
    init_tracing();
    let bridge = NotificationBridge::new();
    let observer = RecordingObserver::new();
    bridge.register(Arc::new(observer.clone()));

    let order = [
        ResourceCategory::Masks,
        ResourceCategory::Hashes,
        ResourceCategory::Tool,
        ResourceCategory::Masks,
    ];
    for c in order {
        bridge.watcher_event(c);
    }
    bridge.task_deleted("t1".to_string());
    bridge.flush().await;

    assert_eq!(observer.watcher_events(), order.to_vec());
    assert_eq!(
        observer.events().last().map(|e| e.label()),
        Some("deleted".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn panicking_observer_does_not_affect_others() -> TestResult {
    init_tracing();
    let bridge = NotificationBridge::new();
    let observer = RecordingObserver::new();
    bridge.register(Arc::new(Panicky));
    bridge.register(Arc::new(observer.clone()));
    assert_eq!(bridge.observer_count(), 2);

    bridge.watcher_event(ResourceCategory::Rules);
    bridge.watcher_event(ResourceCategory::Dictionaries);
    bridge.flush().await;

    assert_eq!(
        observer.watcher_events(),
        vec![ResourceCategory::Rules, ResourceCategory::Dictionaries]
    );
    Ok(())
}

#[tokio::test]
async fn emitting_without_observers_is_harmless() -> TestResult {
    let bridge = NotificationBridge::new();
    bridge.watcher_event(ResourceCategory::Hashes);
    with_timeout(bridge.flush()).await;

    let late = RecordingObserver::new();
    bridge.register(Arc::new(late.clone()));
    bridge.flush().await;
    assert!(late.events().is_empty());
    Ok(())
}

#[tokio::test]
async fn every_observer_sees_one_terminal_update_per_task() -> TestResult {
    let h = Harness::new(Arc::new(FakeExecutor::new(FakeScript::succeed_with(&[
        r#"{"status":3,"progress":[1,4]}"#,
        r#"{"status":3,"progress":[2,4]}"#,
        r#"{"status":5,"progress":[4,4]}"#,
    ]))));
    let counting = Arc::new(Counting::default());
    h.bridge.register(counting.clone());

    let a = h.manager.add_task(TaskRequestBuilder::new().build())?;
    let b = h.manager.add_task(TaskRequestBuilder::new().build())?;
    with_timeout(h.manager.wait_for_terminal(&a)).await?;
    with_timeout(h.manager.wait_for_terminal(&b)).await?;
    h.flush().await;

    for id in [&a, &b] {
        let terminal = h.observer.terminal_updates(id);
        assert_eq!(terminal.len(), 1, "{id}");
        assert_eq!(terminal[0].state, TaskState::Succeeded);
        assert_eq!(terminal[0].progress.status.as_deref(), Some("exhausted"));
    }

    let recorded_updates = h
        .observer
        .events()
        .iter()
        .filter(|e| e.label().starts_with("updated:"))
        .count();
    assert_eq!(counting.updates.load(Ordering::SeqCst), recorded_updates);
    Ok(())
}

#[tokio::test]
async fn snapshots_serialize_to_json() -> TestResult {
    let h = Harness::new(Arc::new(FakeExecutor::default()));
    let id = h
        .manager
        .add_task(TaskRequestBuilder::new().id("json-1").manual_start().build())?;

    let json: serde_json::Value = serde_json::from_str(&h.manager.get_task(&id)?.to_json()?)?;
    assert_eq!(json["id"], "json-1");
    assert_eq!(json["state"], "created");
    assert_eq!(json["algorithm"], "0");
    assert_eq!(json["attack_mode"], 0);
    Ok(())
}
