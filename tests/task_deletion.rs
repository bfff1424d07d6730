// tests/task_deletion.rs

mod common;
use crate::common::{wait_until, with_timeout, FakeExecutor, FakeScript, Harness, TaskRequestBuilder};

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use hashcat_launcher::engine::{TaskManager, TaskState};
use hashcat_launcher::errors::LauncherError;
use hashcat_launcher::exec::CancelReason;

type TestResult = Result<(), Box<dyn Error>>;

async fn wait_running(manager: &TaskManager, id: &str) {
    let reached = wait_until(Duration::from_secs(5), || {
        manager.get_task(id).map(|t| t.state).ok() == Some(TaskState::Running)
    })
    .await;
    assert!(reached, "task {id} never reached running");
}

#[tokio::test]
async fn deleting_a_running_task_cancels_it_first() -> TestResult {
    let fake = FakeExecutor::new(FakeScript::hold());
    let h = Harness::new(Arc::new(fake.clone()));

    let id = h.manager.add_task(TaskRequestBuilder::new().build())?;
    wait_running(&h.manager, &id).await;

    with_timeout(h.manager.delete_task(&id)).await?;
    h.flush().await;

    assert_eq!(fake.cancels(), vec![(id.clone(), CancelReason::User)]);
    assert!(matches!(
        h.manager.get_task(&id),
        Err(LauncherError::NotFoundError(_))
    ));
    assert_eq!(
        h.observer.lifecycle(&id),
        vec![
            "added",
            "preprocess",
            "updated:running",
            "postprocess",
            "updated:cancelled",
            "deleted",
        ]
    );
    let last = h.observer.terminal_updates(&id);
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].cancel_reason, Some(CancelReason::User));
    Ok(())
}

#[tokio::test]
async fn deleting_a_finished_task_does_not_cancel() -> TestResult {
    let fake = FakeExecutor::new(FakeScript::succeed_with(&[]));
    let h = Harness::new(Arc::new(fake.clone()));

    let id = h.manager.add_task(TaskRequestBuilder::new().build())?;
    let done = with_timeout(h.manager.wait_for_terminal(&id)).await?;
    assert_eq!(done.state, TaskState::Succeeded);

    h.manager.delete_task(&id).await?;
    h.flush().await;

    assert!(fake.cancels().is_empty());
    assert!(h.manager.list_tasks().is_empty());
    assert_eq!(
        h.observer.lifecycle(&id).last().map(String::as_str),
        Some("deleted")
    );
    Ok(())
}

#[tokio::test]
async fn deleting_a_task_that_never_started() -> TestResult {
    let fake = FakeExecutor::new(FakeScript::hold());
    let h = Harness::new(Arc::new(fake.clone()));

    let id = h
        .manager
        .add_task(TaskRequestBuilder::new().manual_start().build())?;
    h.manager.delete_task(&id).await?;
    h.flush().await;

    assert!(fake.launches().is_empty());
    assert!(fake.cancels().is_empty());
    assert_eq!(
        h.observer.lifecycle(&id),
        vec!["added", "updated:cancelled", "deleted"]
    );
    Ok(())
}

#[tokio::test]
async fn deleting_an_unknown_task_is_not_found() -> TestResult {
    let h = Harness::new(Arc::new(FakeExecutor::default()));

    let err = h.manager.delete_task("ghost").await.unwrap_err();
    assert!(matches!(err, LauncherError::NotFoundError(_)));

    h.flush().await;
    assert!(h.observer.events().is_empty());
    Ok(())
}

#[tokio::test]
async fn second_delete_reports_not_found() -> TestResult {
    let h = Harness::new(Arc::new(FakeExecutor::default()));

    let id = h
        .manager
        .add_task(TaskRequestBuilder::new().manual_start().build())?;
    h.manager.delete_task(&id).await?;

    let err = h.manager.delete_task(&id).await.unwrap_err();
    assert!(matches!(err, LauncherError::NotFoundError(_)));

    h.flush().await;
    let deleted = h
        .observer
        .for_task(&id)
        .iter()
        .filter(|e| e.label() == "deleted")
        .count();
    assert_eq!(deleted, 1);
    Ok(())
}

#[tokio::test]
async fn cancel_keeps_the_task_until_deleted() -> TestResult {
    let fake = FakeExecutor::new(FakeScript::hold());
    let h = Harness::new(Arc::new(fake.clone()));

    let id = h.manager.add_task(TaskRequestBuilder::new().build())?;
    wait_running(&h.manager, &id).await;

    h.manager.cancel_task(&id)?;
    let done = with_timeout(h.manager.wait_for_terminal(&id)).await?;
    assert_eq!(done.state, TaskState::Cancelled);
    assert_eq!(done.cancel_reason, Some(CancelReason::User));

    // Cancelling again is harmless.
    h.manager.cancel_task(&id)?;
    assert_eq!(h.manager.list_tasks().len(), 1);
    assert_eq!(fake.cancels().len(), 1);
    Ok(())
}

#[tokio::test]
async fn deleting_one_task_leaves_others_running() -> TestResult {
    let fake = FakeExecutor::new(FakeScript::hold());
    let h = Harness::new(Arc::new(fake.clone()));

    let first = h.manager.add_task(TaskRequestBuilder::new().id("first").build())?;
    let second = h.manager.add_task(TaskRequestBuilder::new().id("second").build())?;
    wait_running(&h.manager, &first).await;
    wait_running(&h.manager, &second).await;

    with_timeout(h.manager.delete_task(&first)).await?;

    assert_eq!(h.manager.get_task(&second)?.state, TaskState::Running);
    assert_eq!(fake.cancels(), vec![(first.clone(), CancelReason::User)]);

    with_timeout(h.manager.delete_task(&second)).await?;
    assert!(h.manager.list_tasks().is_empty());
    Ok(())
}
