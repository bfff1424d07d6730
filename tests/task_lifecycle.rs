// tests/task_lifecycle.rs

mod common;
use crate::common::{with_timeout, FakeExecutor, FakeScript, Harness, Recorded, TaskRequestBuilder};

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use hashcat_launcher::engine::{FailureDetail, TaskState};
use hashcat_launcher::errors::LauncherError;
use hashcat_launcher::exec::{Progress, RunControl};

type TestResult = Result<(), Box<dyn Error>>;

const MD5_PASSWORD: &str = "5f4dcc3b5aa765d61d8327deb882cf99";

fn cracking_run() -> FakeScript {
    FakeScript::succeed_with(&[
        "Session..........: hashcat",
        r#"{"session":"x","status":3,"target":"5f4dcc3b5aa765d61d8327deb882cf99","progress":[7,14],"restore_point":0,"recovered_hashes":[0,1],"rejected":0,"devices":[{"device_id":1,"speed":1200}],"time_start":1700000000,"estimated_stop":1700000010}"#,
        "5f4dcc3b5aa765d61d8327deb882cf99:password",
        r#"{"status":6,"progress":[14,14],"recovered_hashes":[1,1],"devices":[{"device_id":1,"speed":1500}]}"#,
        "Started: Tue Oct 14 10:00:00 2025",
    ])
}

#[tokio::test]
async fn dictionary_attack_recovers_password_and_succeeds() -> TestResult {
    let fake = FakeExecutor::new(cracking_run());
    let h = Harness::new(Arc::new(fake.clone()));

    let id = h.manager.add_task(
        TaskRequestBuilder::new()
            .hash(MD5_PASSWORD)
            .algorithm("0")
            .dictionary(&["rockyou.txt"], &[])
            .build(),
    )?;

    let done = with_timeout(h.manager.wait_for_terminal(&id)).await?;
    h.flush().await;

    assert_eq!(done.state, TaskState::Succeeded);
    assert_eq!(done.recovered.len(), 1);
    assert_eq!(done.recovered[0].hash, MD5_PASSWORD);
    assert_eq!(done.recovered[0].plain, "password");
    assert_eq!(done.progress.percent, Some(100.0));
    assert_eq!(done.progress.status.as_deref(), Some("cracked"));
    assert!(done.started_at.is_some());
    assert!(done.finished_at >= done.started_at);

    assert!(h.observer.saw_state(&id, TaskState::Running));
    assert_eq!(h.observer.terminal_updates(&id).len(), 1);

    let launches = fake.launches();
    assert_eq!(launches.len(), 1);
    assert_eq!(launches[0].binary, h.tree.paths().binary);
    assert_eq!(launches[0].working_dir, h.tree.paths().hashcat_dir);
    assert!(launches[0].args.contains(&"--hash-type=0".to_string()));
    assert!(launches[0].args.contains(&MD5_PASSWORD.to_string()));
    Ok(())
}

#[tokio::test]
async fn notifications_follow_lifecycle_order() -> TestResult {
    let h = Harness::new(Arc::new(FakeExecutor::new(cracking_run())));

    let id = h.manager.add_task(TaskRequestBuilder::new().build())?;
    with_timeout(h.manager.wait_for_terminal(&id)).await?;
    h.flush().await;

    assert_eq!(
        h.observer.lifecycle(&id),
        vec![
            "added",
            "preprocess",
            "updated:running",
            "postprocess",
            "updated:succeeded",
        ]
    );

    // Snapshots carry the state at the moment they were taken.
    let events = h.observer.for_task(&id);
    match &events[0] {
        Recorded::Added(u) => assert_eq!(u.state, TaskState::Created),
        other => panic!("expected added first, got {other:?}"),
    }
    match &events[1] {
        Recorded::PreProcess(u) => assert_eq!(u.state, TaskState::PreProcessing),
        other => panic!("expected preprocess second, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn recovered_values_are_exported_in_post_process() -> TestResult {
    let h = Harness::new(Arc::new(FakeExecutor::new(cracking_run())));

    let id = h.manager.add_task(TaskRequestBuilder::new().id("export-me").build())?;
    let done = with_timeout(h.manager.wait_for_terminal(&id)).await?;

    let expected = h.tree.paths().exported_dir.join("export-me.txt");
    assert_eq!(done.exported_to.as_deref(), Some(expected.as_path()));
    let contents = std::fs::read_to_string(&expected)?;
    assert_eq!(contents, format!("{MD5_PASSWORD}:password\n"));
    Ok(())
}

#[tokio::test]
async fn nonzero_exit_fails_with_stderr_tail() -> TestResult {
    let h = Harness::new(Arc::new(FakeExecutor::new(FakeScript::exit(
        255,
        &["Token length exception", "No hashes loaded."],
    ))));

    let id = h.manager.add_task(TaskRequestBuilder::new().build())?;
    let done = with_timeout(h.manager.wait_for_terminal(&id)).await?;
    h.flush().await;

    assert_eq!(done.state, TaskState::Failed);
    match done.failure {
        Some(FailureDetail::Runtime {
            exit_code,
            ref stderr_tail,
        }) => {
            assert_eq!(exit_code, Some(255));
            assert!(stderr_tail.contains("No hashes loaded."));
        }
        other => panic!("expected runtime failure, got {other:?}"),
    }
    assert!(done.journal.iter().any(|e| e.message.contains("Token length exception")));
    assert_eq!(h.observer.terminal_updates(&id).len(), 1);
    Ok(())
}

#[tokio::test]
async fn launch_error_fails_without_running() -> TestResult {
    let h = Harness::new(Arc::new(FakeExecutor::new(FakeScript::launch_failure(
        "binary not found",
    ))));

    let id = h.manager.add_task(TaskRequestBuilder::new().build())?;
    let done = with_timeout(h.manager.wait_for_terminal(&id)).await?;
    h.flush().await;

    assert_eq!(done.state, TaskState::Failed);
    assert!(matches!(done.failure, Some(FailureDetail::Launch { .. })));
    assert!(done.started_at.is_none());
    assert!(!h.observer.saw_state(&id, TaskState::Running));
    assert_eq!(
        h.observer.lifecycle(&id),
        vec!["added", "preprocess", "updated:failed"]
    );
    Ok(())
}

#[tokio::test]
async fn vanished_input_fails_in_pre_process() -> TestResult {
    let fake = FakeExecutor::new(cracking_run());
    let h = Harness::new(Arc::new(fake.clone()));

    let request = TaskRequestBuilder::new().manual_start().build();
    let id = h.manager.add_task(request)?;
    std::fs::remove_file(h.tree.paths().dictionaries_dir.join("rockyou.txt"))?;
    h.manager.start_task(&id)?;

    let done = with_timeout(h.manager.wait_for_terminal(&id)).await?;
    assert_eq!(done.state, TaskState::Failed);
    assert!(matches!(done.failure, Some(FailureDetail::PreProcess { .. })));
    assert!(fake.launches().is_empty());
    Ok(())
}

#[tokio::test]
async fn manual_start_waits_and_rejects_second_start() -> TestResult {
    let fake = FakeExecutor::new(cracking_run());
    let h = Harness::new(Arc::new(fake.clone()));

    let id = h.manager.add_task(TaskRequestBuilder::new().manual_start().build())?;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.manager.get_task(&id)?.state, TaskState::Created);
    assert!(fake.launches().is_empty());

    h.manager.start_task(&id)?;
    let second = h.manager.start_task(&id);
    assert!(matches!(second, Err(LauncherError::ConflictError(_))));

    let done = with_timeout(h.manager.wait_for_terminal(&id)).await?;
    assert_eq!(done.state, TaskState::Succeeded);
    assert_eq!(fake.launches().len(), 1);
    Ok(())
}

#[tokio::test]
async fn control_is_forwarded_only_while_running() -> TestResult {
    let fake = FakeExecutor::new(FakeScript::hold());
    let h = Harness::new(Arc::new(fake.clone()));

    let id = h.manager.add_task(TaskRequestBuilder::new().manual_start().build())?;
    let early = h.manager.control(&id, RunControl::Pause);
    assert!(matches!(early, Err(LauncherError::ConflictError(_))));

    h.manager.start_task(&id)?;
    let manager = h.manager.clone();
    let running = with_timeout(async {
        loop {
            if manager.get_task(&id).map(|t| t.state).ok() == Some(TaskState::Running) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    });
    running.await;

    h.manager.control(&id, RunControl::Pause)?;
    h.manager.control(&id, RunControl::Resume)?;
    h.manager.cancel_task(&id)?;
    let done = with_timeout(h.manager.wait_for_terminal(&id)).await?;

    assert_eq!(done.state, TaskState::Cancelled);
    let controls: Vec<RunControl> = fake.controls().into_iter().map(|(_, c)| c).collect();
    assert_eq!(controls, vec![RunControl::Pause, RunControl::Resume]);
    Ok(())
}

#[tokio::test]
async fn update_progress_merges_into_running_task() -> TestResult {
    let h = Harness::new(Arc::new(FakeExecutor::new(FakeScript::hold())));

    let id = h.manager.add_task(TaskRequestBuilder::new().build())?;
    with_timeout(async {
        while h.manager.get_task(&id).map(|t| t.state).ok() != Some(TaskState::Running) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    h.manager.update_progress(
        &id,
        Progress {
            percent: Some(42.0),
            ..Default::default()
        },
    )?;
    h.manager.update_progress(
        &id,
        Progress {
            speed: Some(10.0),
            ..Default::default()
        },
    )?;

    let task = h.manager.get_task(&id)?;
    assert_eq!(task.progress.percent, Some(42.0));
    assert_eq!(task.progress.speed, Some(10.0));

    h.manager.cancel_task(&id)?;
    with_timeout(h.manager.wait_for_terminal(&id)).await?;

    let late = h.manager.update_progress(&id, Progress::default());
    assert!(matches!(late, Err(LauncherError::ConflictError(_))));
    Ok(())
}

#[tokio::test]
async fn list_tasks_keeps_creation_order() -> TestResult {
    let h = Harness::new(Arc::new(FakeExecutor::new(cracking_run())));

    let a = h.manager.add_task(TaskRequestBuilder::new().id("a-task").manual_start().build())?;
    let b = h.manager.add_task(TaskRequestBuilder::new().manual_start().build())?;
    let c = h.manager.add_task(TaskRequestBuilder::new().id("c-task").manual_start().build())?;

    let ids: Vec<String> = h.manager.list_tasks().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![a, b, c]);
    Ok(())
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let h = Harness::new(Arc::new(FakeExecutor::default()));

    assert!(matches!(h.manager.get_task("nope"), Err(LauncherError::NotFoundError(_))));
    assert!(matches!(h.manager.start_task("nope"), Err(LauncherError::NotFoundError(_))));
    assert!(matches!(h.manager.cancel_task("nope"), Err(LauncherError::NotFoundError(_))));
    assert!(matches!(
        h.manager.control("nope", RunControl::Refresh),
        Err(LauncherError::NotFoundError(_))
    ));
}

#[tokio::test]
async fn independent_tasks_run_in_parallel() -> TestResult {
    let fake = FakeExecutor::new(FakeScript::hold());
    let h = Harness::new(Arc::new(fake.clone()));

    let first = h.manager.add_task(TaskRequestBuilder::new().build())?;
    let second = h.manager.add_task(TaskRequestBuilder::new().build())?;

    with_timeout(async {
        while fake.launches().len() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    h.manager.cancel_task(&first)?;
    let done = with_timeout(h.manager.wait_for_terminal(&first)).await?;
    assert_eq!(done.state, TaskState::Cancelled);
    assert!(!h.manager.get_task(&second)?.state.is_terminal());

    h.manager.cancel_task(&second)?;
    with_timeout(h.manager.wait_for_terminal(&second)).await?;
    Ok(())
}
