// tests/task_validation.rs

mod common;
use crate::common::{FakeExecutor, FakeScript, Harness, TaskRequestBuilder};

use std::error::Error;
use std::sync::Arc;

use hashcat_launcher::config::TaskOptions;
use hashcat_launcher::engine::{AttackSpec, MaskSpec};
use hashcat_launcher::errors::LauncherError;

type TestResult = Result<(), Box<dyn Error>>;

fn harness() -> (Harness, FakeExecutor) {
    let fake = FakeExecutor::new(FakeScript::hold());
    (Harness::new(Arc::new(fake.clone())), fake)
}

#[tokio::test]
async fn unknown_hash_set_is_rejected_without_creating_a_task() -> TestResult {
    let (h, fake) = harness();

    let err = h
        .manager
        .add_task(TaskRequestBuilder::new().hash_set("missing.txt").build())
        .unwrap_err();

    assert!(matches!(err, LauncherError::ValidationError(_)), "{err:?}");
    assert!(h.manager.list_tasks().is_empty());
    h.flush().await;
    assert!(h.observer.events().is_empty());
    assert!(fake.launches().is_empty());
    Ok(())
}

#[tokio::test]
async fn known_hash_set_resolves_to_its_path() -> TestResult {
    let (h, fake) = harness();

    let id = h
        .manager
        .add_task(TaskRequestBuilder::new().hash_set("hashes.txt").manual_start().build())?;

    let task = h.manager.get_task(&id)?;
    let hashes_path = h.tree.paths().hashes_dir.join("hashes.txt");
    assert!(task.args.contains(&hashes_path.display().to_string()));
    assert!(fake.launches().is_empty());
    Ok(())
}

#[tokio::test]
async fn algorithm_must_be_numeric_and_in_the_catalog() -> TestResult {
    let (h, _fake) = harness();

    for bad in ["md5", "", "12a", "99999"] {
        let err = h
            .manager
            .add_task(TaskRequestBuilder::new().algorithm(bad).build())
            .unwrap_err();
        assert!(
            matches!(err, LauncherError::ValidationError(_)),
            "algorithm {bad:?}: {err:?}"
        );
    }

    h.manager
        .add_task(TaskRequestBuilder::new().algorithm("1000").manual_start().build())?;
    assert_eq!(h.manager.list_tasks().len(), 1);
    Ok(())
}

#[tokio::test]
async fn empty_catalog_accepts_any_numeric_algorithm() -> TestResult {
    let fake = FakeExecutor::new(FakeScript::hold());
    let h = Harness::with(Arc::new(fake), Vec::new(), TaskOptions::default());

    h.manager
        .add_task(TaskRequestBuilder::new().algorithm("22000").manual_start().build())?;

    let err = h
        .manager
        .add_task(TaskRequestBuilder::new().algorithm("wpa").build())
        .unwrap_err();
    assert!(matches!(err, LauncherError::ValidationError(_)));
    Ok(())
}

#[tokio::test]
async fn unknown_dictionary_rule_or_mask_is_rejected() -> TestResult {
    let (h, _fake) = harness();
    h.tree.add_rule("best64.rule", ":\n");
    h.registry.scan()?;

    let requests = [
        TaskRequestBuilder::new().dictionary(&["nope.txt"], &[]).build(),
        TaskRequestBuilder::new()
            .dictionary(&["rockyou.txt"], &["missing.rule"])
            .build(),
        TaskRequestBuilder::new().dictionary(&[], &[]).build(),
        TaskRequestBuilder::new()
            .attack(AttackSpec::Mask {
                mask: MaskSpec::File("missing.hcmask".to_string()),
            })
            .build(),
        TaskRequestBuilder::new().mask("   ").build(),
        TaskRequestBuilder::new()
            .attack(AttackSpec::Combinator {
                left: "rockyou.txt".to_string(),
                right: "other.txt".to_string(),
            })
            .build(),
        TaskRequestBuilder::new().hash("  ").build(),
    ];

    for request in requests {
        let err = h.manager.add_task(request.clone()).unwrap_err();
        assert!(
            matches!(err, LauncherError::ValidationError(_)),
            "{request:?}: {err:?}"
        );
    }
    assert!(h.manager.list_tasks().is_empty());

    h.manager.add_task(
        TaskRequestBuilder::new()
            .dictionary(&["rockyou.txt"], &["best64.rule"])
            .manual_start()
            .build(),
    )?;
    Ok(())
}

#[tokio::test]
async fn resources_added_after_a_rescan_become_valid() -> TestResult {
    let (h, _fake) = harness();

    let request = TaskRequestBuilder::new()
        .dictionary(&["fresh.txt"], &[])
        .manual_start()
        .build();
    assert!(h.manager.add_task(request.clone()).is_err());

    h.tree.add_dictionary("fresh.txt", "letmein\n");
    h.registry.scan()?;
    h.manager.add_task(request)?;
    Ok(())
}

#[tokio::test]
async fn duplicate_id_is_a_conflict() -> TestResult {
    let (h, _fake) = harness();

    let id = h
        .manager
        .add_task(TaskRequestBuilder::new().id("job-1").manual_start().build())?;
    assert_eq!(id, "job-1");

    let err = h
        .manager
        .add_task(TaskRequestBuilder::new().id("job-1").build())
        .unwrap_err();
    assert!(matches!(err, LauncherError::ConflictError(_)), "{err:?}");
    assert_eq!(h.manager.list_tasks().len(), 1);

    h.manager.delete_task("job-1").await?;
    h.manager
        .add_task(TaskRequestBuilder::new().id("job-1").manual_start().build())?;
    Ok(())
}

#[tokio::test]
async fn malformed_ids_are_rejected() -> TestResult {
    let (h, _fake) = harness();

    for bad in ["", ".hidden", "a/b", "has space", "semi;colon"] {
        let err = h
            .manager
            .add_task(TaskRequestBuilder::new().id(bad).build())
            .unwrap_err();
        assert!(
            matches!(err, LauncherError::ValidationError(_)),
            "id {bad:?}: {err:?}"
        );
    }
    Ok(())
}

#[tokio::test]
async fn generated_ids_are_unique() -> TestResult {
    let (h, _fake) = harness();

    let mut ids = Vec::new();
    for _ in 0..20 {
        ids.push(h.manager.add_task(TaskRequestBuilder::new().manual_start().build())?);
    }
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());
    Ok(())
}
