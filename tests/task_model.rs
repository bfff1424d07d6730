// tests/task_model.rs

use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use hashcat_launcher::engine::{generate_task_id, FailureDetail, Task, TaskState};
use hashcat_launcher::exec::{Recovered, ResolvedAttack, ResolvedJob, ResolvedMask, ResolvedTarget};

fn task(journal_limit: usize) -> Task {
    let job = ResolvedJob {
        hashes: ResolvedTarget::File(PathBuf::from("/h/hashes.txt")),
        algorithm: "0".to_string(),
        attack: ResolvedAttack::Mask {
            mask: ResolvedMask::Literal("?d?d".to_string()),
        },
    };
    Task::new("t".to_string(), job, Vec::new(), journal_limit, Utc::now())
}

#[test]
fn happy_path_transitions_stamp_times() {
    let mut t = task(50);
    let now = Utc::now();

    assert_eq!(t.state(), TaskState::Created);
    t.transition(TaskState::PreProcessing, now).unwrap();
    assert!(t.started_at.is_none());
    t.transition(TaskState::Running, now).unwrap();
    assert_eq!(t.started_at, Some(now));
    t.transition(TaskState::PostProcessing, now).unwrap();
    assert!(t.finished_at.is_none());
    t.transition(TaskState::Succeeded, now).unwrap();
    assert_eq!(t.finished_at, Some(now));
    assert!(t.state().is_terminal());
}

#[test]
fn illegal_transitions_are_rejected() {
    use TaskState::*;

    let illegal = [
        (Created, Running),
        (Created, Succeeded),
        (PreProcessing, Succeeded),
        (Running, Succeeded),
        (Running, Cancelled),
        (Succeeded, Created),
        (Failed, Running),
        (Cancelled, PreProcessing),
    ];
    for (from, to) in illegal {
        assert!(!from.can_transition_to(to), "{from} -> {to}");
    }

    let mut t = task(50);
    let err = t.transition(Running, Utc::now()).unwrap_err();
    assert_eq!((err.from, err.to), (Created, Running));
    assert_eq!(t.state(), Created);
}

#[test]
fn terminal_states() {
    use TaskState::*;

    for state in [Succeeded, Failed, Cancelled] {
        assert!(state.is_terminal());
    }
    for state in [Created, PreProcessing, Running, PostProcessing] {
        assert!(!state.is_terminal());
    }
}

#[test]
fn journal_is_bounded() {
    let mut t = task(3);
    for i in 0..10 {
        t.log(Utc::now(), format!("line {i}"));
    }
    let messages: Vec<&str> = t.journal().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["line 7", "line 8", "line 9"]);

    let mut silent = task(0);
    silent.log(Utc::now(), "dropped");
    assert_eq!(silent.journal().count(), 0);
}

#[test]
fn recovered_values_are_deduplicated_by_hash() {
    let mut t = task(10);
    let value = |plain: &str| Recovered {
        hash: "5f4dcc3b5aa765d61d8327deb882cf99".to_string(),
        plain: plain.to_string(),
    };

    assert!(t.add_recovered(value("password")));
    assert!(!t.add_recovered(value("password")));
    assert_eq!(t.recovered.len(), 1);

    let snap = t.snapshot();
    assert_eq!(snap.recovered, t.recovered);
    assert_eq!(snap.attack_mode, 3);
    assert_eq!(snap.state, TaskState::Created);
}

#[test]
fn generated_ids_carry_the_timestamp() {
    let at = Utc.with_ymd_and_hms(2025, 10, 14, 9, 30, 5).unwrap();
    let a = generate_task_id(at);
    let b = generate_task_id(at);

    assert!(a.starts_with("20251014093005-"), "{a}");
    assert_ne!(a, b);
}

#[test]
fn failure_detail_display() {
    let runtime = FailureDetail::Runtime {
        exit_code: Some(255),
        stderr_tail: "No hashes loaded.".to_string(),
    };
    assert_eq!(runtime.to_string(), "exited with code 255: No hashes loaded.");

    let launch = FailureDetail::Launch {
        message: "binary missing".to_string(),
    };
    assert_eq!(launch.to_string(), "launch failed: binary missing");
}
