// tests/output_parser.rs

use hashcat_launcher::exec::{
    status_label, Guess, HashcatOutputParser, ParsedLine, Progress, ProgressParser, Recovered,
};

fn status(line: &str) -> Progress {
    match HashcatOutputParser.parse_line(line) {
        Some(ParsedLine::Status(p)) => p,
        other => panic!("expected status for {line:?}, got {other:?}"),
    }
}

#[test]
fn json_status_line() {
    let p = status(
        r#"{"session":"job-1","guess":{"guess_base":"rockyou.txt"},"status":3,"target":"hashes.txt","progress":[250,1000],"restore_point":0,"recovered_hashes":[1,4],"recovered_salts":[0,1],"rejected":2,"devices":[{"device_id":1,"speed":1000.0},{"device_id":2,"speed":500}],"time_start":1700000000,"estimated_stop":1700000300}"#,
    );

    assert_eq!(p.status.as_deref(), Some("running"));
    assert_eq!(p.progress, Some((250, 1000)));
    assert_eq!(p.percent, Some(25.0));
    assert_eq!(p.speed, Some(1500.0));
    assert_eq!(p.recovered_hashes, Some((1, 4)));
    assert_eq!(p.rejected, Some(2));
    assert_eq!(p.target.as_deref(), Some("hashes.txt"));
    assert_eq!(p.time_start, Some(1700000000));
    assert_eq!(p.estimated_stop, Some(1700000300));
    let guess = p.guess.as_ref().map(|g| g.guess_base.as_deref());
    assert_eq!(guess, Some(Some("rockyou.txt")));
}

#[test]
fn json_guess_block_is_kept() {
    let p = status(
        r#"{"status":3,"progress":[5,10],"guess":{"guess_base":"rockyou.txt","guess_base_count":2,"guess_base_offset":1,"guess_base_percent":50.0,"guess_mod":"best64.rule","guess_mod_count":1,"guess_mod_offset":1,"guess_mod_percent":100.0,"guess_mode":8}}"#,
    );

    assert_eq!(
        p.guess,
        Some(Guess {
            guess_base: Some("rockyou.txt".to_string()),
            guess_base_offset: 1,
            guess_base_count: 2,
            guess_mod: Some("best64.rule".to_string()),
            guess_mod_offset: 1,
            guess_mod_count: 1,
        })
    );

    // A mask attack has no modifier.
    let p = status(r#"{"status":3,"guess":{"guess_base":"?d?d?d","guess_mod":null}}"#);
    let guess = p.guess.expect("guess block parsed");
    assert_eq!(guess.guess_mod, None);
    assert_eq!(guess.guess_base.as_deref(), Some("?d?d?d"));
}

#[test]
fn json_with_zero_keyspace_has_no_percent() {
    let p = status(r#"{"status":1,"progress":[0,0]}"#);
    assert_eq!(p.status.as_deref(), Some("autotune"));
    assert_eq!(p.progress, Some((0, 0)));
    assert_eq!(p.percent, None);
}

#[test]
fn json_without_known_fields_is_ignored() {
    let parser = HashcatOutputParser;
    assert_eq!(parser.parse_line(r#"{"session":"x"}"#), None);
    assert_eq!(parser.parse_line("{not json"), None);
}

#[test]
fn text_status_block() {
    assert_eq!(status("Status...........: Paused").status.as_deref(), Some("paused"));

    let p = status("Progress.........: 5308416/14344385 (37.01%)");
    assert_eq!(p.progress, Some((5308416, 14344385)));
    assert_eq!(p.percent, Some(37.01));

    assert_eq!(status("Speed.#1.........:  1234.5 kH/s (0.52ms) @ Accel:64").speed, Some(1234500.0));
    assert_eq!(status("Speed.#*.........:   2 MH/s").speed, Some(2_000_000.0));
    assert_eq!(status("Speed.#2.........:   17 H/s").speed, Some(17.0));

    assert_eq!(
        status("Time.Estimated...: Tue Oct 14 10:05:00 2025 (4 mins, 2 secs)").eta.as_deref(),
        Some("Tue Oct 14 10:05:00 2025 (4 mins, 2 secs)")
    );
    assert_eq!(
        status("Recovered........: 3/10 (30.00%) Digests").recovered_hashes,
        Some((3, 10))
    );
    assert_eq!(
        status("Hash.Target......: hashes.txt").target.as_deref(),
        Some("hashes.txt")
    );
}

#[test]
fn recovered_lines() {
    let parser = HashcatOutputParser;

    assert_eq!(
        parser.parse_line("5f4dcc3b5aa765d61d8327deb882cf99:password"),
        Some(ParsedLine::Recovered(Recovered {
            hash: "5f4dcc3b5aa765d61d8327deb882cf99".to_string(),
            plain: "password".to_string(),
        }))
    );

    // Plains may contain the separator.
    assert_eq!(
        parser.parse_line("5f4dcc3b5aa765d61d8327deb882cf99:a:b"),
        Some(ParsedLine::Recovered(Recovered {
            hash: "5f4dcc3b5aa765d61d8327deb882cf99".to_string(),
            plain: "a:b".to_string(),
        }))
    );

    match parser.parse_line("$2y$10$abcdefghijklmnopqrstuv:hunter2") {
        Some(ParsedLine::Recovered(r)) => assert_eq!(r.plain, "hunter2"),
        other => panic!("unexpected {other:?}"),
    }

    assert_eq!(
        parser.parse_line("5f4dcc3b5aa765d61d8327deb882cf99:password\r"),
        Some(ParsedLine::Recovered(Recovered {
            hash: "5f4dcc3b5aa765d61d8327deb882cf99".to_string(),
            plain: "password".to_string(),
        }))
    );
}

#[test]
fn banner_and_noise_are_ignored() {
    let parser = HashcatOutputParser;
    for line in [
        "",
        "hashcat (v6.2.6) starting",
        "Session..........: hashcat",
        "Dictionary cache hit:",
        "abc:short-hash",
        "Started: Tue Oct 14 10:00:00 2025",
    ] {
        assert_eq!(parser.parse_line(line), None, "{line:?}");
    }
}

#[test]
fn merge_keeps_fields_not_in_the_update() {
    let mut p = Progress {
        status: Some("running".to_string()),
        progress: Some((10, 100)),
        percent: Some(10.0),
        speed: Some(5.0),
        ..Progress::default()
    };

    p.merge(Progress {
        progress: Some((50, 100)),
        percent: Some(50.0),
        eta: Some("1 min".to_string()),
        ..Progress::default()
    });

    assert_eq!(p.status.as_deref(), Some("running"));
    assert_eq!(p.progress, Some((50, 100)));
    assert_eq!(p.percent, Some(50.0));
    assert_eq!(p.speed, Some(5.0));
    assert_eq!(p.eta.as_deref(), Some("1 min"));
    assert!(!p.is_empty());
    assert!(Progress::default().is_empty());
}

#[test]
fn status_labels() {
    assert_eq!(status_label(3), "running");
    assert_eq!(status_label(5), "exhausted");
    assert_eq!(status_label(6), "cracked");
    assert_eq!(status_label(200), "unknown");
}
