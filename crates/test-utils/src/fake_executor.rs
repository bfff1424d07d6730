use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hashcat_launcher::errors::{LauncherError, Result};
use hashcat_launcher::exec::{
    CancelReason, ExecutorBackend, HashcatOutputParser, Invocation, ProgressParser, ProgressSink,
    RunChannels, RunControl, RunEvent, RunHandle, RunOutcome,
};

/// What a fake run does.
#[derive(Debug, Clone)]
pub struct FakeScript {
    /// Lines "printed" on stdout, fed through the real output parser.
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    /// Exit code once the output has been replayed.
    pub exit_code: i32,
    /// Fail `launch` with this message.
    pub launch_error: Option<String>,
    /// After replaying output, keep "running" until cancelled.
    pub hold_until_cancel: bool,
    /// Pause between replayed lines.
    pub line_delay: Duration,
}

impl Default for FakeScript {
    fn default() -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit_code: 0,
            launch_error: None,
            hold_until_cancel: false,
            line_delay: Duration::ZERO,
        }
    }
}

impl FakeScript {
    pub fn succeed_with(lines: &[&str]) -> Self {
        Self {
            stdout: lines.iter().map(|l| l.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn exit(code: i32, stderr: &[&str]) -> Self {
        Self {
            exit_code: code,
            stderr: stderr.iter().map(|l| l.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn launch_failure(message: &str) -> Self {
        Self {
            launch_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn hold() -> Self {
        Self {
            hold_until_cancel: true,
            ..Self::default()
        }
    }
}

/// Everything the fake observed, shared with the test.
#[derive(Debug, Default)]
pub struct FakeLog {
    pub launches: Vec<Invocation>,
    pub cancels: Vec<(String, CancelReason)>,
    pub controls: Vec<(String, RunControl)>,
}

/// A fake executor that:
/// - records every launch, cancellation and control command
/// - replays a scripted run instead of spawning a process.
#[derive(Debug, Clone, Default)]
pub struct FakeExecutor {
    script: Arc<Mutex<FakeScript>>,
    log: Arc<Mutex<FakeLog>>,
}

impl FakeExecutor {
    pub fn new(script: FakeScript) -> Self {
        Self {
            script: Arc::new(Mutex::new(script)),
            log: Arc::default(),
        }
    }

    /// Replace the script used by subsequent launches.
    pub fn set_script(&self, script: FakeScript) {
        *self.script.lock().unwrap() = script;
    }

    pub fn launches(&self) -> Vec<Invocation> {
        self.log.lock().unwrap().launches.clone()
    }

    pub fn cancels(&self) -> Vec<(String, CancelReason)> {
        self.log.lock().unwrap().cancels.clone()
    }

    pub fn controls(&self) -> Vec<(String, RunControl)> {
        self.log.lock().unwrap().controls.clone()
    }
}

impl ExecutorBackend for FakeExecutor {
    fn launch(&self, invocation: Invocation, sink: ProgressSink) -> Result<Box<dyn RunHandle>> {
        let script = self.script.lock().unwrap().clone();
        let task_id = invocation.task_id.clone();
        self.log.lock().unwrap().launches.push(invocation);

        if let Some(message) = script.launch_error {
            return Err(LauncherError::LaunchError(message));
        }

        Ok(Box::new(FakeRun {
            task_id,
            script,
            sink,
            log: Arc::clone(&self.log),
        }))
    }
}

struct FakeRun {
    task_id: String,
    script: FakeScript,
    sink: ProgressSink,
    log: Arc<Mutex<FakeLog>>,
}

impl RunHandle for FakeRun {
    fn wait(
        self: Box<Self>,
        channels: RunChannels,
    ) -> Pin<Box<dyn Future<Output = RunOutcome> + Send>> {
        Box::pin(async move {
            let FakeRun {
                task_id,
                script,
                sink,
                log,
            } = *self;
            let RunChannels {
                mut cancel,
                mut control,
            } = channels;
            let parser = HashcatOutputParser;

            for line in &script.stdout {
                if !script.line_delay.is_zero() {
                    tokio::time::sleep(script.line_delay).await;
                }
                if let Some(parsed) = parser.parse_line(line) {
                    let _ = sink.send(RunEvent::Parsed(parsed));
                }
            }
            for line in &script.stderr {
                let _ = sink.send(RunEvent::Stderr(line.clone()));
            }

            if script.hold_until_cancel {
                let mut control_open = true;
                loop {
                    tokio::select! {
                        // Commands queued before a cancel are recorded first.
                        biased;

                        cmd = control.recv(), if control_open => match cmd {
                            Some(cmd) => log.lock().unwrap().controls.push((task_id.clone(), cmd)),
                            None => control_open = false,
                        },
                        reason = &mut cancel => {
                            // A dropped sender counts as a user stop here.
                            let reason = reason.unwrap_or(CancelReason::User);
                            log.lock().unwrap().cancels.push((task_id.clone(), reason));
                            return RunOutcome::Cancelled(reason);
                        }
                    }
                }
            }

            if let Ok(reason) = cancel.try_recv() {
                log.lock().unwrap().cancels.push((task_id, reason));
                return RunOutcome::Cancelled(reason);
            }

            if script.exit_code == 0 {
                RunOutcome::Succeeded
            } else {
                RunOutcome::Failed {
                    exit_code: Some(script.exit_code),
                    stderr_tail: script.stderr.join("\n"),
                }
            }
        })
    }
}
