// src/exec/runner.rs

//! Child process runner for the external tool.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Split};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, timeout, Instant};
use tracing::{debug, info, trace, warn};

use crate::errors::{LauncherError, Result};
use crate::exec::backend::{
    CancelReason, ExecutorBackend, Invocation, ProgressSink, RunChannels, RunControl, RunEvent,
    RunHandle, RunOutcome,
};
use crate::exec::progress::{HashcatOutputParser, ProgressParser};

/// Upper bound on waiting for the output readers after the child is gone.
/// A grandchild holding the pipes open must not stall the task forever.
const READER_GRACE: Duration = Duration::from_secs(2);

/// Production backend: spawns the tool binary with tokio.
#[derive(Clone)]
pub struct HashcatExecutor {
    parser: Arc<dyn ProgressParser>,
}

impl std::fmt::Debug for HashcatExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashcatExecutor").finish_non_exhaustive()
    }
}

impl Default for HashcatExecutor {
    fn default() -> Self {
        Self::new(Arc::new(HashcatOutputParser))
    }
}

impl HashcatExecutor {
    pub fn new(parser: Arc<dyn ProgressParser>) -> Self {
        Self { parser }
    }
}

impl ExecutorBackend for HashcatExecutor {
    fn launch(&self, invocation: Invocation, sink: ProgressSink) -> Result<Box<dyn RunHandle>> {
        info!(
            task = %invocation.task_id,
            binary = ?invocation.binary,
            args = ?invocation.args,
            "starting tool process"
        );

        let mut cmd = Command::new(&invocation.binary);
        cmd.args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            LauncherError::LaunchError(format!(
                "spawning {:?} in {:?}: {e}",
                invocation.binary, invocation.working_dir
            ))
        })?;

        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .map(|out| spawn_stdout_reader(&invocation.task_id, out, Arc::clone(&self.parser), sink.clone()));
        let stderr = child
            .stderr
            .take()
            .map(|err| spawn_stderr_reader(&invocation.task_id, err, invocation.stderr_tail_lines, sink));

        Ok(Box::new(ProcessHandle {
            task_id: invocation.task_id,
            child,
            stdin,
            stdout,
            stderr,
            max_runtime: invocation.max_runtime,
        }))
    }
}

fn spawn_stdout_reader(
    task_id: &str,
    stdout: ChildStdout,
    parser: Arc<dyn ProgressParser>,
    sink: ProgressSink,
) -> JoinHandle<()> {
    let task_id = task_id.to_string();
    tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).split(b'\n');
        while let Some(line) = next_lossy_line(&task_id, &mut lines).await {
            trace!(task = %task_id, "stdout: {}", line);
            if let Some(parsed) = parser.parse_line(&line) {
                let _ = sink.send(RunEvent::Parsed(parsed));
            }
        }
        debug!(task = %task_id, "stdout reader ended");
    })
}

/// Next output line, decoded lossily. The tool echoes device names and
/// recovered plaintexts verbatim, so invalid UTF-8 must not end the stream.
async fn next_lossy_line<R>(task_id: &str, lines: &mut Split<R>) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    match lines.next_segment().await {
        Ok(Some(raw)) => {
            let line = String::from_utf8_lossy(&raw);
            Some(line.strip_suffix('\r').unwrap_or(&*line).to_string())
        }
        Ok(None) => None,
        Err(e) => {
            warn!(task = %task_id, error = %e, "reading tool output failed");
            None
        }
    }
}

fn spawn_stderr_reader(
    task_id: &str,
    stderr: ChildStderr,
    tail_lines: usize,
    sink: ProgressSink,
) -> JoinHandle<Vec<String>> {
    let task_id = task_id.to_string();
    tokio::spawn(async move {
        let mut tail = VecDeque::with_capacity(tail_lines);
        let mut lines = BufReader::new(stderr).split(b'\n');
        while let Some(line) = next_lossy_line(&task_id, &mut lines).await {
            debug!(task = %task_id, "stderr: {}", line);
            if tail_lines > 0 {
                if tail.len() == tail_lines {
                    tail.pop_front();
                }
                tail.push_back(line.clone());
            }
            let _ = sink.send(RunEvent::Stderr(line));
        }
        tail.into_iter().collect()
    })
}

struct ProcessHandle {
    task_id: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<JoinHandle<()>>,
    stderr: Option<JoinHandle<Vec<String>>>,
    max_runtime: Option<Duration>,
}

enum Ended {
    Exited(std::io::Result<ExitStatus>),
    Cancelled(CancelReason),
}

impl RunHandle for ProcessHandle {
    fn wait(self: Box<Self>, channels: RunChannels) -> Pin<Box<dyn Future<Output = RunOutcome> + Send>> {
        Box::pin(self.run(channels))
    }
}

impl ProcessHandle {
    async fn run(self: Box<Self>, channels: RunChannels) -> RunOutcome {
        let ProcessHandle {
            task_id,
            mut child,
            mut stdin,
            stdout,
            stderr,
            max_runtime,
        } = *self;
        let RunChannels {
            mut cancel,
            mut control,
        } = channels;

        let deadline = max_runtime.map(|d| Instant::now() + d);
        let expiry = async move {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(expiry);

        let mut cancel_open = true;
        let mut control_open = true;

        let ended = loop {
            tokio::select! {
                status = child.wait() => break Ended::Exited(status),

                reason = &mut cancel, if cancel_open => match reason {
                    Ok(reason) => break Ended::Cancelled(reason),
                    Err(_) => {
                        // Sender dropped without a request; keep running.
                        cancel_open = false;
                    }
                },

                cmd = control.recv(), if control_open => match cmd {
                    Some(cmd) => send_key(&task_id, stdin.as_mut(), cmd).await,
                    None => control_open = false,
                },

                _ = &mut expiry => {
                    warn!(task = %task_id, "maximum runtime elapsed");
                    break Ended::Cancelled(CancelReason::Timeout);
                }
            }
        };

        let status = match ended {
            Ended::Exited(status) => status,
            Ended::Cancelled(reason) => match child.try_wait() {
                // Already gone: the exit status wins over the late request.
                Ok(Some(status)) => {
                    debug!(task = %task_id, "cancel requested after process exit; ignoring");
                    Ok(status)
                }
                _ => {
                    info!(task = %task_id, ?reason, "cancelling: killing process");
                    if let Err(e) = child.kill().await {
                        warn!(task = %task_id, error = %e, "failed to kill child process");
                    }
                    drop(stdin);
                    join_readers(&task_id, stdout, stderr).await;
                    return RunOutcome::Cancelled(reason);
                }
            },
        };
        drop(stdin);

        let tail = join_readers(&task_id, stdout, stderr).await;
        match status {
            Ok(status) if status.success() => {
                info!(task = %task_id, exit_code = 0, "tool process exited");
                RunOutcome::Succeeded
            }
            Ok(status) => {
                info!(task = %task_id, exit_code = ?status.code(), "tool process failed");
                RunOutcome::Failed {
                    exit_code: status.code(),
                    stderr_tail: tail.join("\n"),
                }
            }
            Err(e) => {
                warn!(task = %task_id, error = %e, "waiting for tool process failed");
                let mut detail = tail;
                detail.push(format!("wait failed: {e}"));
                RunOutcome::Failed {
                    exit_code: None,
                    stderr_tail: detail.join("\n"),
                }
            }
        }
    }
}

async fn send_key(task_id: &str, stdin: Option<&mut ChildStdin>, cmd: RunControl) {
    let Some(stdin) = stdin else {
        warn!(task = %task_id, ?cmd, "no stdin pipe; control ignored");
        return;
    };
    let mut buf = [0u8; 4];
    let key = cmd.key().encode_utf8(&mut buf);
    let write = async {
        stdin.write_all(key.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await
    };
    match write.await {
        Ok(()) => debug!(task = %task_id, ?cmd, "control key sent"),
        Err(e) => warn!(task = %task_id, ?cmd, error = %e, "failed to send control key"),
    }
}

/// Wait for both output readers. Returns the stderr tail.
async fn join_readers(
    task_id: &str,
    stdout: Option<JoinHandle<()>>,
    stderr: Option<JoinHandle<Vec<String>>>,
) -> Vec<String> {
    if let Some(handle) = stdout {
        if timeout(READER_GRACE, handle).await.is_err() {
            warn!(task = %task_id, "stdout reader did not finish in time");
        }
    }
    match stderr {
        Some(handle) => match timeout(READER_GRACE, handle).await {
            Ok(Ok(tail)) => tail,
            _ => {
                warn!(task = %task_id, "stderr reader did not finish in time");
                Vec::new()
            }
        },
        None => Vec::new(),
    }
}
