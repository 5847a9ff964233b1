//! External process execution with a deadline

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Failed while waiting for {program}: {source}")]
    Wait {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    #[error("{program} failed ({status}): {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// What a successful run left behind
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stderr: String,
    pub elapsed: Duration,
}

/// Run `command` to completion, killing it once `timeout` elapses
///
/// Stdout is discarded and stderr is captured for error reporting. A
/// non-zero exit status is an error. The child runs in its own process
/// group on unix, and the deadline also bounds the wait for stderr to
/// close: anything the child left running past it is killed and its
/// stderr tail dropped.
pub fn run_with_timeout(mut command: Command, timeout: Duration) -> Result<ProcessOutput, ProcessError> {
    let program = command.get_program().to_string_lossy().to_string();
    let started = Instant::now();
    own_process_group(&mut command);

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ProcessError::Spawn {
            program: program.clone(),
            source,
        })?;
    debug!(%program, pid = child.id(), "process started");

    // Drained on a thread so a chatty child never blocks on a full pipe
    let (stderr_tx, stderr_rx) = mpsc::channel();
    if let Some(mut pipe) = child.stderr.take() {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            let _ = stderr_tx.send(buf);
        });
    }

    let deadline = started + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                warn!(%program, ?timeout, "process timed out, killing");
                kill_group(&mut child);
                let _ = child.wait();
                return Err(ProcessError::TimedOut { program, timeout });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(source) => {
                kill_group(&mut child);
                return Err(ProcessError::Wait { program, source });
            }
        }
    };

    // A descendant holding the pipe open keeps stderr from closing
    let stderr = match stderr_rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(buf) => String::from_utf8_lossy(&buf).trim().to_string(),
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!(%program, "stderr still open at deadline, killing leftover processes");
            kill_group(&mut child);
            String::new()
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => String::new(),
    };
    let elapsed = started.elapsed();

    if !status.success() {
        return Err(ProcessError::Failed {
            program,
            status,
            stderr,
        });
    }

    debug!(%program, ?elapsed, "process finished");
    Ok(ProcessOutput { stderr, elapsed })
}

#[cfg(unix)]
fn own_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_command: &mut Command) {}

/// Kill the child and everything still running in its process group
fn kill_group(child: &mut Child) {
    #[cfg(unix)]
    signal_group(child.id());
    let _ = child.kill();
}

#[cfg(unix)]
fn signal_group(pid: u32) {
    if let Ok(pgid) = libc::pid_t::try_from(pid) {
        // SAFETY: kill(2) has no memory effects; a negative pid targets the
        // group `own_process_group` created, which shares the child's id.
        unsafe { libc::kill(-pgid, libc::SIGKILL) };
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn test_success() {
        let output = run_with_timeout(sh("exit 0"), Duration::from_secs(10)).unwrap();
        assert!(output.stderr.is_empty());
    }

    #[test]
    fn test_failure_captures_stderr() {
        let err = run_with_timeout(sh("echo broken >&2; exit 3"), Duration::from_secs(10))
            .unwrap_err();
        match err {
            ProcessError::Failed { status, stderr, .. } => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_timeout_kills_process() {
        let started = Instant::now();
        let err = run_with_timeout(sh("exec sleep 30"), Duration::from_millis(200)).unwrap_err();

        assert!(matches!(err, ProcessError::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_background_child_does_not_outlive_deadline() {
        let started = Instant::now();
        let output = run_with_timeout(sh("sleep 6 & exit 0"), Duration::from_secs(1)).unwrap();

        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(output.stderr.is_empty());
    }

    #[test]
    fn test_timeout_kills_whole_group() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("survived");
        let script = format!("(sleep 1; touch '{}') & sleep 30", marker.display());

        let err = run_with_timeout(sh(&script), Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, ProcessError::TimedOut { .. }));

        thread::sleep(Duration::from_millis(1500));
        assert!(!marker.exists());
    }

    #[test]
    fn test_missing_program() {
        let err = run_with_timeout(
            Command::new("/nonexistent/converter-binary"),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }
}
