//! Execution of the external rendering executable.
//!
//! [`ProcessRunner`] is the seam between the dispatcher and the operating
//! system so the dispatcher can be exercised with scripted runners.
//! [`TokioProcessRunner`] is the production implementation.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use imagegen_core::job::{JobId, JobSpec};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// How a render process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// The process exited on its own. `code` is `None` when it was
    /// terminated by a signal.
    Exited { code: Option<i32> },
    /// The time budget elapsed and the process was killed.
    TimedOut,
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `job.argv` to completion or until `timeout` elapses.
    ///
    /// Implementations must not leave the process running after returning
    /// [`ProcessExit::TimedOut`]. An `Err` means the process could not be
    /// started or waited on.
    async fn run(&self, job: &JobSpec, timeout: Duration) -> io::Result<ProcessExit>;
}

/// Spawns the executable directly (no shell) with `tokio::process`.
///
/// Stdout and stderr are forwarded to `tracing` at debug level. On timeout
/// the child is killed and reaped before returning. `kill_on_drop` also
/// covers the case where the surrounding future is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, job: &JobSpec, timeout: Duration) -> io::Result<ProcessExit> {
        let (program, args) = job
            .argv
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty argument vector"))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        tracing::debug!(job_id = %job.id, pid = ?child.id(), "Render process spawned");

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_output(job.id, "stdout", stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_output(job.id, "stderr", stderr));
        }

        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(status) => Ok(ProcessExit::Exited {
                code: status?.code(),
            }),
            Err(_) => {
                tracing::warn!(
                    job_id = %job.id,
                    timeout_secs = timeout.as_secs(),
                    "Render process timed out, killing"
                );
                if let Err(e) = child.kill().await {
                    tracing::error!(job_id = %job.id, error = %e, "Failed to kill render process");
                }
                Ok(ProcessExit::TimedOut)
            }
        }
    }
}

/// Relay each line of a child's output stream to the log until EOF.
///
/// Lines are decoded lossily so non-UTF-8 output never stops the drain;
/// an undrained pipe would eventually block the child.
async fn forward_output<R>(job_id: JobId, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                tracing::debug!(%job_id, stream, "{}", line.trim_end());
            }
            Err(e) => {
                tracing::debug!(%job_id, stream, error = %e, "Stopped reading render output");
                break;
            }
        }
    }
}
