//! Job dispatcher: admission, process execution, and outcome classification.
//!
//! Per job:
//!
//! ```text
//! try_acquire ──denied──▶ Busy
//!      │
//!   admitted ─▶ build JobSpec ─▶ run (bounded by timeout)
//!                                   ├─ timed out ─────────────▶ Timeout
//!                                   ├─ spawn/wait error ──────▶ ProcessFailed { None }
//!                                   ├─ exit != 0 ─────────────▶ ProcessFailed { code }
//!                                   ├─ exit 0, no artifact ───▶ OutputMissing
//!                                   └─ exit 0, artifact ──────▶ Success
//! ```
//!
//! The admission permit lives on the stack of [`JobDispatcher::dispatch`],
//! so it is released on every one of these paths, and also if the runner
//! panics or the dispatch future is dropped.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use imagegen_core::admission::AdmissionGate;
use imagegen_core::config::RenderConfig;
use imagegen_core::job::JobSpec;
use imagegen_core::outcome::RenderOutcome;
use imagegen_core::request::RenderParams;

use crate::runner::{ProcessExit, ProcessRunner};

/// Extra time granted to a runner past the render timeout before the
/// dispatcher stops waiting on it.
pub const RUNNER_GRACE: Duration = Duration::from_secs(30);

pub struct JobDispatcher {
    config: Arc<RenderConfig>,
    gate: AdmissionGate,
    runner: Arc<dyn ProcessRunner>,
}

impl JobDispatcher {
    /// Create a dispatcher whose admission capacity is
    /// `config.max_concurrent_renders`.
    pub fn new(config: Arc<RenderConfig>, runner: Arc<dyn ProcessRunner>) -> Self {
        let gate = AdmissionGate::new(config.max_concurrent_renders);
        Self {
            config,
            gate,
            runner,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    /// Run one render job end to end.
    pub async fn dispatch(&self, params: RenderParams) -> RenderOutcome {
        let Some(_permit) = self.gate.try_acquire() else {
            tracing::warn!(
                capacity = self.gate.capacity(),
                "Render rejected: all slots in use"
            );
            return RenderOutcome::Busy {
                capacity: self.gate.capacity(),
            };
        };

        let job = JobSpec::new(&self.config, &params);
        let started = Instant::now();

        tracing::info!(
            job_id = %job.id,
            in_flight = self.gate.in_flight(),
            capacity = self.gate.capacity(),
            "Render started"
        );
        tracing::debug!(job_id = %job.id, argv = ?job.argv, "Render command");

        let outcome = self.execute(&job).await;

        tracing::info!(
            job_id = %job.id,
            outcome = outcome.label(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Render finished"
        );
        outcome
    }

    async fn execute(&self, job: &JobSpec) -> RenderOutcome {
        let timeout = self.config.render_timeout();

        let wait = timeout.saturating_add(RUNNER_GRACE);
        let exit = match tokio::time::timeout(wait, self.runner.run(job, timeout)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(job_id = %job.id, "Render runner ignored its timeout, abandoning wait");
                Ok(ProcessExit::TimedOut)
            }
        };

        match exit {
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "Failed to run render process");
                RenderOutcome::ProcessFailed { exit_code: None }
            }
            Ok(ProcessExit::TimedOut) => RenderOutcome::Timeout,
            Ok(ProcessExit::Exited { code: Some(0) }) => {
                if artifact_exists(&job.output_path).await {
                    RenderOutcome::Success {
                        job_id: job.id,
                        path: job.output_path.clone(),
                    }
                } else {
                    tracing::error!(
                        job_id = %job.id,
                        path = %job.output_path.display(),
                        "Render process exited 0 without writing its output"
                    );
                    RenderOutcome::OutputMissing
                }
            }
            Ok(ProcessExit::Exited { code }) => {
                tracing::error!(job_id = %job.id, exit_code = ?code, "Render process failed");
                RenderOutcome::ProcessFailed { exit_code: code }
            }
        }
    }
}

async fn artifact_exists(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
