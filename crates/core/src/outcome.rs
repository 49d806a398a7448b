//! Terminal result of a single render job.

use std::path::PathBuf;

use crate::error::RenderError;
use crate::job::JobId;

/// Exactly one of these is produced per request. It is never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Success { job_id: JobId, path: PathBuf },
    ProcessFailed { exit_code: Option<i32> },
    Timeout,
    OutputMissing,
    /// Admission denied; `capacity` is the configured slot count.
    Busy { capacity: usize },
}

/// Artifact written by a successful job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub job_id: JobId,
    pub path: PathBuf,
}

impl RenderOutcome {
    /// Short label for logs and metrics fields.
    pub fn label(&self) -> &'static str {
        match self {
            RenderOutcome::Success { .. } => "success",
            RenderOutcome::ProcessFailed { .. } => "process_failed",
            RenderOutcome::Timeout => "timeout",
            RenderOutcome::OutputMissing => "output_missing",
            RenderOutcome::Busy { .. } => "busy",
        }
    }

    pub fn into_result(self) -> Result<RenderedImage, RenderError> {
        match self {
            RenderOutcome::Success { job_id, path } => Ok(RenderedImage { job_id, path }),
            RenderOutcome::ProcessFailed { exit_code } => {
                Err(RenderError::ExecutionFailed { exit_code })
            }
            RenderOutcome::Timeout => Err(RenderError::ExecutionTimeout),
            RenderOutcome::OutputMissing => Err(RenderError::ArtifactMissing),
            RenderOutcome::Busy { capacity } => Err(RenderError::AdmissionDenied { capacity }),
        }
    }
}
