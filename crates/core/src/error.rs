#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Terminal failure of an admitted (or rejected) render job.
///
/// None of these are retried internally; retry policy belongs to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// Every admission slot is taken. The caller should back off and retry.
    #[error("admission denied: all {capacity} render slots are in use")]
    AdmissionDenied { capacity: usize },

    /// The process exceeded its wall-clock budget and was killed.
    #[error("render process exceeded its time budget")]
    ExecutionTimeout,

    /// The process could not be started or exited unsuccessfully.
    /// `exit_code` is `None` for spawn failures and signal terminations.
    #[error("render process failed (exit code {exit_code:?})")]
    ExecutionFailed { exit_code: Option<i32> },

    /// The process exited 0 but never wrote the artifact.
    #[error("render process reported success but produced no output file")]
    ArtifactMissing,
}
