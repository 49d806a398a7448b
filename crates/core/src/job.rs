//! Job identity and output path resolution.
//!
//! Every job gets a fresh random UUID v4. The artifact file name is derived
//! from the id alone, never from request content, so two jobs with the same
//! prompt can never share an output path and no request field can steer
//! the path outside the output directory.

use std::fmt;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::command;
use crate::config::RenderConfig;
use crate::request::RenderParams;

/// Extension of every artifact the renderer writes.
pub const ARTIFACT_EXTENSION: &str = "png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// `<uuid>.png`
    pub fn file_name(&self) -> String {
        format!("{}.{ARTIFACT_EXTENSION}", self.0)
    }

    /// Parse an artifact file name produced by [`JobId::file_name`].
    ///
    /// Returns `None` for anything else, including names with path
    /// separators, other extensions, or a non-canonical UUID.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(ARTIFACT_EXTENSION)?.strip_suffix('.')?;
        let id = Uuid::try_parse(stem).ok()?;
        // Only the lowercase hyphenated form we emit is accepted.
        (id.hyphenated().to_string() == stem).then_some(Self(id))
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Generate a fresh job id and the absolute artifact path inside `output_dir`.
pub fn resolve(output_dir: &Path) -> (JobId, PathBuf) {
    let id = JobId::new();
    let dir = std::path::absolute(output_dir).unwrap_or_else(|_| output_dir.to_path_buf());
    let path = dir.join(id.file_name());
    (id, path)
}

/// Everything needed to run one render. Built once per request, never reused.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub id: JobId,
    pub output_path: PathBuf,
    /// Full argument vector, executable first.
    pub argv: Vec<String>,
}

impl JobSpec {
    pub fn new(config: &RenderConfig, params: &RenderParams) -> Self {
        let (id, output_path) = resolve(&config.output_dir);
        let argv = command::build_args(config, params, &output_path);
        Self {
            id,
            output_path,
            argv,
        }
    }
}
