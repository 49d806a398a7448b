//! Render job dispatch against the external image generation executable.
//!
//! [`dispatcher::JobDispatcher`] enforces the admission cap and classifies
//! each run; [`runner::ProcessRunner`] abstracts how the process is started.

pub mod dispatcher;
pub mod runner;

pub use dispatcher::JobDispatcher;
pub use runner::{ProcessExit, ProcessRunner, TokioProcessRunner};
