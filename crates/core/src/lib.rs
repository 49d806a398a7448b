//! Domain types and pure logic for the image generation service.
//!
//! Nothing in this crate performs I/O except [`config::RenderConfig::load`];
//! process execution lives in `imagegen-render` and HTTP in `imagegen-api`.

pub mod admission;
pub mod command;
pub mod config;
pub mod error;
pub mod job;
pub mod outcome;
pub mod request;
