//! `logmate` front-end: argument and config handling, the upload session and
//! its text rendering.
pub mod config;
pub mod render;
pub mod session;

pub use config::{Args, ConfigError, FileConfig, RunConfig};
pub use session::{run, SessionSummary};
