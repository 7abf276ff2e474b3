//! Audiobook chapter splitting and title reconciliation
//!
//! Turns one audiobook file (optionally Audible AAX) into a directory of
//! per-chapter files with clean titles and embedded cover art. The heavy
//! lifting is done by external tools, FFmpeg/FFprobe for media and an `llm`
//! CLI for titles, all invoked through [`exec::CommandRunner`].

pub mod audio;
pub mod config;
pub mod crypto;
pub mod error;
pub mod exec;
pub mod file;
pub mod pipeline;
pub mod title;

pub use config::SplitterConfig;
pub use error::{Result, SplitterError};
pub use exec::{CommandRunner, SystemRunner};
#[cfg(any(test, feature = "testing"))]
pub use exec::ScriptedRunner;
pub use pipeline::{Pipeline, ProcessOptions, ProcessReport};
