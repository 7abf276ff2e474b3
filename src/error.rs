//! Error types for Book Splitter
//!
//! This module defines error types using thiserror for ergonomic error handling.
//! Errors are grouped by the stage of the pipeline that raises them.
//!
//! ## Error Categories
//!
//! ### Probing (ffprobe)
//! - Tool output that is not valid JSON, or lacks title/album/artist/duration → `Probe`
//!
//! ### DRM
//! - FFmpeg rejected the activation bytes or the container is not AAX → `Drm`
//! - Malformed activation bytes supplied by the user → `InvalidActivationBytes`
//!
//! ### Title reconciliation
//! - The language model never produced a single-line answer → `Disambiguation`
//!
//! ### External tools
//! - Non-zero exit status → `ToolFailed` (carries captured stderr)
//! - Executable missing from PATH → `ToolNotFound`
//!
//! ### Files and configuration
//! - `FileIoError`, `InvalidPath`, `Configuration`, plus `#[from]` conversions

use thiserror::Error;

/// Result type alias using our SplitterError type
pub type Result<T> = std::result::Result<T, SplitterError>;

/// Main error type for Book Splitter
#[derive(Error, Debug)]
pub enum SplitterError {
    // ===== Probe Errors =====

    /// Source metadata or chapter markers could not be read
    #[error("Probe failed: {0}")]
    Probe(String),

    /// A resolved chapter list came back empty
    #[error("No chapters to segment")]
    EmptyChapterSet,

    // ===== DRM Errors =====

    /// FFmpeg failed to decrypt the source with the given activation bytes
    #[error("DRM removal failed: {0}")]
    Drm(String),

    /// Activation bytes are not 8 hex characters
    #[error("Invalid activation bytes: {0}")]
    InvalidActivationBytes(String),

    /// An encrypted source was given without activation bytes
    #[error("Activation bytes required to decrypt {0}")]
    ActivationBytesRequired(String),

    // ===== Title Errors =====

    /// The language model never returned a single-line title
    #[error("Could not disambiguate title after {} attempts", .attempts.len())]
    Disambiguation {
        /// Every raw response, in call order
        attempts: Vec<String>,
    },

    // ===== External Tool Errors =====

    /// External program exited with a non-zero status
    #[error("{program} failed: {stderr}")]
    ToolFailed {
        program: String,
        /// Captured standard error of the failed process
        stderr: String,
    },

    /// External program is not installed or not in PATH
    #[error("{0} not found. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    // ===== File/Config Errors =====

    /// Generic file I/O error with context
    #[error("File I/O error: {0}")]
    FileIoError(String),

    /// Path cannot be used to derive an output name
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Configuration file is unreadable or inconsistent
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    // ===== External Library Errors =====

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    /// TOML configuration parse error
    #[error("Configuration parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SplitterError {
    /// Create a Probe error with a message
    pub fn probe<S: Into<String>>(message: S) -> Self {
        SplitterError::Probe(message.into())
    }

    /// Create a ToolFailed error
    pub fn tool_failed<P: Into<String>, S: Into<String>>(program: P, stderr: S) -> Self {
        SplitterError::ToolFailed {
            program: program.into(),
            stderr: stderr.into(),
        }
    }

    /// Wrap an I/O error with the operation and path it came from
    pub fn file_io(operation: &str, path: &std::path::Path, err: std::io::Error) -> Self {
        SplitterError::FileIoError(format!("{}: {} - {}", operation, path.display(), err))
    }

    /// Check if error came from an external program
    pub fn is_tool_error(&self) -> bool {
        matches!(
            self,
            SplitterError::ToolFailed { .. } | SplitterError::ToolNotFound(_)
        )
    }

    /// Check if error is related to DRM removal
    pub fn is_crypto_error(&self) -> bool {
        matches!(
            self,
            SplitterError::Drm(_)
                | SplitterError::InvalidActivationBytes(_)
                | SplitterError::ActivationBytesRequired(_)
        )
    }

    /// Get user-friendly error message suitable for display
    pub fn user_message(&self) -> String {
        match self {
            SplitterError::ToolNotFound(program) => format!(
                "{} is required but not found. Install it and ensure it's in your PATH.",
                program
            ),
            SplitterError::ActivationBytesRequired(path) => format!(
                "'{}' is an encrypted Audible file. Pass --activation-bytes to decrypt it.",
                path
            ),
            SplitterError::Disambiguation { attempts } => {
                let list = attempts
                    .iter()
                    .enumerate()
                    .map(|(i, a)| format!("  attempt {}: {:?}", i + 1, a))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!(
                    "Could not work out the book title. Pass --title to set it explicitly.\n{}",
                    list
                )
            }
            _ => self.to_string(),
        }
    }
}
