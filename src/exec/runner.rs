// Book Splitter - Audiobook chapter splitting and tagging
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! External program execution
//!
//! Every ffmpeg, ffprobe and language model invocation goes through
//! [`CommandRunner::run`]. The call returns captured stdout on success and
//! fails with the captured stderr when the process exits non-zero.

use crate::error::{Result, SplitterError};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Runs an external program to completion and captures its output
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, returning standard output as text
    ///
    /// # Errors
    /// - ToolNotFound if the program cannot be spawned because it is missing
    /// - ToolFailed with captured stderr if the exit status is non-zero
    async fn run(&self, program: &str, args: &[String]) -> Result<String>;
}

/// Runner backed by real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<String> {
        debug!(program, ?args, "running external command");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SplitterError::ToolNotFound(program.to_string())
                } else {
                    SplitterError::tool_failed(program, format!("Failed to execute: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            debug!(program, status = ?output.status.code(), "external command failed");
            return Err(SplitterError::tool_failed(program, stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
