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


//! Scripted command runner
//!
//! Replays queued responses in call order and records every invocation.
//! Lets the pipeline run end to end without ffmpeg or a language model
//! installed, and lets tests assert on the exact arguments produced.

use crate::error::{Result, SplitterError};
use crate::exec::runner::CommandRunner;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

/// One queued outcome for a scripted call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedResponse {
    /// Process exited zero with this stdout
    Stdout(String),
    /// Process exited non-zero with this stderr
    Fail(String),
}

/// A single recorded invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
}

impl RecordedCall {
    /// Value following `flag` in the argument list, if present
    pub fn arg_after(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Every value following an occurrence of `flag`
    pub fn args_after(&self, flag: &str) -> Vec<&str> {
        self.args
            .windows(2)
            .filter(|w| w[0] == flag)
            .map(|w| w[1].as_str())
            .collect()
    }

    pub fn last_arg(&self) -> Option<&str> {
        self.args.last().map(String::as_str)
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    queue: VecDeque<ScriptedResponse>,
    fallback: Option<ScriptedResponse>,
    calls: Vec<RecordedCall>,
}

/// Command runner that answers from a script instead of spawning processes
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    state: Mutex<ScriptState>,
    /// Programs whose final argument is an output file to create on success
    touch_outputs_for: Vec<String>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response
    pub fn respond(self, stdout: impl Into<String>) -> Self {
        self.push(ScriptedResponse::Stdout(stdout.into()))
    }

    /// Queue a failing response
    pub fn fail(self, stderr: impl Into<String>) -> Self {
        self.push(ScriptedResponse::Fail(stderr.into()))
    }

    /// Response used once the queue is exhausted
    pub fn otherwise(self, response: ScriptedResponse) -> Self {
        self.lock().fallback = Some(response);
        self
    }

    /// Emulate `program` writing its output file: on every successful call
    /// an empty file is created at the final argument
    pub fn touch_outputs_for(mut self, program: impl Into<String>) -> Self {
        self.touch_outputs_for.push(program.into());
        self
    }

    fn push(self, response: ScriptedResponse) -> Self {
        self.lock().queue.push_back(response);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        // A poisoned lock only means another test thread panicked mid-call
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// All calls made so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Calls made to a given program, in order
    pub fn calls_to(&self, program: &str) -> Vec<RecordedCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.program == program)
            .cloned()
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Responses still queued
    pub fn remaining(&self) -> usize {
        self.lock().queue.len()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<String> {
        let response = {
            let mut state = self.lock();
            state.calls.push(RecordedCall {
                program: program.to_string(),
                args: args.to_vec(),
            });
            state
                .queue
                .pop_front()
                .or_else(|| state.fallback.clone())
        };

        match response {
            Some(ScriptedResponse::Stdout(stdout)) => {
                if self.touch_outputs_for.iter().any(|p| p == program) {
                    if let Some(output) = args.last() {
                        let output = Path::new(output);
                        tokio::fs::write(output, b"")
                            .await
                            .map_err(|e| SplitterError::file_io("write", output, e))?;
                    }
                }
                Ok(stdout)
            }
            Some(ScriptedResponse::Fail(stderr)) => Err(SplitterError::tool_failed(program, stderr)),
            None => Err(SplitterError::tool_failed(
                program,
                "no scripted response left",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let runner = ScriptedRunner::new().respond("one").fail("two");

        assert_eq!(runner.run("a", &["x".to_string()]).await.unwrap(), "one");
        let err = runner.run("b", &[]).await.unwrap_err();
        assert_eq!(err.to_string(), "b failed: two");

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].program, "a");
        assert_eq!(calls[0].args, vec!["x".to_string()]);
        assert_eq!(runner.remaining(), 0);
    }

    #[tokio::test]
    async fn test_exhausted_queue_uses_fallback() {
        let runner = ScriptedRunner::new().otherwise(ScriptedResponse::Stdout(String::new()));
        assert_eq!(runner.run("ffmpeg", &[]).await.unwrap(), "");

        let bare = ScriptedRunner::new();
        assert!(bare.run("ffmpeg", &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_touch_outputs_creates_last_argument() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.m4a");
        let runner = ScriptedRunner::new().respond("").touch_outputs_for("ffmpeg");

        runner
            .run("ffmpeg", &["-i".to_string(), out.to_string_lossy().to_string()])
            .await
            .unwrap();
        assert!(out.exists());
    }

    #[test]
    fn test_arg_lookup() {
        let call = RecordedCall {
            program: "ffmpeg".to_string(),
            args: ["-metadata", "title=A", "-metadata", "album=B", "out.m4a"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };
        assert_eq!(call.arg_after("-metadata"), Some("title=A"));
        assert_eq!(call.args_after("-metadata"), vec!["title=A", "album=B"]);
        assert_eq!(call.last_arg(), Some("out.m4a"));
        assert_eq!(call.arg_after("-ss"), None);
    }
}
