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


//! External command execution
//!
//! # Module Organization
//!
//! ## runner
//! - `CommandRunner` - The single choke point for ffmpeg, ffprobe and LLM calls
//! - `SystemRunner` - Spawns real processes with tokio
//!
//! ## scripted (`testing` feature)
//! - `ScriptedRunner` - Replays queued outputs and records calls

pub mod runner;
#[cfg(any(test, feature = "testing"))]
pub mod scripted;

pub use runner::{CommandRunner, SystemRunner};
#[cfg(any(test, feature = "testing"))]
pub use scripted::{RecordedCall, ScriptedResponse, ScriptedRunner};
