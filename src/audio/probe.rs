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


//! Container metadata probing via FFprobe
//!
//! # FFprobe Output
//! ```json
//! {
//!   "format": {
//!     "duration": "3725.120000",
//!     "tags": { "title": "Dune", "album": "Dune", "artist": "Frank Herbert" }
//!   },
//!   "chapters": [
//!     { "time_base": "1/1000", "start": 0, "end": 1000, "tags": { "title": "Opening" } }
//!   ]
//! }
//! ```
//!
//! Output is parsed into typed structures; any missing or mistyped field is
//! reported as a `Probe` error naming the field instead of surfacing later.

use crate::audio::format::AudioSource;
use crate::error::{Result, SplitterError};
use crate::exec::CommandRunner;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Container-level tags and duration of a source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioMetadata {
    pub title: String,
    pub album: String,
    pub artist: String,
    /// Whole milliseconds, truncated so it never overshoots the real length
    pub duration_ms: u64,
}

/// Embedded chapter marker exactly as FFprobe reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterMarker {
    pub time_base: String,
    pub start: i64,
    pub end: i64,
    pub title: Option<String>,
}

/// Reads metadata and chapter markers from audio containers
#[derive(Clone)]
pub struct MetadataProbe {
    runner: Arc<dyn CommandRunner>,
    ffprobe: String,
}

impl MetadataProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, ffprobe: impl Into<String>) -> Self {
        Self {
            runner,
            ffprobe: ffprobe.into(),
        }
    }

    /// Read title, album, artist and duration
    ///
    /// # Errors
    /// - Probe if FFprobe fails, prints invalid JSON, or a required field is absent
    pub async fn probe(&self, source: &AudioSource) -> Result<AudioMetadata> {
        let args = vec![
            source.path().to_string_lossy().to_string(),
            "-v".to_string(),
            "quiet".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_format".to_string(),
        ];

        let stdout = self.run_probe(&args, source).await?;
        let metadata = parse_metadata(&stdout)?;
        debug!(
            file = %source.path().display(),
            title = %metadata.title,
            duration_ms = metadata.duration_ms,
            "probed metadata"
        );
        Ok(metadata)
    }

    /// Read embedded chapter markers, unfiltered
    ///
    /// # Errors
    /// - Probe if FFprobe fails or prints an unexpected shape
    pub async fn chapter_markers(&self, source: &AudioSource) -> Result<Vec<ChapterMarker>> {
        let args = vec![
            "-v".to_string(),
            "quiet".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_chapters".to_string(),
            source.path().to_string_lossy().to_string(),
        ];

        let stdout = self.run_probe(&args, source).await?;
        parse_chapter_markers(&stdout)
    }

    async fn run_probe(&self, args: &[String], source: &AudioSource) -> Result<String> {
        self.runner
            .run(&self.ffprobe, args)
            .await
            .map_err(|e| match e {
                SplitterError::ToolFailed { stderr, .. } => SplitterError::probe(format!(
                    "{}: ffprobe exited with an error: {}",
                    source.path().display(),
                    stderr.trim()
                )),
                other => other,
            })
    }
}

/// FFprobe `-show_format` output
#[derive(Debug, Deserialize)]
struct FormatProbe {
    format: FormatSection,
}

#[derive(Debug, Deserialize)]
struct FormatSection {
    duration: Option<String>,
    tags: Option<HashMap<String, String>>,
}

/// FFprobe `-show_chapters` output
#[derive(Debug, Deserialize)]
struct ChapterProbe {
    chapters: Vec<ChapterProbeEntry>,
}

#[derive(Debug, Deserialize)]
struct ChapterProbeEntry {
    time_base: String,
    start: i64,
    end: i64,
    tags: Option<HashMap<String, String>>,
}

/// Case-insensitive tag lookup; some muxers write `TITLE`
fn tag<'a>(tags: &'a HashMap<String, String>, key: &str) -> Option<&'a String> {
    tags.get(key).or_else(|| {
        tags.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

/// Parse `-show_format` JSON into metadata
pub fn parse_metadata(json: &str) -> Result<AudioMetadata> {
    let probe: FormatProbe = serde_json::from_str(json)
        .map_err(|e| SplitterError::probe(format!("Failed to parse metadata: {}", e)))?;

    let tags = probe
        .format
        .tags
        .ok_or_else(|| SplitterError::probe("format.tags is missing"))?;

    let required = |key: &str| {
        tag(&tags, key)
            .cloned()
            .ok_or_else(|| SplitterError::probe(format!("format.tags.{} is missing", key)))
    };

    let title = required("title")?;
    let album = required("album")?;
    let artist = required("artist")?;

    let duration = probe
        .format
        .duration
        .ok_or_else(|| SplitterError::probe("format.duration is missing"))?;

    Ok(AudioMetadata {
        title,
        album,
        artist,
        duration_ms: parse_duration_ms(&duration)?,
    })
}

/// Convert FFprobe's decimal seconds into whole milliseconds, truncating
pub fn parse_duration_ms(seconds: &str) -> Result<u64> {
    let value: f64 = seconds.trim().parse().map_err(|e| {
        SplitterError::probe(format!("format.duration '{}' is not a number: {}", seconds, e))
    })?;

    if !value.is_finite() || value < 0.0 {
        return Err(SplitterError::probe(format!(
            "format.duration '{}' is not a finite non-negative number",
            seconds
        )));
    }

    Ok((value * 1000.0).floor() as u64)
}

/// Parse `-show_chapters` JSON into raw markers
pub fn parse_chapter_markers(json: &str) -> Result<Vec<ChapterMarker>> {
    let probe: ChapterProbe = serde_json::from_str(json)
        .map_err(|e| SplitterError::probe(format!("Failed to parse chapters: {}", e)))?;

    Ok(probe
        .chapters
        .into_iter()
        .map(|c| ChapterMarker {
            title: c.tags.as_ref().and_then(|t| tag(t, "title")).cloned(),
            time_base: c.time_base,
            start: c.start,
            end: c.end,
        })
        .collect())
}
