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


//! Chapter resolution
//!
//! # Resolution Rules
//! 1. Read embedded chapter markers with FFprobe
//! 2. Keep only markers whose `time_base` is exactly `1/1000`; others are
//!    dropped, not converted
//! 3. If any survive, they are the chapter list, ordered by start
//! 4. Otherwise the whole file becomes one chapter titled with the
//!    container title; a file shorter than one millisecond is a probe error
//!
//! A file whose markers are all in another unit gets the same whole-file
//! chapter as a file with no markers at all.

use crate::audio::format::AudioSource;
use crate::audio::probe::{AudioMetadata, ChapterMarker, MetadataProbe};
use crate::error::{Result, SplitterError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// The only marker time base honored
pub const MILLISECOND_TIME_BASE: &str = "1/1000";

/// Chapter marker structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Start time in milliseconds
    pub start_ms: u64,
    /// End time in milliseconds, always greater than `start_ms`
    pub end_ms: u64,
    pub title: String,
}

impl Chapter {
    /// Get chapter duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }

    pub fn start_seconds(&self) -> f64 {
        self.start_ms as f64 / 1000.0
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_ms() as f64 / 1000.0
    }
}

/// Where a chapter list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChapterOrigin {
    /// Embedded millisecond markers
    Markers,
    /// Single synthetic chapter spanning the file
    WholeFile,
}

/// Ordered, non-empty chapter list for one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterSet {
    chapters: Vec<Chapter>,
    origin: ChapterOrigin,
}

impl ChapterSet {
    /// Build from embedded markers
    ///
    /// Chapters are ordered by start; equal starts keep their marker order.
    ///
    /// # Errors
    /// - EmptyChapterSet if `chapters` is empty
    pub fn from_markers(mut chapters: Vec<Chapter>) -> Result<Self> {
        if chapters.is_empty() {
            return Err(SplitterError::EmptyChapterSet);
        }
        chapters.sort_by_key(|c| c.start_ms);
        Ok(Self {
            chapters,
            origin: ChapterOrigin::Markers,
        })
    }

    /// One chapter covering `[0, duration_ms]`
    ///
    /// # Errors
    /// - Probe if `duration_ms` is zero
    pub fn whole_file(title: impl Into<String>, duration_ms: u64) -> Result<Self> {
        if duration_ms == 0 {
            return Err(SplitterError::probe(
                "file has zero duration, cannot build a whole-file chapter",
            ));
        }
        Ok(Self {
            chapters: vec![Chapter {
                start_ms: 0,
                end_ms: duration_ms,
                title: title.into(),
            }],
            origin: ChapterOrigin::WholeFile,
        })
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn origin(&self) -> ChapterOrigin {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    /// Check if the set has no chapters
    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chapter> {
        self.chapters.iter()
    }
}

impl<'a> IntoIterator for &'a ChapterSet {
    type Item = &'a Chapter;
    type IntoIter = std::slice::Iter<'a, Chapter>;

    fn into_iter(self) -> Self::IntoIter {
        self.chapters.iter()
    }
}

/// Produces the authoritative chapter list for a source
#[derive(Clone)]
pub struct ChapterResolver {
    probe: MetadataProbe,
}

impl ChapterResolver {
    pub fn new(probe: MetadataProbe) -> Self {
        Self { probe }
    }

    /// Resolve chapters from markers, falling back to one whole-file chapter
    ///
    /// The fallback probes the container metadata itself; use
    /// [`resolve_chapters_with`](Self::resolve_chapters_with) when it is
    /// already known.
    ///
    /// # Errors
    /// - Probe if markers cannot be read, a kept marker is malformed, the
    ///   fallback metadata probe fails, or the file has zero duration
    pub async fn resolve_chapters(&self, source: &AudioSource) -> Result<ChapterSet> {
        if let Some(set) = self.marker_chapters(source).await? {
            return Ok(set);
        }
        let metadata = self.probe.probe(source).await?;
        ChapterSet::whole_file(metadata.title, metadata.duration_ms)
    }

    /// Same as [`resolve_chapters`](Self::resolve_chapters), with the
    /// fallback built from already probed `metadata`
    pub async fn resolve_chapters_with(
        &self,
        source: &AudioSource,
        metadata: &AudioMetadata,
    ) -> Result<ChapterSet> {
        match self.marker_chapters(source).await? {
            Some(set) => Ok(set),
            None => ChapterSet::whole_file(metadata.title.clone(), metadata.duration_ms),
        }
    }

    /// `None` when no marker is in milliseconds
    async fn marker_chapters(&self, source: &AudioSource) -> Result<Option<ChapterSet>> {
        let markers = self.probe.chapter_markers(source).await?;
        let total = markers.len();
        let kept = millisecond_chapters(markers)?;

        if kept.is_empty() {
            debug!(
                file = %source.path().display(),
                markers = total,
                "no millisecond chapter markers, treating file as one chapter"
            );
            return Ok(None);
        }

        info!(
            file = %source.path().display(),
            chapters = kept.len(),
            dropped = total - kept.len(),
            "using embedded chapter markers"
        );
        ChapterSet::from_markers(kept).map(Some)
    }
}

/// Keep markers in milliseconds, in source order
///
/// # Errors
/// - Probe if a kept marker has a negative start, `end <= start`, or no title
pub fn millisecond_chapters(markers: Vec<ChapterMarker>) -> Result<Vec<Chapter>> {
    markers
        .into_iter()
        .enumerate()
        .filter(|(_, m)| m.time_base == MILLISECOND_TIME_BASE)
        .map(|(idx, m)| {
            if m.start < 0 || m.end <= m.start {
                return Err(SplitterError::probe(format!(
                    "chapters[{}] has invalid bounds {}..{}",
                    idx, m.start, m.end
                )));
            }
            let title = m.title.ok_or_else(|| {
                SplitterError::probe(format!("chapters[{}].tags.title is missing", idx))
            })?;
            Ok(Chapter {
                start_ms: m.start as u64,
                end_ms: m.end as u64,
                title,
            })
        })
        .collect()
}

/// Format seconds as `H:M:S` for FFmpeg's `-ss` and `-t`
///
/// Hours and minutes are peeled off with floor-divide-and-subtract; no
/// zero padding. The seconds part keeps any fraction (`1.5` → `"0:0:1.5"`).
pub fn format_timestamp(total_seconds: f64) -> String {
    let mut remaining = total_seconds;

    let hours = (remaining / 3600.0).floor();
    remaining -= hours * 3600.0;

    let minutes = (remaining / 60.0).floor();
    remaining -= minutes * 60.0;

    format!("{}:{}:{}", hours as u64, minutes as u64, remaining)
}

/// Same layout as [`format_timestamp`], computed from whole milliseconds
/// so the seconds part carries no floating point residue
pub fn format_ms_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms - hours * 3_600_000) / 60_000;
    let rest_ms = ms - hours * 3_600_000 - minutes * 60_000;

    format!("{}:{}:{}", hours, minutes, rest_ms as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ScriptedRunner;
    use std::sync::Arc;

    fn marker(time_base: &str, start: i64, end: i64, title: &str) -> ChapterMarker {
        ChapterMarker {
            time_base: time_base.to_string(),
            start,
            end,
            title: Some(title.to_string()),
        }
    }

    #[test]
    fn test_chapter_duration() {
        let chapter = Chapter {
            title: "Chapter 1".to_string(),
            start_ms: 1000,
            end_ms: 2500,
        };
        assert_eq!(chapter.duration_ms(), 1500);
        assert_eq!(chapter.start_seconds(), 1.0);
        assert_eq!(chapter.duration_seconds(), 1.5);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(3661.0), "1:1:1");
        assert_eq!(format_timestamp(59.0), "0:0:59");
        assert_eq!(format_timestamp(0.0), "0:0:0");
        assert_eq!(format_timestamp(1.5), "0:0:1.5");
        assert_eq!(format_timestamp(7200.0), "2:0:0");
    }

    #[test]
    fn test_format_ms_timestamp_matches() {
        for ms in [0u64, 1000, 1500, 59_000, 3_661_000, 7_200_000] {
            assert_eq!(format_ms_timestamp(ms), format_timestamp(ms as f64 / 1000.0));
        }
        assert_eq!(format_ms_timestamp(3_661_123), "1:1:1.123");
    }

    #[test]
    fn test_millisecond_filter_drops_other_units() {
        let markers = vec![
            marker("1/1000", 0, 1000, "A"),
            marker("1/44100", 44100, 88200, "B"),
            marker("1/1000", 1000, 2500, "C"),
        ];
        let chapters = millisecond_chapters(markers).unwrap();
        let titles: Vec<_> = chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "C"]);
    }

    #[test]
    fn test_kept_marker_without_title_rejected() {
        let markers = vec![ChapterMarker {
            time_base: "1/1000".to_string(),
            start: 0,
            end: 10,
            title: None,
        }];
        assert!(matches!(
            millisecond_chapters(markers),
            Err(SplitterError::Probe(_))
        ));
    }

    #[test]
    fn test_dropped_marker_is_not_validated() {
        let markers = vec![ChapterMarker {
            time_base: "1/90000".to_string(),
            start: 5,
            end: 5,
            title: None,
        }];
        assert!(millisecond_chapters(markers).unwrap().is_empty());
    }

    #[test]
    fn test_markers_ordered_by_start() {
        let set = ChapterSet::from_markers(vec![
            Chapter { start_ms: 2000, end_ms: 3000, title: "C".to_string() },
            Chapter { start_ms: 0, end_ms: 1000, title: "A".to_string() },
            Chapter { start_ms: 1000, end_ms: 2000, title: "B".to_string() },
        ])
        .unwrap();
        let titles: Vec<_> = set.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_empty_chapter_set_rejected() {
        assert!(matches!(
            ChapterSet::from_markers(vec![]),
            Err(SplitterError::EmptyChapterSet)
        ));
    }

    #[tokio::test]
    async fn test_resolve_uses_markers_without_fallback() {
        let runner = Arc::new(ScriptedRunner::new().respond(
            r#"{"chapters": [
                {"time_base": "1/1000", "start": 0, "end": 1000, "tags": {"title": "A"}},
                {"time_base": "1/1000", "start": 1000, "end": 2500, "tags": {"title": "B"}}
            ]}"#,
        ));
        let resolver = ChapterResolver::new(MetadataProbe::new(runner.clone(), "ffprobe"));
        let source = AudioSource::from_path("book.m4b").unwrap();

        let set = resolver.resolve_chapters(&source).await.unwrap();
        assert_eq!(set.origin(), ChapterOrigin::Markers);
        assert_eq!(set.len(), 2);
        assert_eq!(set.chapters()[1].start_ms, 1000);
        // Only the chapter query, no metadata probe
        assert_eq!(runner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_whole_file() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .respond(r#"{"chapters": [{"time_base": "1/44100", "start": 0, "end": 44100}]}"#)
                .respond(
                    r#"{"format": {"duration": "12.3456", "tags": {"title": "Solo", "album": "Solo", "artist": "X"}}}"#,
                ),
        );
        let resolver = ChapterResolver::new(MetadataProbe::new(runner.clone(), "ffprobe"));
        let source = AudioSource::from_path("book.mp3").unwrap();

        let set = resolver.resolve_chapters(&source).await.unwrap();
        assert_eq!(set.origin(), ChapterOrigin::WholeFile);
        assert_eq!(
            set.chapters(),
            &[Chapter {
                start_ms: 0,
                end_ms: 12_345,
                title: "Solo".to_string(),
            }]
        );
        assert_eq!(runner.call_count(), 2);
    }

    #[test]
    fn test_whole_file_rejects_zero_duration() {
        let err = ChapterSet::whole_file("Blip", 0).unwrap_err();
        assert!(matches!(err, SplitterError::Probe(_)));

        let set = ChapterSet::whole_file("Blip", 1).unwrap();
        assert!(!set.is_empty());
        assert!(set.chapters()[0].end_ms > set.chapters()[0].start_ms);
    }

    #[tokio::test]
    async fn test_sub_millisecond_file_is_rejected() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .respond(r#"{"chapters": []}"#)
                .respond(
                    r#"{"format": {"duration": "0.0004", "tags": {"title": "Blip", "album": "Blip", "artist": "X"}}}"#,
                ),
        );
        let resolver = ChapterResolver::new(MetadataProbe::new(runner.clone(), "ffprobe"));
        let source = AudioSource::from_path("blip.mp3").unwrap();

        let err = resolver.resolve_chapters(&source).await.unwrap_err();
        assert!(matches!(err, SplitterError::Probe(_)));
    }

    #[tokio::test]
    async fn test_resolve_with_known_metadata_queries_chapters_only() {
        let runner = Arc::new(ScriptedRunner::new().respond(r#"{"chapters": []}"#));
        let resolver = ChapterResolver::new(MetadataProbe::new(runner.clone(), "ffprobe"));
        let source = AudioSource::from_path("book.mp3").unwrap();
        let metadata = AudioMetadata {
            title: "Solo".to_string(),
            album: "Solo".to_string(),
            artist: "X".to_string(),
            duration_ms: 12_345,
        };

        let set = resolver.resolve_chapters_with(&source, &metadata).await.unwrap();
        assert_eq!(set.origin(), ChapterOrigin::WholeFile);
        assert_eq!(set.chapters()[0].end_ms, 12_345);
        assert_eq!(set.chapters()[0].title, "Solo");
        // Only the chapter query
        assert_eq!(runner.call_count(), 1);
    }
}
