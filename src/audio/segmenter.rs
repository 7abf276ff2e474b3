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


//! Chapter splitting
//!
//! # Split by Chapter
//! - Cover art is extracted once, beside the source
//! - Each chapter is cut with a stream copy: `-ss <start> -t <duration> -c copy`
//!   (start + duration rather than absolute end, so seeks never accumulate drift)
//! - `title` and `album` tags are stamped in the same FFmpeg call
//! - The picture, if any, is attached to every chapter
//! - The shared picture is deleted once all chapters are done, or as soon
//!   as one fails
//!
//! Chapters are produced strictly in order. A failure on chapter *k* returns
//! immediately; chapters before it stay on disk.

use crate::audio::chapters::{format_ms_timestamp, Chapter, ChapterSet};
use crate::audio::cover_art::{CoverArt, CoverArtExtractor};
use crate::audio::format::AudioSource;
use crate::error::{Result, SplitterError};
use crate::exec::CommandRunner;
use crate::file::paths::{chapter_file_name, sanitize_filename};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// One planned FFmpeg cut
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterCut {
    /// 1-based position in the chapter set
    pub index: usize,
    pub output: PathBuf,
    pub start_seconds: f64,
    pub duration_seconds: f64,
    /// `-ss` argument
    pub start_timestamp: String,
    /// `-t` argument
    pub duration_timestamp: String,
    pub title: String,
}

/// Plan every cut for a chapter set without running anything
///
/// # Errors
/// - InvalidPath if the book title has no usable filename characters
pub fn plan_cuts(
    source: &AudioSource,
    book_title: &str,
    chapters: &ChapterSet,
    output_dir: &Path,
) -> Result<Vec<ChapterCut>> {
    let file_title = sanitize_filename(book_title);
    if file_title.is_empty() {
        return Err(SplitterError::InvalidPath(format!(
            "title '{}' has no usable characters for a file name",
            book_title
        )));
    }

    let total = chapters.len();
    let ext = source.format().chapter_extension();

    Ok(chapters
        .iter()
        .enumerate()
        .map(|(idx, chapter)| plan_cut(chapter, idx + 1, total, &file_title, ext, output_dir))
        .collect())
}

fn plan_cut(
    chapter: &Chapter,
    index: usize,
    total: usize,
    file_title: &str,
    ext: &str,
    output_dir: &Path,
) -> ChapterCut {
    ChapterCut {
        index,
        output: output_dir.join(chapter_file_name(file_title, index, total, ext)),
        start_seconds: chapter.start_seconds(),
        duration_seconds: chapter.duration_seconds(),
        start_timestamp: format_ms_timestamp(chapter.start_ms),
        duration_timestamp: format_ms_timestamp(chapter.duration_ms()),
        title: chapter.title.clone(),
    }
}

/// Cuts a source into one file per chapter
#[derive(Clone)]
pub struct Segmenter {
    runner: Arc<dyn CommandRunner>,
    ffmpeg: String,
    cover_art: CoverArtExtractor,
    overwrite: bool,
}

impl Segmenter {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        ffmpeg: impl Into<String>,
        cover_art: CoverArtExtractor,
        overwrite: bool,
    ) -> Self {
        Self {
            runner,
            ffmpeg: ffmpeg.into(),
            cover_art,
            overwrite,
        }
    }

    /// Split `source` into per-chapter files under `output_dir`
    ///
    /// Returns the produced paths in chapter order.
    ///
    /// # Errors
    /// - ToolFailed if a cut or a cover art attach fails (remaining chapters
    ///   are not attempted)
    /// - FileIoError if `output_dir` cannot be created
    pub async fn segment(
        &self,
        source: &AudioSource,
        book_title: &str,
        chapters: &ChapterSet,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let cuts = plan_cuts(source, book_title, chapters, output_dir)?;

        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| SplitterError::file_io("create_dir", output_dir, e))?;

        let cover_art = self.cover_art.extract_cover_art(source).await;

        let result = self.cut_all(source, book_title, &cuts, &cover_art).await;

        cover_art.remove().await;

        result
    }

    async fn cut_all(
        &self,
        source: &AudioSource,
        book_title: &str,
        cuts: &[ChapterCut],
        cover_art: &CoverArt,
    ) -> Result<Vec<PathBuf>> {
        let mut outputs = Vec::with_capacity(cuts.len());

        for cut in cuts {
            let cmd = self.build_cut_command(source, book_title, cut);
            self.runner.run(&self.ffmpeg, &cmd).await?;

            if let Some(picture) = cover_art.path() {
                self.cover_art.attach_cover_art(&cut.output, picture).await?;
            }

            info!(
                chapter = cut.index,
                total = cuts.len(),
                title = %cut.title,
                file = %cut.output.display(),
                "wrote chapter"
            );
            outputs.push(cut.output.clone());
        }

        Ok(outputs)
    }

    /// Build FFmpeg command for one chapter
    fn build_cut_command(&self, source: &AudioSource, book_title: &str, cut: &ChapterCut) -> Vec<String> {
        let mut cmd = Vec::new();

        // Overwrite if needed
        if self.overwrite {
            cmd.push("-y".to_string());
        }

        cmd.push("-i".to_string());
        cmd.push(source.path().to_string_lossy().to_string());

        cmd.push("-ss".to_string());
        cmd.push(cut.start_timestamp.clone());
        cmd.push("-t".to_string());
        cmd.push(cut.duration_timestamp.clone());

        // Copy codec (fast, lossless splitting)
        cmd.push("-c".to_string());
        cmd.push("copy".to_string());

        cmd.push("-metadata".to_string());
        cmd.push(format!("title={}", cut.title));
        cmd.push("-metadata".to_string());
        cmd.push(format!("album={}", book_title));

        cmd.push(cut.output.to_string_lossy().to_string());
        cmd
    }
}
