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


//! Cover art extraction and embedding
//!
//! Extraction copies the first video stream (the embedded picture) out of the
//! source. Many files have no picture at all, so a failed extraction yields
//! [`CoverArt::Absent`] rather than an error.
//!
//! Embedding re-muxes a chapter file with the picture as an `attached_pic`
//! stream. Output goes to a sibling working file that is then renamed over
//! the chapter, so an interrupted attach never leaves a truncated chapter.

use crate::audio::format::AudioSource;
use crate::error::{Result, SplitterError};
use crate::exec::CommandRunner;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

/// Outcome of cover art extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverArt {
    /// Picture written to this standalone file
    Asset(PathBuf),
    /// Source has no extractable picture; segmentation proceeds without one
    Absent,
}

impl CoverArt {
    pub fn path(&self) -> Option<&Path> {
        match self {
            CoverArt::Asset(path) => Some(path),
            CoverArt::Absent => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, CoverArt::Asset(_))
    }

    /// Delete the standalone picture file, if any
    pub async fn remove(self) {
        if let CoverArt::Asset(path) = self {
            match fs::remove_file(&path).await {
                Ok(()) => debug!(path = %path.display(), "removed cover art"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "could not remove cover art"),
            }
        }
    }
}

/// Extracts and embeds cover art through FFmpeg
#[derive(Clone)]
pub struct CoverArtExtractor {
    runner: Arc<dyn CommandRunner>,
    ffmpeg: String,
    file_name: String,
    overwrite: bool,
}

impl CoverArtExtractor {
    /// `file_name` is the transient picture's name, placed beside the source
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        ffmpeg: impl Into<String>,
        file_name: impl Into<String>,
        overwrite: bool,
    ) -> Self {
        Self {
            runner,
            ffmpeg: ffmpeg.into(),
            file_name: file_name.into(),
            overwrite,
        }
    }

    /// Where the extracted picture for `source` is written
    pub fn asset_path(&self, source: &AudioSource) -> PathBuf {
        source.parent_dir().join(&self.file_name)
    }

    /// Copy the embedded picture into a standalone file
    ///
    /// Never fails: any FFmpeg error means the source has no usable picture.
    pub async fn extract_cover_art(&self, source: &AudioSource) -> CoverArt {
        let output = self.asset_path(source);

        let mut cmd = Vec::new();
        if self.overwrite {
            cmd.push("-y".to_string());
        }
        cmd.extend([
            "-i".to_string(),
            source.path().to_string_lossy().to_string(),
            "-map".to_string(),
            "0:v".to_string(),
            "-c".to_string(),
            "copy".to_string(),
            output.to_string_lossy().to_string(),
        ]);

        match self.runner.run(&self.ffmpeg, &cmd).await {
            Ok(_) => {
                info!(path = %output.display(), "extracted cover art");
                CoverArt::Asset(output)
            }
            Err(e) => {
                info!(
                    file = %source.path().display(),
                    reason = %e,
                    "no cover art extracted, continuing without"
                );
                CoverArt::Absent
            }
        }
    }

    /// Embed `cover_art` into `chapter_file` as an attached picture, in place
    ///
    /// # Errors
    /// - ToolFailed if FFmpeg cannot mux the picture
    /// - FileIoError if the working file cannot be renamed over the chapter
    pub async fn attach_cover_art(&self, chapter_file: &Path, cover_art: &Path) -> Result<()> {
        let working = working_path(chapter_file)?;

        let mut cmd = Vec::new();
        if self.overwrite {
            cmd.push("-y".to_string());
        }
        cmd.extend([
            "-i".to_string(),
            chapter_file.to_string_lossy().to_string(),
            "-i".to_string(),
            cover_art.to_string_lossy().to_string(),
            "-map".to_string(),
            "0:a".to_string(),
            "-map".to_string(),
            "1".to_string(),
            "-c:a".to_string(),
            "copy".to_string(),
            "-c:v".to_string(),
            "mjpeg".to_string(),
            "-disposition:v:0".to_string(),
            "attached_pic".to_string(),
            working.to_string_lossy().to_string(),
        ]);

        if let Err(e) = self.runner.run(&self.ffmpeg, &cmd).await {
            discard_working_file(&working).await;
            return Err(e);
        }

        fs::rename(&working, chapter_file)
            .await
            .map_err(|e| SplitterError::file_io("rename", chapter_file, e))?;

        debug!(file = %chapter_file.display(), "attached cover art");
        Ok(())
    }
}

/// Remove a partial mux output; a missing file is fine
async fn discard_working_file(working: &Path) {
    match fs::remove_file(working).await {
        Ok(()) => debug!(path = %working.display(), "removed partial cover art output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %working.display(), error = %e, "could not remove partial cover art output"),
    }
}

/// `<dir>/<stem>.add_cover_art.<ext>`; keeps the real extension last so
/// FFmpeg picks the same muxer as the chapter
fn working_path(chapter_file: &Path) -> Result<PathBuf> {
    let stem = chapter_file
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| SplitterError::InvalidPath(chapter_file.display().to_string()))?;

    let name = match chapter_file.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.add_cover_art.{}", stem, ext),
        None => format!("{}.add_cover_art", stem),
    };

    Ok(chapter_file.with_file_name(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ScriptedRunner;

    fn extractor(runner: Arc<ScriptedRunner>) -> CoverArtExtractor {
        CoverArtExtractor::new(runner, "ffmpeg", ".cover.png", true)
    }

    #[test]
    fn test_working_path_keeps_extension_last() {
        assert_eq!(
            working_path(Path::new("/out/Dune - Chapter 01.m4a")).unwrap(),
            PathBuf::from("/out/Dune - Chapter 01.add_cover_art.m4a")
        );
    }

    #[tokio::test]
    async fn test_extract_success_is_asset() {
        let runner = Arc::new(ScriptedRunner::new().respond(""));
        let source = AudioSource::from_path("/books/Dune.m4b").unwrap();

        let cover = extractor(runner.clone()).extract_cover_art(&source).await;
        assert_eq!(cover, CoverArt::Asset(PathBuf::from("/books/.cover.png")));

        let call = &runner.calls()[0];
        assert_eq!(call.arg_after("-map"), Some("0:v"));
        assert_eq!(call.arg_after("-c"), Some("copy"));
    }

    #[tokio::test]
    async fn test_extract_failure_is_absent() {
        let runner = Arc::new(
            ScriptedRunner::new().fail("Stream map '0:v' matches no streams."),
        );
        let source = AudioSource::from_path("/books/Dune.mp3").unwrap();

        let cover = extractor(runner).extract_cover_art(&source).await;
        assert_eq!(cover, CoverArt::Absent);
        assert!(!cover.is_present());
    }

    #[tokio::test]
    async fn test_attach_replaces_chapter_file() {
        let dir = tempfile::tempdir().unwrap();
        let chapter = dir.path().join("Dune - Chapter 1.m4a");
        std::fs::write(&chapter, b"audio").unwrap();
        let cover = dir.path().join(".cover.png");

        let runner = Arc::new(ScriptedRunner::new().respond("").touch_outputs_for("ffmpeg"));
        extractor(runner.clone())
            .attach_cover_art(&chapter, &cover)
            .await
            .unwrap();

        let call = &runner.calls()[0];
        assert_eq!(call.arg_after("-disposition:v:0"), Some("attached_pic"));
        assert_eq!(call.args_after("-map"), vec!["0:a", "1"]);
        assert!(call.last_arg().unwrap().ends_with("Dune - Chapter 1.add_cover_art.m4a"));

        // Working file was renamed over the chapter
        assert!(chapter.exists());
        assert!(!dir.path().join("Dune - Chapter 1.add_cover_art.m4a").exists());
        assert_eq!(std::fs::read(&chapter).unwrap(), b"");
    }

    #[tokio::test]
    async fn test_attach_failure_leaves_chapter_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let chapter = dir.path().join("c.m4a");
        std::fs::write(&chapter, b"audio").unwrap();

        let runner = Arc::new(ScriptedRunner::new().fail("mux error"));
        let err = extractor(runner)
            .attach_cover_art(&chapter, &dir.path().join(".cover.png"))
            .await
            .unwrap_err();

        assert!(err.is_tool_error());
        assert_eq!(std::fs::read(&chapter).unwrap(), b"audio");
    }

    #[tokio::test]
    async fn test_attach_failure_removes_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let chapter = dir.path().join("c.m4a");
        std::fs::write(&chapter, b"audio").unwrap();
        // What ffmpeg leaves behind when it dies mid-mux
        let partial = dir.path().join("c.add_cover_art.m4a");
        std::fs::write(&partial, b"half").unwrap();

        let runner = Arc::new(ScriptedRunner::new().fail("Conversion failed!"));
        let err = extractor(runner)
            .attach_cover_art(&chapter, &dir.path().join(".cover.png"))
            .await
            .unwrap_err();

        assert!(err.is_tool_error());
        assert!(!partial.exists());
        assert_eq!(std::fs::read(&chapter).unwrap(), b"audio");
    }

    #[tokio::test]
    async fn test_remove_deletes_asset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".cover.png");
        std::fs::write(&path, b"png").unwrap();

        CoverArt::Asset(path.clone()).remove().await;
        assert!(!path.exists());

        // Already gone is fine
        CoverArt::Asset(path).remove().await;
        CoverArt::Absent.remove().await;
    }
}
