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


//! Audio stream repackaging
//!
//! Two FFmpeg passes:
//! 1. Transcode the source to a mono ADTS stream, `<base>.aac`
//! 2. Package that stream as `<base>.m4a`, tagged `title=<base>` and `album=<base>`
//!
//! The intermediate `.aac` is deleted once the `.m4a` exists.

use crate::audio::format::{AudioFormat, AudioSource};
use crate::error::{Result, SplitterError};
use crate::exec::CommandRunner;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::info;

/// Options for a single FFmpeg transcode pass
#[derive(Debug, Clone, Default)]
pub struct TranscodeOptions {
    /// Downsample to mono (reduce file size)
    pub downsample_mono: bool,
    /// `key=value` metadata tags, in order
    pub metadata: Vec<(String, String)>,
    /// Overwrite existing output file
    pub overwrite_existing: bool,
}

/// Build FFmpeg arguments for a transcode pass
pub fn build_transcode_command(input: &Path, output: &Path, options: &TranscodeOptions) -> Vec<String> {
    let mut cmd = Vec::new();

    if options.overwrite_existing {
        cmd.push("-y".to_string());
    }

    cmd.push("-i".to_string());
    cmd.push(input.to_string_lossy().to_string());

    // Mono downsampling
    if options.downsample_mono {
        cmd.push("-ac".to_string());
        cmd.push("1".to_string());
    }

    for (key, value) in &options.metadata {
        cmd.push("-metadata".to_string());
        cmd.push(format!("{}={}", key, value));
    }

    cmd.push(output.to_string_lossy().to_string());
    cmd
}

/// Re-encodes a source into a tagged mono `.m4a`
#[derive(Clone)]
pub struct StreamExtractor {
    runner: Arc<dyn CommandRunner>,
    ffmpeg: String,
    overwrite: bool,
}

impl StreamExtractor {
    pub fn new(runner: Arc<dyn CommandRunner>, ffmpeg: impl Into<String>, overwrite: bool) -> Self {
        Self {
            runner,
            ffmpeg: ffmpeg.into(),
            overwrite,
        }
    }

    /// Extract the audio stream of `source` into `<dir>/<base>.m4a`
    ///
    /// # Errors
    /// - InvalidPath if the source already is the `.m4a` that would be written
    /// - ToolFailed if either FFmpeg pass fails (the intermediate may remain)
    pub async fn extract_audio_stream(&self, source: &AudioSource) -> Result<PathBuf> {
        if *source.format() == AudioFormat::M4a || *source.format() == AudioFormat::Aac {
            return Err(SplitterError::InvalidPath(format!(
                "{}: source would be overwritten by its own repackaged output",
                source.path().display()
            )));
        }

        let base = source.stem().to_string();
        let intermediate = source.sibling_with_extension(AudioFormat::Aac.to_extension());
        let output = source.sibling_with_extension(AudioFormat::M4a.to_extension());

        let mono = TranscodeOptions {
            downsample_mono: true,
            metadata: Vec::new(),
            overwrite_existing: self.overwrite,
        };
        self.runner
            .run(
                &self.ffmpeg,
                &build_transcode_command(source.path(), &intermediate, &mono),
            )
            .await?;

        let package = TranscodeOptions {
            downsample_mono: false,
            metadata: vec![
                ("title".to_string(), base.clone()),
                ("album".to_string(), base),
            ],
            overwrite_existing: self.overwrite,
        };
        self.runner
            .run(&self.ffmpeg, &build_transcode_command(&intermediate, &output, &package))
            .await?;

        fs::remove_file(&intermediate)
            .await
            .map_err(|e| SplitterError::file_io("remove", &intermediate, e))?;

        info!(file = %output.display(), "repackaged audio stream");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::{ScriptedResponse, ScriptedRunner};

    #[test]
    fn test_build_transcode_command() {
        let options = TranscodeOptions {
            downsample_mono: true,
            metadata: vec![("title".to_string(), "X".to_string())],
            overwrite_existing: false,
        };
        let cmd = build_transcode_command(Path::new("in.mp3"), Path::new("out.aac"), &options);
        assert_eq!(cmd, vec!["-i", "in.mp3", "-ac", "1", "-metadata", "title=X", "out.aac"]);
    }

    #[tokio::test]
    async fn test_extract_audio_stream_two_passes() {
        let dir = tempfile::tempdir().unwrap();
        let source = AudioSource::from_path(dir.path().join("Talk.mp3")).unwrap();
        let runner = Arc::new(
            ScriptedRunner::new()
                .otherwise(ScriptedResponse::Stdout(String::new()))
                .touch_outputs_for("ffmpeg"),
        );

        let output = StreamExtractor::new(runner.clone(), "ffmpeg", true)
            .extract_audio_stream(&source)
            .await
            .unwrap();

        assert_eq!(output, dir.path().join("Talk.m4a"));
        assert!(output.exists());
        assert!(!dir.path().join("Talk.aac").exists());

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].arg_after("-ac"), Some("1"));
        assert!(calls[0].last_arg().unwrap().ends_with("Talk.aac"));
        assert_eq!(calls[1].args_after("-metadata"), vec!["title=Talk", "album=Talk"]);
    }

    #[tokio::test]
    async fn test_m4a_source_rejected() {
        let runner = Arc::new(ScriptedRunner::new());
        let source = AudioSource::from_path("/a/Talk.m4a").unwrap();
        let err = StreamExtractor::new(runner.clone(), "ffmpeg", true)
            .extract_audio_stream(&source)
            .await
            .unwrap_err();
        assert!(matches!(err, SplitterError::InvalidPath(_)));
        assert_eq!(runner.call_count(), 0);
    }
}
