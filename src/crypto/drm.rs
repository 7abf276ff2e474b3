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


//! AAX DRM removal
//!
//! # Decryption Process
//! FFmpeg decrypts AAX itself when given the account's activation bytes:
//! ```text
//! ffmpeg -activation_bytes <BYTES> -i input.aax -c copy input.m4b
//! ```
//! `-c copy` remuxes every stream (audio and cover art) without re-encoding.
//! The output sits beside the input with the same stem; the input is left
//! untouched.

use crate::audio::format::{AudioFormat, AudioSource};
use crate::crypto::activation::ActivationBytes;
use crate::error::{Result, SplitterError};
use crate::exec::CommandRunner;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Removes Audible container encryption with FFmpeg
#[derive(Clone)]
pub struct DrmStripper {
    runner: Arc<dyn CommandRunner>,
    ffmpeg: String,
    overwrite: bool,
}

impl DrmStripper {
    pub fn new(runner: Arc<dyn CommandRunner>, ffmpeg: impl Into<String>, overwrite: bool) -> Self {
        Self {
            runner,
            ffmpeg: ffmpeg.into(),
            overwrite,
        }
    }

    /// Where the decrypted copy of `source` is written
    pub fn output_path(source: &AudioSource) -> PathBuf {
        source.sibling_with_extension(AudioFormat::M4b.to_extension())
    }

    /// Decrypt an AAX file into an `.m4b` beside it
    ///
    /// # Errors
    /// - Drm if the source is not an AAX file, or FFmpeg rejects the key or
    ///   the container
    /// - ToolNotFound if FFmpeg is not installed
    pub async fn strip_drm(&self, source: &AudioSource, key: &ActivationBytes) -> Result<PathBuf> {
        if !source.is_encrypted() {
            return Err(SplitterError::Drm(format!(
                "{} is not an AAX file",
                source.path().display()
            )));
        }

        let output = Self::output_path(source);
        let cmd = build_decrypt_command(source.path(), &output, key, self.overwrite);

        info!(
            file = %source.path().display(),
            activation_bytes = %key.masked(),
            "removing DRM"
        );

        self.runner
            .run(&self.ffmpeg, &cmd)
            .await
            .map_err(|e| match e {
                SplitterError::ToolFailed { stderr, .. } => SplitterError::Drm(describe_failure(&stderr)),
                other => other,
            })?;

        info!(file = %output.display(), "wrote decrypted book");
        Ok(output)
    }
}

/// Build FFmpeg arguments for AAX decryption
fn build_decrypt_command(
    input: &Path,
    output: &Path,
    key: &ActivationBytes,
    overwrite: bool,
) -> Vec<String> {
    let mut cmd = Vec::new();
    if overwrite {
        cmd.push("-y".to_string());
    }
    cmd.extend([
        "-activation_bytes".to_string(),
        key.to_hex(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-c".to_string(),
        "copy".to_string(),
        output.to_string_lossy().to_string(),
    ]);
    cmd
}

/// Turn FFmpeg's stderr into a short reason
fn describe_failure(stderr: &str) -> String {
    if stderr.contains("Invalid data found when processing input")
        || stderr.contains("mismatch in checksums")
        || stderr.contains("activation_bytes")
    {
        "FFmpeg failed to decrypt the file. The activation bytes may be incorrect.".to_string()
    } else {
        format!("FFmpeg failed to remux the file: {}", stderr.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ScriptedRunner;

    fn key() -> ActivationBytes {
        ActivationBytes::from_hex("1CEB00DA").unwrap()
    }

    #[tokio::test]
    async fn test_strip_drm_writes_m4b_beside_source() {
        let runner = Arc::new(ScriptedRunner::new().respond(""));
        let source = AudioSource::from_path("/books/Dune.aax").unwrap();

        let output = DrmStripper::new(runner.clone(), "ffmpeg", false)
            .strip_drm(&source, &key())
            .await
            .unwrap();

        assert_eq!(output, PathBuf::from("/books/Dune.m4b"));
        let call = &runner.calls()[0];
        assert_eq!(call.program, "ffmpeg");
        assert_eq!(
            call.args,
            vec!["-activation_bytes", "1CEB00DA", "-i", "/books/Dune.aax", "-c", "copy", "/books/Dune.m4b"]
        );
    }

    #[tokio::test]
    async fn test_rejected_key_is_drm_error() {
        let runner = Arc::new(
            ScriptedRunner::new().fail("[mov,mp4] mismatch in checksums\nInvalid data found when processing input"),
        );
        let source = AudioSource::from_path("/books/Dune.aax").unwrap();

        let err = DrmStripper::new(runner, "ffmpeg", true)
            .strip_drm(&source, &key())
            .await
            .unwrap_err();

        assert!(err.is_crypto_error());
        assert!(err.to_string().contains("activation bytes may be incorrect"));
    }

    #[tokio::test]
    async fn test_unencrypted_source_is_drm_error() {
        let runner = Arc::new(ScriptedRunner::new());
        let source = AudioSource::from_path("/books/Dune.m4b").unwrap();

        let err = DrmStripper::new(runner.clone(), "ffmpeg", true)
            .strip_drm(&source, &key())
            .await
            .unwrap_err();

        assert!(matches!(err, SplitterError::Drm(_)));
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn test_describe_other_failure_keeps_stderr() {
        assert_eq!(
            describe_failure("disk full\n"),
            "FFmpeg failed to remux the file: disk full"
        );
    }
}
