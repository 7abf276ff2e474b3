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


//! End-to-end processing of one audiobook file
//!
//! # Steps
//! 1. AAX sources are decrypted to `.m4b` first (activation bytes required)
//! 2. Container metadata is probed
//! 3. The book title is taken from `--title`, or reconciled from the
//!    metadata title, album and filename stem
//! 4. Titles over the short-title budget are shortened
//! 5. Chapters are resolved and cut into `<output>/<title>/`
//!
//! Steps run strictly in sequence; the first error aborts the rest and
//! leaves whatever was already written on disk.

use crate::audio::{
    AudioMetadata, AudioSource, ChapterOrigin, ChapterResolver, CoverArtExtractor, MetadataProbe,
    Segmenter, StreamExtractor,
};
use crate::config::SplitterConfig;
use crate::crypto::{ActivationBytes, DrmStripper};
use crate::error::{Result, SplitterError};
use crate::exec::CommandRunner;
use crate::file::paths::book_directory;
use crate::title::{TitleCache, TitleReconciler};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Per-run options
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Root under which the book directory is created
    pub output_root: PathBuf,
    /// Needed for AAX sources
    pub activation_bytes: Option<ActivationBytes>,
    /// Skip reconciliation and use this title
    pub title: Option<String>,
    /// Shorten titles longer than the configured budget
    pub shorten: bool,
}

impl ProcessOptions {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            activation_bytes: None,
            title: None,
            shorten: true,
        }
    }
}

/// What one run produced
#[derive(Debug, Clone, Serialize)]
pub struct ProcessReport {
    pub source: PathBuf,
    /// Decrypted `.m4b`, when the source was AAX
    pub decrypted: Option<PathBuf>,
    pub title: String,
    pub chapter_origin: ChapterOrigin,
    pub output_dir: PathBuf,
    /// Chapter files in order
    pub files: Vec<PathBuf>,
}

/// Wires every stage together around one command runner
pub struct Pipeline {
    probe: MetadataProbe,
    resolver: ChapterResolver,
    segmenter: Segmenter,
    drm: DrmStripper,
    stream: StreamExtractor,
    reconciler: TitleReconciler,
}

impl Pipeline {
    pub fn new(runner: Arc<dyn CommandRunner>, config: &SplitterConfig) -> Self {
        let probe = MetadataProbe::new(runner.clone(), config.ffprobe.clone());
        let cover_art = CoverArtExtractor::new(
            runner.clone(),
            config.ffmpeg.clone(),
            config.cover_art_file_name.clone(),
            config.overwrite,
        );

        let mut reconciler = TitleReconciler::new(runner.clone(), config);
        if let Some(path) = &config.cache_path {
            reconciler = reconciler.with_cache(TitleCache::open(path));
        }

        Self {
            resolver: ChapterResolver::new(probe.clone()),
            segmenter: Segmenter::new(runner.clone(), config.ffmpeg.clone(), cover_art, config.overwrite),
            drm: DrmStripper::new(runner.clone(), config.ffmpeg.clone(), config.overwrite),
            stream: StreamExtractor::new(runner, config.ffmpeg.clone(), config.overwrite),
            probe,
            reconciler,
        }
    }

    pub fn probe(&self) -> &MetadataProbe {
        &self.probe
    }

    pub fn resolver(&self) -> &ChapterResolver {
        &self.resolver
    }

    pub fn drm(&self) -> &DrmStripper {
        &self.drm
    }

    pub fn stream(&self) -> &StreamExtractor {
        &self.stream
    }

    pub fn reconciler(&mut self) -> &mut TitleReconciler {
        &mut self.reconciler
    }

    /// Split one file into tagged chapter files
    ///
    /// # Errors
    /// - ActivationBytesRequired for AAX input without a key
    /// - Any error from the individual stages, unchanged
    pub async fn process(&mut self, path: &Path, options: &ProcessOptions) -> Result<ProcessReport> {
        let original = AudioSource::from_path(path)?;

        let (source, decrypted) = if original.is_encrypted() {
            let key = options.activation_bytes.as_ref().ok_or_else(|| {
                SplitterError::ActivationBytesRequired(original.path().display().to_string())
            })?;
            let decrypted = self.drm.strip_drm(&original, key).await?;
            (AudioSource::from_path(&decrypted)?, Some(decrypted))
        } else {
            (original.clone(), None)
        };

        let metadata = self.probe.probe(&source).await?;

        let mut title = match &options.title {
            Some(title) => title.clone(),
            None => self.reconcile_title(&original, &metadata).await?,
        };

        if options.shorten && title.chars().count() > self.reconciler.short_title_budget() {
            title = self.reconciler.shorten_title(&title).await?;
        }

        let chapters = self.resolver.resolve_chapters_with(&source, &metadata).await?;
        let output_dir = book_directory(&options.output_root, &title)?;

        info!(
            title = %title,
            chapters = chapters.len(),
            output = %output_dir.display(),
            "splitting book"
        );

        let files = self
            .segmenter
            .segment(&source, &title, &chapters, &output_dir)
            .await?;

        Ok(ProcessReport {
            source: original.path().to_path_buf(),
            decrypted,
            title,
            chapter_origin: chapters.origin(),
            output_dir,
            files,
        })
    }

    /// Canonical title from metadata and filename
    ///
    /// A single distinct candidate is used directly; more than one goes to
    /// the language model.
    pub async fn reconcile_title(&mut self, source: &AudioSource, metadata: &AudioMetadata) -> Result<String> {
        let candidates = candidate_titles(source, metadata);

        match candidates.as_slice() {
            [only] => Ok(only.clone()),
            _ => {
                self.reconciler
                    .disambiguate_title(&source.file_name(), &candidates)
                    .await
            }
        }
    }
}

/// Distinct, non-empty title candidates: metadata title, album, file stem
pub fn candidate_titles(source: &AudioSource, metadata: &AudioMetadata) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();

    for raw in [
        metadata.title.as_str(),
        metadata.album.as_str(),
        source.stem(),
    ] {
        let candidate = raw.trim();
        if !candidate.is_empty() && !candidates.iter().any(|c| c == candidate) {
            candidates.push(candidate.to_string());
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(title: &str, album: &str) -> AudioMetadata {
        AudioMetadata {
            title: title.to_string(),
            album: album.to_string(),
            artist: "Frank Herbert".to_string(),
            duration_ms: 1000,
        }
    }

    #[test]
    fn test_candidates_deduplicate_in_order() {
        let source = AudioSource::from_path("/books/Dune.m4b").unwrap();
        assert_eq!(
            candidate_titles(&source, &metadata("Dune", "Dune (Unabridged)")),
            vec!["Dune", "Dune (Unabridged)"]
        );
    }

    #[test]
    fn test_candidates_skip_blank() {
        let source = AudioSource::from_path("/books/dune_part1.mp3").unwrap();
        assert_eq!(
            candidate_titles(&source, &metadata("  ", "Dune")),
            vec!["Dune", "dune_part1"]
        );
    }

    #[test]
    fn test_default_options() {
        let options = ProcessOptions::new("/out");
        assert!(options.shorten);
        assert!(options.activation_bytes.is_none());
        assert_eq!(options.output_root, PathBuf::from("/out"));
    }
}
