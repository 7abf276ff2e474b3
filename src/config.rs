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


//! Runtime configuration
//!
//! All fields have defaults, so an empty TOML file (or no file at all) is a
//! valid configuration. Example:
//!
//! ```toml
//! llm_model = "gpt-4o"
//! short_title_budget = 40
//! cache_path = "/home/me/.cache/book-splitter/titles.json"
//! ```

use crate::error::{Result, SplitterError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default number of language model attempts for title disambiguation
pub const DEFAULT_DISAMBIGUATION_ATTEMPTS: usize = 2;

/// Default character budget for shortened titles
pub const DEFAULT_SHORT_TITLE_BUDGET: usize = 40;

/// Settings shared by every stage of the pipeline
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    /// FFmpeg executable
    pub ffmpeg: String,

    /// FFprobe executable
    pub ffprobe: String,

    /// Language model CLI executable
    pub llm: String,

    /// Model name passed to the language model CLI
    pub llm_model: String,

    /// Attempts allowed for title disambiguation
    pub disambiguation_attempts: usize,

    /// Titles longer than this are shortened
    pub short_title_budget: usize,

    /// Name of the transient cover art file written next to the source
    pub cover_art_file_name: String,

    /// Title cache file; `None` disables caching
    pub cache_path: Option<PathBuf>,

    /// Overwrite existing output files
    pub overwrite: bool,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            llm: "llm".to_string(),
            llm_model: "gpt4".to_string(),
            disambiguation_attempts: DEFAULT_DISAMBIGUATION_ATTEMPTS,
            short_title_budget: DEFAULT_SHORT_TITLE_BUDGET,
            cover_art_file_name: ".cover.png".to_string(),
            cache_path: default_cache_path(),
            overwrite: true,
        }
    }
}

impl SplitterConfig {
    /// Load configuration from a TOML file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SplitterError::file_io("read", path, e))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text and validate it
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.disambiguation_attempts == 0 {
            return Err(SplitterError::Configuration(
                "disambiguation_attempts must be at least 1".to_string(),
            ));
        }
        if self.short_title_budget == 0 {
            return Err(SplitterError::Configuration(
                "short_title_budget must be at least 1".to_string(),
            ));
        }
        if self.cover_art_file_name.is_empty() || self.cover_art_file_name.contains('/') {
            return Err(SplitterError::Configuration(format!(
                "cover_art_file_name must be a plain file name, got '{}'",
                self.cover_art_file_name
            )));
        }
        Ok(())
    }
}

/// `<platform cache dir>/book-splitter/titles.json`
pub fn default_cache_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("book-splitter").join("titles.json"))
}
