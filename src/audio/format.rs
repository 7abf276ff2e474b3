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


//! Audio container formats and source files
//!
//! # Supported Formats
//! - AAX: Audible's encrypted M4B (needs activation bytes)
//! - M4B: Unencrypted audiobook container
//! - M4A: Unencrypted AAC audio
//! - MP3: MPEG Audio Layer 3
//! - AAC: Raw ADTS stream (intermediate output only)
//!
//! Anything else is carried through as `Other` with its extension intact.

use crate::error::{Result, SplitterError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Container format, detected from the file extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioFormat {
    /// AAX - Audible's encrypted AAC format
    Aax,
    /// M4B - Unencrypted M4B audiobook
    M4b,
    /// M4A - Unencrypted AAC audio
    M4a,
    /// MP3 - MPEG Audio Layer 3
    Mp3,
    /// Raw AAC stream
    Aac,
    /// Any other extension, lowercased
    Other(String),
}

impl AudioFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "aax" => Self::Aax,
            "m4b" => Self::M4b,
            "m4a" => Self::M4a,
            "mp3" => Self::Mp3,
            "aac" => Self::Aac,
            other => Self::Other(other.to_string()),
        }
    }

    /// Check if format carries Audible DRM
    pub fn is_encrypted(&self) -> bool {
        matches!(self, Self::Aax)
    }

    /// Check if format is a whole-book container
    pub fn is_book_container(&self) -> bool {
        matches!(self, Self::Aax | Self::M4b)
    }

    /// Get file extension for this format
    pub fn to_extension(&self) -> &str {
        match self {
            Self::Aax => "aax",
            Self::M4b => "m4b",
            Self::M4a => "m4a",
            Self::Mp3 => "mp3",
            Self::Aac => "aac",
            Self::Other(ext) => ext,
        }
    }

    /// Extension for a single chapter cut from this format
    ///
    /// A chapter is no longer a book, so book containers become plain audio.
    pub fn chapter_extension(&self) -> &str {
        if self.is_book_container() {
            "m4a"
        } else {
            self.to_extension()
        }
    }
}

/// An audio file handed to the pipeline
///
/// Never mutated; every stage reads from it and writes new files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSource {
    path: PathBuf,
    format: AudioFormat,
}

impl AudioSource {
    /// Identify a source file from its path
    ///
    /// # Errors
    /// - InvalidPath if the path has no file stem or no extension
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if path.file_stem().and_then(|s| s.to_str()).is_none() {
            return Err(SplitterError::InvalidPath(format!(
                "{}: no file name",
                path.display()
            )));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                SplitterError::InvalidPath(format!("{}: no file extension", path.display()))
            })?;

        let format = AudioFormat::from_extension(ext);
        Ok(Self { path, format })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    pub fn is_encrypted(&self) -> bool {
        self.format.is_encrypted()
    }

    /// File name without extension
    pub fn stem(&self) -> &str {
        // Checked in from_path
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }

    /// Full file name including extension
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Directory containing the source
    pub fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }

    /// Sibling path sharing this source's stem, with a new extension
    pub fn sibling_with_extension(&self, ext: &str) -> PathBuf {
        self.parent_dir().join(format!("{}.{}", self.stem(), ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(AudioFormat::from_extension("AAX"), AudioFormat::Aax);
        assert_eq!(AudioFormat::from_extension("m4b"), AudioFormat::M4b);
        assert_eq!(
            AudioFormat::from_extension("Flac"),
            AudioFormat::Other("flac".to_string())
        );
    }

    #[test]
    fn test_chapter_extension_maps_book_containers() {
        assert_eq!(AudioFormat::M4b.chapter_extension(), "m4a");
        assert_eq!(AudioFormat::Aax.chapter_extension(), "m4a");
        assert_eq!(AudioFormat::Mp3.chapter_extension(), "mp3");
        assert_eq!(AudioFormat::Other("ogg".to_string()).chapter_extension(), "ogg");
    }

    #[test]
    fn test_source_from_path() {
        let source = AudioSource::from_path("/books/Dune.aax").unwrap();
        assert!(source.is_encrypted());
        assert_eq!(source.stem(), "Dune");
        assert_eq!(source.file_name(), "Dune.aax");
        assert_eq!(source.parent_dir(), Path::new("/books"));
        assert_eq!(
            source.sibling_with_extension("m4b"),
            PathBuf::from("/books/Dune.m4b")
        );
    }

    #[test]
    fn test_relative_source_parent_is_current_dir() {
        let source = AudioSource::from_path("Dune.m4b").unwrap();
        assert_eq!(source.parent_dir(), Path::new("."));
    }

    #[test]
    fn test_source_without_extension_rejected() {
        let err = AudioSource::from_path("/books/README").unwrap_err();
        assert!(matches!(err, SplitterError::InvalidPath(_)));
    }
}
