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


//! Audio probing, chapter resolution, and splitting
//!
//! # Module Organization
//!
//! ## format
//! - `AudioFormat` - Container formats (AAX, M4B, M4A, MP3, AAC)
//! - `AudioSource` - An input file and its detected format
//!
//! ## probe
//! - `MetadataProbe` - Title/album/artist/duration and raw chapter markers via FFprobe
//!
//! ## chapters
//! - `ChapterResolver` - Millisecond markers, or one whole-file chapter
//! - `ChapterSet` - Ordered, never-empty chapter list
//! - `format_timestamp` - `H:M:S` arguments for FFmpeg
//!
//! ## cover_art
//! - `CoverArtExtractor` - Best-effort picture extraction and `attached_pic` embedding
//!
//! ## segmenter
//! - `Segmenter` - One stream-copied, tagged file per chapter
//!
//! ## stream
//! - `StreamExtractor` - Mono re-encode and `.m4a` repackaging
//!
//! # FFmpeg Integration
//!
//! FFmpeg and FFprobe must be installed and available in PATH (or configured
//! explicitly). All invocations go through `exec::CommandRunner`.

pub mod chapters;
pub mod cover_art;
pub mod format;
pub mod probe;
pub mod segmenter;
pub mod stream;

// Re-export commonly used types for convenience
pub use chapters::{format_timestamp, Chapter, ChapterOrigin, ChapterResolver, ChapterSet};
pub use cover_art::{CoverArt, CoverArtExtractor};
pub use format::{AudioFormat, AudioSource};
pub use probe::{AudioMetadata, ChapterMarker, MetadataProbe};
pub use segmenter::{plan_cuts, ChapterCut, Segmenter};
pub use stream::{StreamExtractor, TranscodeOptions};
