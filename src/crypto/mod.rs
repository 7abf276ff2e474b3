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


//! DRM removal
//!
//! Audible's legacy AAX format is an MP4 container with AES-encrypted audio.
//! FFmpeg can decrypt it given the account's activation bytes, so removal is
//! a lossless remux into `.m4b`.

pub mod activation;
pub mod drm;

pub use activation::ActivationBytes;
pub use drm::DrmStripper;
