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


//! Output naming
//!
//! # Naming Rules
//! - Book titles are sanitized to `[A-Za-z0-9 ()'-]` before touching the disk
//! - Chapter files: `{book} - Chapter {n}.{ext}`
//! - `n` is 1-based, zero padded to the digit count of the chapter total
//!   (9 chapters → `1`, 12 → `01`, 150 → `001`)

use crate::error::{Result, SplitterError};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Right single quote as it appears after a UTF-8/Windows-1252 mixup
const MOJIBAKE_APOSTROPHE: &str = "\u{e2}\u{20ac}\u{2122}";

lazy_static::lazy_static! {
    static ref DISALLOWED_CHARS: Regex =
        Regex::new(r"[^a-zA-Z0-9 ()'\-]").expect("static pattern");
    static ref WHITESPACE_RUNS: Regex = Regex::new(r"\s{2,}").expect("static pattern");
}

/// Reduce a title to characters safe in any filesystem
///
/// Mis-decoded apostrophes are repaired first; every other disallowed
/// character becomes a space, and whitespace runs collapse to one space.
pub fn sanitize_filename(input: &str) -> String {
    let repaired = input.replace(MOJIBAKE_APOSTROPHE, "'");
    let replaced = DISALLOWED_CHARS.replace_all(&repaired, " ");
    WHITESPACE_RUNS
        .replace_all(&replaced, " ")
        .trim()
        .to_string()
}

/// Left-pad `num` with zeros to `width` characters
pub fn zero_pad(num: usize, width: usize) -> String {
    format!("{:0width$}", num, width = width)
}

/// Number of decimal digits in `n` (at least 1)
pub fn digit_count(n: usize) -> usize {
    n.to_string().len()
}

/// File name for chapter `index` (1-based) of `total`
pub fn chapter_file_name(book_title: &str, index: usize, total: usize, ext: &str) -> String {
    format!(
        "{} - Chapter {}.{}",
        book_title,
        zero_pad(index, digit_count(total)),
        ext
    )
}

/// Directory for a book's chapters: `<output_root>/<sanitized title>`
///
/// # Errors
/// - InvalidPath if the title sanitizes to nothing
pub fn book_directory(output_root: &Path, title: &str) -> Result<PathBuf> {
    let name = sanitize_filename(title);
    if name.is_empty() {
        return Err(SplitterError::InvalidPath(format!(
            "title '{}' has no usable characters for a directory name",
            title
        )));
    }
    Ok(output_root.join(name))
}
