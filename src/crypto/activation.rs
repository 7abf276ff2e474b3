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


//! Activation bytes
//!
//! # What are Activation Bytes?
//! - 4-byte key tied to an Audible account
//! - Passed to FFmpeg as `-activation_bytes` to decrypt AAX files
//! - Format: 8 hex characters (e.g., "1CEB00DA")
//! - Never log or expose in plaintext; `Debug` and `masked()` hide the middle

use crate::error::{Result, SplitterError};
use std::fmt;
use std::str::FromStr;

/// Newtype wrapper around activation bytes
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ActivationBytes([u8; 4]);

impl ActivationBytes {
    /// Create ActivationBytes from a 4-byte array
    pub fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Parse activation bytes from hex string
    ///
    /// # Format Rules
    /// - Exactly 8 hex digits after trimming whitespace
    /// - Case-insensitive
    ///
    /// # Errors
    /// - InvalidActivationBytes if the string is not 8 hex characters
    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.trim();

        if hex.len() != 8 {
            return Err(SplitterError::InvalidActivationBytes(format!(
                "Expected 8 hex characters, got {}. Example format: 1CEB00DA",
                hex.len()
            )));
        }

        let mut bytes = [0u8; 4];
        hex::decode_to_slice(hex, &mut bytes).map_err(|e| {
            SplitterError::InvalidActivationBytes(format!(
                "Invalid hex characters ({}). Must contain only 0-9, A-F (case-insensitive)",
                e
            ))
        })?;

        Ok(Self(bytes))
    }

    /// Uppercase hex string, as FFmpeg expects it
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    /// First and last byte only, e.g. `1C****DA`
    pub fn masked(&self) -> String {
        format!("{:02X}****{:02X}", self.0[0], self.0[3])
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl FromStr for ActivationBytes {
    type Err = SplitterError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for ActivationBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ActivationBytes").field(&self.masked()).finish()
    }
}
