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


//! Book title reconciliation
//!
//! # Module Organization
//!
//! ## reconciler
//! - `TitleReconciler` - Disambiguate and shorten titles with a language model
//!
//! ## retry
//! - `retry_until_valid` - Bounded retry returning the first valid answer or the full history
//!
//! ## cache
//! - `TitleCache` - JSON-file memo of previous answers
//!
//! ## prompts
//! - Prompt text for both operations

pub mod cache;
pub mod prompts;
pub mod reconciler;
pub mod retry;

pub use cache::TitleCache;
pub use reconciler::{is_single_line_title, TitleReconciler};
pub use retry::{retry_until_valid, RetryOutcome};
