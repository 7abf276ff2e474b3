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


//! Book title reconciliation through a language model CLI
//!
//! # Protocol
//! - `disambiguate_title`: one prompt carrying the filename and every candidate,
//!   retried up to the configured bound. An answer is accepted only if it is a
//!   single non-empty line. If no attempt passes, the error carries every raw
//!   answer.
//! - `shorten_title`: one call, no retry, no length check on the answer.
//!
//! Both consult the [`TitleCache`] first when one is attached, and record the
//! answer after a successful call.
//!
//! The CLI is invoked as `llm --model <model> <prompt>`; stdout is trimmed.

use crate::config::SplitterConfig;
use crate::error::{Result, SplitterError};
use crate::exec::CommandRunner;
use crate::title::cache::TitleCache;
use crate::title::prompts::{disambiguation_prompt, shorten_prompt};
use crate::title::retry::{retry_until_valid, RetryOutcome};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Asks a language model for canonical and shortened book titles
pub struct TitleReconciler {
    runner: Arc<dyn CommandRunner>,
    llm: String,
    model: String,
    max_attempts: usize,
    short_title_budget: usize,
    cache: Option<TitleCache>,
}

impl TitleReconciler {
    pub fn new(runner: Arc<dyn CommandRunner>, config: &SplitterConfig) -> Self {
        Self {
            runner,
            llm: config.llm.clone(),
            model: config.llm_model.clone(),
            max_attempts: config.disambiguation_attempts,
            short_title_budget: config.short_title_budget,
            cache: None,
        }
    }

    /// Memoize answers in `cache`
    pub fn with_cache(mut self, cache: TitleCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn short_title_budget(&self) -> usize {
        self.short_title_budget
    }

    /// Pick the canonical title for `filename` from `candidates`
    ///
    /// # Errors
    /// - Disambiguation if every attempt returned an empty or multi-line answer
    /// - ToolFailed / ToolNotFound if the LLM CLI itself fails
    pub async fn disambiguate_title(&mut self, filename: &str, candidates: &[String]) -> Result<String> {
        let key = disambiguation_key(filename, candidates);
        if let Some(hit) = self.cached(&key).await {
            return Ok(hit);
        }

        let prompt = disambiguation_prompt(filename, candidates);
        let outcome = retry_until_valid(
            self.max_attempts,
            |n| {
                debug!(attempt = n, filename, "asking for canonical title");
                self.ask(&prompt)
            },
            |answer: &String| is_single_line_title(answer),
        )
        .await?;

        match outcome {
            RetryOutcome::Valid(title) => {
                info!(filename, title = %title, "disambiguated title");
                self.remember(key, &title).await?;
                Ok(title)
            }
            RetryOutcome::Exhausted(attempts) => {
                error!(filename, ?attempts, "language model never returned a single title");
                Err(SplitterError::Disambiguation { attempts })
            }
        }
    }

    /// Compact `title` to roughly the configured character budget
    ///
    /// The answer is trusted as-is; an overlength answer is only logged.
    pub async fn shorten_title(&mut self, title: &str) -> Result<String> {
        let key = shorten_key(title, self.short_title_budget);
        if let Some(hit) = self.cached(&key).await {
            return Ok(hit);
        }

        let short = self.ask(&shorten_prompt(title, self.short_title_budget)).await?;

        let length = short.chars().count();
        if length > self.short_title_budget {
            warn!(
                title = %short,
                length,
                budget = self.short_title_budget,
                "shortened title is over budget"
            );
        }
        info!(from = %title, to = %short, "shortened title");

        self.remember(key, &short).await?;
        Ok(short)
    }

    async fn ask(&self, prompt: &str) -> Result<String> {
        let args = vec!["--model".to_string(), self.model.clone(), prompt.to_string()];
        let stdout = self.runner.run(&self.llm, &args).await?;
        Ok(stdout.trim().to_string())
    }

    async fn cached(&mut self, key: &str) -> Option<String> {
        let cache = self.cache.as_mut()?;
        let hit = cache.get(key).await;
        if hit.is_some() {
            debug!(key, "title cache hit");
        }
        hit
    }

    async fn remember(&mut self, key: String, value: &str) -> Result<()> {
        if let Some(cache) = self.cache.as_mut() {
            cache.insert(key, value).await?;
        }
        Ok(())
    }
}

/// Accepts exactly one non-empty line
pub fn is_single_line_title(answer: &str) -> bool {
    !answer.is_empty() && !answer.contains('\n') && !answer.contains('\r')
}

/// Cache key for a disambiguation; candidate order does not matter
///
/// Filename and candidates are JSON-encoded, so a separator inside a
/// candidate can never make two different inputs share a key.
pub fn disambiguation_key(filename: &str, candidates: &[String]) -> String {
    let mut sorted: Vec<&str> = candidates.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();
    format!("disambiguate:{}", serde_json::json!([filename, sorted]))
}

/// Cache key for a shortening
pub fn shorten_key(title: &str, budget: usize) -> String {
    format!("shorten:{}:{}", budget, title)
}
