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


//! Bounded retry for answers that must pass validation
//!
//! Transport errors (the call itself failing) propagate immediately; only
//! answers rejected by the validator are retried.

use crate::error::Result;
use std::future::Future;

/// Result of a bounded retry run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T> {
    /// First answer the validator accepted
    Valid(T),
    /// Every attempt was rejected; answers in call order
    Exhausted(Vec<T>),
}

/// Call `attempt` up to `max_attempts` times, stopping at the first answer
/// `is_valid` accepts
///
/// `attempt` receives the 1-based attempt number.
pub async fn retry_until_valid<T, F, Fut, V>(
    max_attempts: usize,
    mut attempt: F,
    is_valid: V,
) -> Result<RetryOutcome<T>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T>>,
    V: Fn(&T) -> bool,
{
    let mut history = Vec::with_capacity(max_attempts);

    for n in 1..=max_attempts {
        let answer = attempt(n).await?;
        if is_valid(&answer) {
            return Ok(RetryOutcome::Valid(answer));
        }
        history.push(answer);
    }

    Ok(RetryOutcome::Exhausted(history))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SplitterError;
    use std::cell::Cell;

    #[tokio::test]
    async fn test_stops_at_first_valid() {
        let calls = Cell::new(0);
        let outcome = retry_until_valid(
            3,
            |n| {
                calls.set(calls.get() + 1);
                async move { Ok(n) }
            },
            |n| *n == 2,
        )
        .await
        .unwrap();

        assert_eq!(outcome, RetryOutcome::Valid(2));
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn test_exhausted_keeps_history() {
        let outcome = retry_until_valid(2, |n| async move { Ok(format!("bad {}", n)) }, |_| false)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            RetryOutcome::Exhausted(vec!["bad 1".to_string(), "bad 2".to_string()])
        );
    }

    #[tokio::test]
    async fn test_call_error_propagates_without_retry() {
        let calls = Cell::new(0);
        let result: Result<RetryOutcome<String>> = retry_until_valid(
            5,
            |_| {
                calls.set(calls.get() + 1);
                async { Err(SplitterError::tool_failed("llm", "network down")) }
            },
            |_| true,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }
}
