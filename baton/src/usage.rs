//! Token usage tracking for model invocations.
//!
//! Every [`crate::items::ModelResponse`] carries the usage of a single model
//! request; the run's [`crate::callback::RunContext`] accumulates those into
//! a running total, exactly once per turn, from both the buffered and
//! streaming execution paths.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Token usage statistics for one or more model requests.
///
/// A freshly constructed [`Usage::new`] describes a single response
/// (`requests == 1`); summed values describe an entire run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Number of model requests covered by this record.
    #[serde(default)]
    pub requests: u32,

    /// Number of tokens in the input/prompt.
    #[serde(default, alias = "prompt_tokens")]
    pub input_tokens: u32,

    /// Number of tokens in the output/completion.
    #[serde(default, alias = "completion_tokens")]
    pub output_tokens: u32,

    /// Total tokens used (input + output).
    #[serde(default)]
    pub total_tokens: u32,
}

impl Usage {
    /// Create the usage record of a single model response.
    #[must_use]
    pub const fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            requests: 1,
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }

    /// Create an empty usage record.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            requests: 0,
            input_tokens: 0,
            output_tokens: 0,
            total_tokens: 0,
        }
    }

    /// Returns `true` if no requests and no tokens have been recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.requests == 0 && self.total_tokens == 0
    }

    /// Accumulate another usage record into this one.
    pub const fn add(&mut self, other: &Self) {
        self.requests += other.requests;
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.total_tokens += other.total_tokens;
    }
}

impl Add for Usage {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        let mut out = self;
        Usage::add(&mut out, &rhs);
        out
    }
}

impl AddAssign for Usage {
    fn add_assign(&mut self, rhs: Self) {
        self.add(&rhs);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod construction {
        use super::*;

        #[test]
        fn new_counts_one_request() {
            let usage = Usage::new(100, 50);
            assert_eq!(usage.requests, 1);
            assert_eq!(usage.input_tokens, 100);
            assert_eq!(usage.output_tokens, 50);
            assert_eq!(usage.total_tokens, 150);
        }

        #[test]
        fn zero_is_empty() {
            let usage = Usage::zero();
            assert!(usage.is_empty());
            assert_eq!(usage.requests, 0);
        }

        #[test]
        fn default_is_zero() {
            assert_eq!(Usage::default(), Usage::zero());
        }
    }

    mod arithmetic {
        use super::*;

        #[test]
        fn add_accumulates_all_fields() {
            let mut total = Usage::zero();
            total += Usage::new(100, 50);
            total += Usage::new(200, 100);

            assert_eq!(total.requests, 2);
            assert_eq!(total.input_tokens, 300);
            assert_eq!(total.output_tokens, 150);
            assert_eq!(total.total_tokens, 450);
        }

        #[test]
        fn add_operator_produces_sum() {
            let sum = Usage::new(10, 5) + Usage::new(20, 15);
            assert_eq!(sum.requests, 2);
            assert_eq!(sum.total_tokens, 50);
        }

        #[test]
        fn non_empty_after_add() {
            let mut usage = Usage::zero();
            Usage::add(&mut usage, &Usage::new(1, 0));
            assert!(!usage.is_empty());
        }
    }

    mod serde_roundtrip {
        use super::*;

        #[test]
        fn accepts_provider_aliases() {
            let usage: Usage =
                serde_json::from_str(r#"{"prompt_tokens": 7, "completion_tokens": 3}"#).unwrap();
            assert_eq!(usage.input_tokens, 7);
            assert_eq!(usage.output_tokens, 3);
        }
    }
}
