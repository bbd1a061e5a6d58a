//! Guardrails — independent validation checks on run input and final output.
//!
//! - **[`InputGuardrail`]** — validates the run's original input, once,
//!   before the first turn's model call, for the agent the run started with.
//! - **[`OutputGuardrail`]** — validates the final output, once, after the
//!   last turn, for the agent that produced it.
//!
//! # Tripwire Mechanism
//!
//! Each check returns a [`GuardrailOutput`] with a `tripwire_triggered`
//! flag. All checks of a batch run concurrently; if any of them trips, the
//! run halts with [`Error::InputGuardrailTriggered`](crate::Error) or
//! [`Error::OutputGuardrailTriggered`](crate::Error) carrying the tripped
//! result with the lowest original index. A check that *fails* (returns an
//! error) is logged and excluded from the result set — a broken guardrail
//! does not abort the run.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::agent::{Agent, RunInput};
use crate::callback::RunContext;
use crate::error::Result;

/// The output of a guardrail check function.
#[derive(Debug, Clone)]
pub struct GuardrailOutput {
    /// Whether the tripwire was triggered.
    ///
    /// If `true`, the run is halted immediately and an error carrying this
    /// result is returned to the caller.
    pub tripwire_triggered: bool,

    /// Optional structured information about the check.
    ///
    /// Confidence scores, detected issues, or any other metadata useful for
    /// debugging and observability.
    pub output_info: Value,
}

impl GuardrailOutput {
    /// Create a passing guardrail output (tripwire not triggered).
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            tripwire_triggered: false,
            output_info: Value::Null,
        }
    }

    /// Create a failing guardrail output (tripwire triggered).
    #[must_use]
    pub fn tripwire(info: impl Into<Value>) -> Self {
        Self {
            tripwire_triggered: true,
            output_info: info.into(),
        }
    }

    /// Create a passing output with additional diagnostic information.
    #[must_use]
    pub fn pass_with_info(info: impl Into<Value>) -> Self {
        Self {
            tripwire_triggered: false,
            output_info: info.into(),
        }
    }

    /// Returns `true` if the tripwire was triggered.
    #[must_use]
    pub const fn is_triggered(&self) -> bool {
        self.tripwire_triggered
    }
}

/// Trait for implementing input guardrail check logic.
#[async_trait]
pub trait InputGuardrailCheck: Send + Sync {
    /// Check the run's original input.
    ///
    /// # Arguments
    ///
    /// * `ctx` — the current run context (usage, turn, user context)
    /// * `agent` — the agent the run started with
    /// * `input` — the run's original input
    async fn check(
        &self,
        ctx: &RunContext,
        agent: &Agent,
        input: &RunInput,
    ) -> Result<GuardrailOutput>;
}

/// An input guardrail validating the run's input before the first turn.
///
/// Configured on an [`Agent`] or on the run configuration; executed by the
/// engine once per run, concurrently with its sibling guardrails.
#[derive(Clone)]
pub struct InputGuardrail {
    name: String,
    check: Arc<dyn InputGuardrailCheck>,
}

impl InputGuardrail {
    /// Create a new input guardrail with the given name and check logic.
    #[must_use]
    pub fn new(name: impl Into<String>, check: impl InputGuardrailCheck + 'static) -> Self {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// Returns the name of this guardrail.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute this guardrail check.
    pub async fn run(
        &self,
        ctx: &RunContext,
        agent: &Agent,
        input: &RunInput,
    ) -> Result<InputGuardrailResult> {
        let output = self.check.check(ctx, agent, input).await?;
        Ok(InputGuardrailResult {
            guardrail_name: self.name.clone(),
            output,
        })
    }
}

impl std::fmt::Debug for InputGuardrail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputGuardrail")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// The result of running an input guardrail.
#[derive(Debug, Clone)]
pub struct InputGuardrailResult {
    /// Name of the guardrail that produced this result.
    pub guardrail_name: String,

    /// The guardrail check output.
    pub output: GuardrailOutput,
}

impl InputGuardrailResult {
    /// Returns `true` if the tripwire was triggered.
    #[must_use]
    pub const fn is_triggered(&self) -> bool {
        self.output.tripwire_triggered
    }
}

/// Trait for implementing output guardrail check logic.
#[async_trait]
pub trait OutputGuardrailCheck: Send + Sync {
    /// Check the agent's final output.
    ///
    /// # Arguments
    ///
    /// * `ctx` — the current run context (usage, turn, user context)
    /// * `agent` — the agent that produced the output
    /// * `output` — the final output value
    async fn check(
        &self,
        ctx: &RunContext,
        agent: &Agent,
        output: &Value,
    ) -> Result<GuardrailOutput>;
}

/// An output guardrail validating the final output after the last turn.
///
/// All output guardrails of a run execute concurrently. If any tripwire
/// triggers, the computed final output is discarded and the run fails.
#[derive(Clone)]
pub struct OutputGuardrail {
    name: String,
    check: Arc<dyn OutputGuardrailCheck>,
}

impl OutputGuardrail {
    /// Create a new output guardrail with the given name and check logic.
    #[must_use]
    pub fn new(name: impl Into<String>, check: impl OutputGuardrailCheck + 'static) -> Self {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// Returns the name of this guardrail.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute this guardrail check.
    pub async fn run(
        &self,
        ctx: &RunContext,
        agent: &Agent,
        output: &Value,
    ) -> Result<OutputGuardrailResult> {
        let guardrail_output = self.check.check(ctx, agent, output).await?;
        Ok(OutputGuardrailResult {
            guardrail_name: self.name.clone(),
            output: guardrail_output,
        })
    }
}

impl std::fmt::Debug for OutputGuardrail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputGuardrail")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// The result of running an output guardrail.
#[derive(Debug, Clone)]
pub struct OutputGuardrailResult {
    /// Name of the guardrail that produced this result.
    pub guardrail_name: String,

    /// The guardrail check output.
    pub output: GuardrailOutput,
}

impl OutputGuardrailResult {
    /// Returns `true` if the tripwire was triggered.
    #[must_use]
    pub const fn is_triggered(&self) -> bool {
        self.output.tripwire_triggered
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct BlockWord(&'static str);

    #[async_trait]
    impl InputGuardrailCheck for BlockWord {
        async fn check(
            &self,
            _ctx: &RunContext,
            _agent: &Agent,
            input: &RunInput,
        ) -> Result<GuardrailOutput> {
            let text = input.as_text().unwrap_or_default();
            if text.contains(self.0) {
                Ok(GuardrailOutput::tripwire(format!("found '{}'", self.0)))
            } else {
                Ok(GuardrailOutput::pass())
            }
        }
    }

    struct LengthLimit(usize);

    #[async_trait]
    impl OutputGuardrailCheck for LengthLimit {
        async fn check(
            &self,
            _ctx: &RunContext,
            _agent: &Agent,
            output: &Value,
        ) -> Result<GuardrailOutput> {
            let len = output.as_str().map_or(0, str::len);
            if len > self.0 {
                Ok(GuardrailOutput::tripwire(
                    serde_json::json!({"length": len, "limit": self.0}),
                ))
            } else {
                Ok(GuardrailOutput::pass_with_info(
                    serde_json::json!({"length": len}),
                ))
            }
        }
    }

    mod output_shape {
        use super::*;

        #[test]
        fn pass_does_not_trip() {
            let out = GuardrailOutput::pass();
            assert!(!out.is_triggered());
            assert_eq!(out.output_info, Value::Null);
        }

        #[test]
        fn tripwire_carries_info() {
            let out = GuardrailOutput::tripwire("bad");
            assert!(out.is_triggered());
            assert_eq!(out.output_info, Value::String("bad".into()));
        }

        #[test]
        fn pass_with_info_keeps_metadata() {
            let out = GuardrailOutput::pass_with_info(serde_json::json!({"score": 0.1}));
            assert!(!out.is_triggered());
            assert_eq!(out.output_info["score"], 0.1);
        }
    }

    mod input_guardrail {
        use super::*;

        #[tokio::test]
        async fn run_wraps_check_output() {
            let guardrail = InputGuardrail::new("blocklist", BlockWord("forbidden"));
            let ctx = RunContext::new();
            let agent = Agent::new("guarded");

            let clean = guardrail
                .run(&ctx, &agent, &RunInput::from("hello"))
                .await
                .unwrap();
            assert_eq!(clean.guardrail_name, "blocklist");
            assert!(!clean.is_triggered());

            let tripped = guardrail
                .run(&ctx, &agent, &RunInput::from("forbidden text"))
                .await
                .unwrap();
            assert!(tripped.is_triggered());
        }
    }

    mod output_guardrail {
        use super::*;

        #[tokio::test]
        async fn run_wraps_check_output() {
            let guardrail = OutputGuardrail::new("length", LengthLimit(5));
            let ctx = RunContext::new();
            let agent = Agent::new("guarded");

            let ok = guardrail
                .run(&ctx, &agent, &Value::String("hi".into()))
                .await
                .unwrap();
            assert!(!ok.is_triggered());
            assert_eq!(ok.output.output_info["length"], 2);

            let tripped = guardrail
                .run(&ctx, &agent, &Value::String("much too long".into()))
                .await
                .unwrap();
            assert!(tripped.is_triggered());
        }
    }
}
