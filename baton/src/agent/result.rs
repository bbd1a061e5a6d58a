//! Run inputs, run-level configuration, and result types.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::callback::SharedRunHooks;
use crate::guardrail::{
    InputGuardrail, InputGuardrailResult, OutputGuardrail, OutputGuardrailResult,
};
use crate::items::{ModelResponse, ResponseItem, RunItem};
use crate::model::{ModelSettings, SharedModel};
use crate::usage::Usage;

use super::config::Agent;
use super::handoff::HandoffInputFilter;

/// The input a run starts from: either plain user text or a prepared list
/// of conversation items.
#[derive(Debug, Clone, PartialEq)]
pub enum RunInput {
    /// A single user message.
    Text(String),
    /// A prepared conversation history.
    Items(Vec<ResponseItem>),
}

impl RunInput {
    /// The text of a plain-text input; `None` for item-list inputs.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Items(_) => None,
        }
    }

    /// Convert into the item list sent to the model.
    #[must_use]
    pub fn to_items(&self) -> Vec<ResponseItem> {
        match self {
            Self::Text(text) => vec![ResponseItem::user_message(text.clone())],
            Self::Items(items) => items.clone(),
        }
    }
}

impl From<&str> for RunInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for RunInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<ResponseItem>> for RunInput {
    fn from(items: Vec<ResponseItem>) -> Self {
        Self::Items(items)
    }
}

/// Run-level configuration: overrides, guardrails, hooks, tracing.
///
/// All fields are public; builder methods exist for the common ones.
#[derive(Clone, Default)]
pub struct RunConfig {
    /// Model override applied to every agent in the run.
    pub model: Option<SharedModel>,

    /// Model settings overriding each agent's defaults, field-wise.
    pub model_settings: Option<ModelSettings>,

    /// Default input filter applied to handoffs that carry none of their own.
    pub handoff_input_filter: Option<HandoffInputFilter>,

    /// Run-wide input guardrails, joined with the starting agent's.
    pub input_guardrails: Vec<InputGuardrail>,

    /// Run-wide output guardrails, joined with the final agent's.
    pub output_guardrails: Vec<OutputGuardrail>,

    /// Maximum number of turns before the run aborts. Zero means the
    /// default of [`RunConfig::DEFAULT_MAX_TURNS`].
    pub max_turns: usize,

    /// Run-level lifecycle hooks.
    pub hooks: Option<SharedRunHooks>,

    /// Opaque caller context made available to tools, guardrails, and
    /// dynamic instructions.
    pub context: Value,

    /// Provider response id to continue from without resending history.
    pub previous_response_id: Option<String>,

    /// Logical workflow name recorded on the run span.
    pub workflow_name: String,

    /// Trace id override; generated when absent.
    pub trace_id: Option<String>,

    /// Group id correlating related runs.
    pub group_id: Option<String>,

    /// Free-form metadata recorded on the run span.
    pub metadata: Option<HashMap<String, String>>,

    /// Disable tracing spans for this run entirely.
    pub tracing_disabled: bool,

    /// Record model/tool inputs and outputs in spans.
    pub trace_include_sensitive_data: bool,
}

impl RunConfig {
    /// Default turn budget.
    pub const DEFAULT_MAX_TURNS: usize = 10;

    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_turns: Self::DEFAULT_MAX_TURNS,
            workflow_name: "Agent workflow".to_string(),
            trace_include_sensitive_data: true,
            ..Default::default()
        }
    }

    /// The effective turn budget.
    #[must_use]
    pub const fn effective_max_turns(&self) -> usize {
        if self.max_turns == 0 {
            Self::DEFAULT_MAX_TURNS
        } else {
            self.max_turns
        }
    }

    /// Override the model for every agent in the run.
    #[must_use]
    pub fn with_model(mut self, model: SharedModel) -> Self {
        self.model = Some(model);
        self
    }

    /// Override model settings field-wise for every agent in the run.
    #[must_use]
    pub fn with_model_settings(mut self, settings: ModelSettings) -> Self {
        self.model_settings = Some(settings);
        self
    }

    /// Set the turn budget.
    #[must_use]
    pub const fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Set run-level lifecycle hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: SharedRunHooks) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Add a run-wide input guardrail.
    #[must_use]
    pub fn with_input_guardrail(mut self, guardrail: InputGuardrail) -> Self {
        self.input_guardrails.push(guardrail);
        self
    }

    /// Add a run-wide output guardrail.
    #[must_use]
    pub fn with_output_guardrail(mut self, guardrail: OutputGuardrail) -> Self {
        self.output_guardrails.push(guardrail);
        self
    }

    /// Set the default handoff input filter.
    #[must_use]
    pub fn with_handoff_input_filter(
        mut self,
        filter: impl Fn(super::handoff::HandoffInputData) -> super::handoff::HandoffInputData
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.handoff_input_filter = Some(Arc::new(filter));
        self
    }

    /// Set the caller context value.
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    /// Continue from a previous provider response id.
    #[must_use]
    pub fn with_previous_response_id(mut self, id: impl Into<String>) -> Self {
        self.previous_response_id = Some(id.into());
        self
    }

    /// Set the workflow name recorded on the run span.
    #[must_use]
    pub fn with_workflow_name(mut self, name: impl Into<String>) -> Self {
        self.workflow_name = name.into();
        self
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("model", &self.model.is_some())
            .field("model_settings", &self.model_settings)
            .field("handoff_input_filter", &self.handoff_input_filter.is_some())
            .field("input_guardrails", &self.input_guardrails)
            .field("output_guardrails", &self.output_guardrails)
            .field("max_turns", &self.effective_max_turns())
            .field("hooks", &self.hooks.is_some())
            .field("workflow_name", &self.workflow_name)
            .field("tracing_disabled", &self.tracing_disabled)
            .finish_non_exhaustive()
    }
}

/// What the engine does after one turn.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum NextStep {
    /// Control transfers to a new agent; the loop continues under it.
    Handoff {
        /// The agent the conversation continues with.
        new_agent: Arc<Agent>,
    },
    /// The run is over with this final output.
    FinalOutput {
        /// The final output value (a JSON string for plain-text agents).
        output: Value,
    },
    /// No terminal condition was reached; run the model again.
    RunAgain,
}

/// The result of one turn of the engine.
#[derive(Debug, Clone)]
pub struct SingleStepResult {
    /// The run input as of turn start, possibly rewritten by a handoff
    /// input filter during this turn.
    pub original_input: RunInput,
    /// The raw model response of this turn.
    pub model_response: ModelResponse,
    /// Items generated before this turn.
    pub pre_turn_items: Vec<RunItem>,
    /// Items generated during this turn, in canonical order.
    pub new_turn_items: Vec<RunItem>,
    /// The next-step decision.
    pub next_step: NextStep,
}

impl SingleStepResult {
    /// All items generated since the run's original input.
    #[must_use]
    pub fn generated_items(&self) -> Vec<RunItem> {
        let mut items = self.pre_turn_items.clone();
        items.extend(self.new_turn_items.iter().cloned());
        items
    }
}

/// The aggregate result of a buffered run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// The run's input, as last rewritten by any handoff input filter.
    pub input: RunInput,
    /// Every item generated during the run, in order.
    pub new_items: Vec<RunItem>,
    /// The raw model response of every turn.
    pub raw_responses: Vec<ModelResponse>,
    /// The final output value.
    pub final_output: Value,
    /// Results of the input guardrails that completed without tripping.
    pub input_guardrail_results: Vec<InputGuardrailResult>,
    /// Results of the output guardrails that completed without tripping.
    pub output_guardrail_results: Vec<OutputGuardrailResult>,
    /// The agent that produced the final output.
    pub last_agent: Arc<Agent>,
    /// The last provider response id, for stateful continuation.
    pub last_response_id: Option<String>,
    /// Accumulated usage across all turns.
    pub usage: Usage,
    /// Number of turns executed.
    pub turns: usize,
}

impl RunResult {
    /// The final output rendered as text.
    #[must_use]
    pub fn final_output_text(&self) -> String {
        match &self.final_output {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }

    /// Deserialize a structured final output into a concrete type.
    ///
    /// # Errors
    ///
    /// Returns [`Error`](crate::Error) if the final output does not match
    /// the target type.
    pub fn parse<T: DeserializeOwned>(&self) -> crate::Result<T> {
        serde_json::from_value(self.final_output.clone()).map_err(crate::Error::Json)
    }
}
