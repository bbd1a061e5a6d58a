//! The model invocation boundary.
//!
//! The engine never talks to a provider wire protocol directly; it drives a
//! [`Model`] trait object with a fully resolved [`ModelRequest`] and
//! receives either one atomic [`ModelResponse`] or a finite stream of
//! [`ModelStreamEvent`]s.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::agent::OutputSchema;
use crate::error::Result;
use crate::items::{ModelResponse, ResponseItem};
use crate::stream::ModelStreamEvent;
use crate::tool::ToolDefinition;

/// How the model should choose among the available tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ToolChoice {
    /// The model decides whether and which tool to call.
    Auto,
    /// The model must call some tool.
    Required,
    /// The model must not call any tool.
    None,
    /// The model must call the named tool.
    Tool(String),
}

/// How much tracing detail the provider may record for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTracing {
    /// Record nothing.
    Disabled,
    /// Record spans including inputs and outputs.
    Enabled,
    /// Record spans but neither inputs nor outputs.
    EnabledWithoutSensitiveData,
}

impl ModelTracing {
    /// Returns `true` if tracing is disabled entirely.
    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    /// Returns `true` if inputs and outputs may be recorded.
    #[must_use]
    pub const fn includes_data(&self) -> bool {
        matches!(self, Self::Enabled)
    }
}

/// Tunable sampling and tool-selection settings for a model request.
///
/// An agent carries its defaults; a run-wide override replaces individual
/// fields via [`ModelSettings::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Nucleus sampling cutoff.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,

    /// Maximum output tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Tool selection constraint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,

    /// Whether the model may request several tool calls in one turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,
}

impl ModelSettings {
    /// Merge run-wide overrides over these defaults, field-wise.
    ///
    /// A `Some` in `overrides` wins; `None` keeps the default.
    #[must_use]
    pub fn resolve(&self, overrides: &Self) -> Self {
        Self {
            temperature: overrides.temperature.or(self.temperature),
            top_p: overrides.top_p.or(self.top_p),
            max_tokens: overrides.max_tokens.or(self.max_tokens),
            tool_choice: overrides
                .tool_choice
                .clone()
                .or_else(|| self.tool_choice.clone()),
            parallel_tool_calls: overrides.parallel_tool_calls.or(self.parallel_tool_calls),
        }
    }
}

/// A fully resolved model request for one turn.
///
/// `input` is the accumulated conversation: the run's original input plus
/// every item generated so far, in order. `tools` already includes handoffs
/// presented as function tools.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Resolved system instructions, if any.
    pub system_instructions: Option<String>,
    /// Accumulated conversation input.
    pub input: Vec<ResponseItem>,
    /// Merged model settings for this turn.
    pub settings: ModelSettings,
    /// Descriptors of every callable tool, handoffs included.
    pub tools: Vec<ToolDefinition>,
    /// Structured output contract, when the agent declares one.
    pub output_schema: Option<OutputSchema>,
    /// How much tracing detail the provider may record.
    pub tracing: ModelTracing,
    /// Provider response id for stateful continuation.
    pub previous_response_id: Option<String>,
}

/// A finite stream of provider events for one model invocation.
///
/// The stream is not restartable; it must terminate with
/// [`ModelStreamEvent::Completed`] for the turn to be well-formed.
pub type ModelEventStream = Pin<Box<dyn Stream<Item = Result<ModelStreamEvent>> + Send>>;

/// A model capable of answering one turn.
///
/// Implementations marshal to a concrete provider; the engine only depends
/// on this trait.
#[async_trait]
pub trait Model: Send + Sync {
    /// The model's display name, used in logging.
    fn name(&self) -> &str;

    /// Produce one complete response for the request.
    async fn get_response(&self, request: ModelRequest) -> Result<ModelResponse>;

    /// Produce the same response as an incremental event stream.
    async fn stream_response(&self, request: ModelRequest) -> Result<ModelEventStream>;
}

/// A shared, thread-safe [`Model`] trait object.
pub type SharedModel = Arc<dyn Model>;
