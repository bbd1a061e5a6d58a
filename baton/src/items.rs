//! Conversation items: wire-level response items and engine-level run items.
//!
//! [`ResponseItem`] is the unit of conversation exchanged with a model
//! provider, in both directions. [`RunItem`] wraps a response item together
//! with the [`Agent`] that produced it; the ordered sequence of run items
//! produced since the run's original input is the canonical conversation
//! delta.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::Agent;
use crate::computer::ComputerAction;
use crate::usage::Usage;

/// Role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions.
    System,
    /// End-user input.
    User,
    /// Model output.
    Assistant,
}

/// One part of a message's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ContentPart {
    /// Plain text.
    Text {
        /// The text content.
        text: String,
    },
    /// The model refused to answer.
    Refusal {
        /// The refusal explanation.
        refusal: String,
    },
}

/// One wire-level conversation item.
///
/// Items flow in both directions: model outputs (messages, tool calls,
/// reasoning) and engine-produced inputs (tool call outputs). Unrecognized
/// kinds deserialize as [`ResponseItem::Other`] and are logged and skipped
/// by the classifier rather than failing the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ResponseItem {
    /// A conversation message.
    Message {
        /// Provider-assigned item id.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Who authored the message.
        role: Role,
        /// Ordered message content parts.
        content: Vec<ContentPart>,
    },
    /// A function-tool invocation requested by the model.
    FunctionCall {
        /// Provider-assigned item id.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Correlation id linking the call to its output.
        call_id: String,
        /// Name of the tool to invoke.
        name: String,
        /// Raw JSON argument payload.
        arguments: String,
    },
    /// The output of a function-tool invocation.
    FunctionCallOutput {
        /// Correlation id of the originating call.
        call_id: String,
        /// Stringified tool output.
        output: String,
    },
    /// A computer action requested by the model.
    ComputerCall {
        /// Provider-assigned item id.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Correlation id linking the call to its output.
        call_id: String,
        /// The requested action.
        action: ComputerAction,
    },
    /// The screenshot result of a computer action.
    ComputerCallOutput {
        /// Correlation id of the originating call.
        call_id: String,
        /// Screenshot as a data URL.
        output: String,
    },
    /// A file search already executed by the provider.
    FileSearchCall {
        /// Provider-assigned item id.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// The queries the provider searched for.
        #[serde(default)]
        queries: Vec<String>,
    },
    /// A web search already executed by the provider.
    WebSearchCall {
        /// Provider-assigned item id.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    /// A reasoning trace emitted by the model.
    Reasoning {
        /// Provider-assigned item id.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Reasoning summary fragments.
        #[serde(default)]
        summary: Vec<String>,
    },
    /// An output kind this engine does not recognize.
    #[serde(other)]
    Other,
}

impl ResponseItem {
    /// Build a plain-text user message.
    #[must_use]
    pub fn user_message(text: impl Into<String>) -> Self {
        Self::Message {
            id: None,
            role: Role::User,
            content: vec![ContentPart::Text { text: text.into() }],
        }
    }

    /// Build a plain-text assistant message.
    #[must_use]
    pub fn assistant_message(text: impl Into<String>) -> Self {
        Self::Message {
            id: None,
            role: Role::Assistant,
            content: vec![ContentPart::Text { text: text.into() }],
        }
    }

    /// Build a function call item.
    #[must_use]
    pub fn function_call(
        call_id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self::FunctionCall {
            id: None,
            call_id: call_id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Build a function call output item.
    #[must_use]
    pub fn function_call_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self::FunctionCallOutput {
            call_id: call_id.into(),
            output: output.into(),
        }
    }

    /// The concatenated text of a message item, `None` for other kinds.
    #[must_use]
    pub fn message_text(&self) -> Option<String> {
        match self {
            Self::Message { content, .. } => Some(
                content
                    .iter()
                    .filter_map(|part| match part {
                        ContentPart::Text { text } => Some(text.as_str()),
                        ContentPart::Refusal { .. } => None,
                    })
                    .collect::<Vec<_>>()
                    .join(""),
            ),
            _ => None,
        }
    }
}

/// Raw output of one model invocation.
///
/// Created once per turn and immutable thereafter.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResponse {
    /// The ordered output items of the response.
    pub output: Vec<ResponseItem>,
    /// Token usage of this single invocation.
    pub usage: Usage,
    /// Opaque provider id usable to continue the conversation without
    /// resending history, when the provider supports it.
    pub response_id: Option<String>,
}

impl ModelResponse {
    /// The text of the last message item in the response, if any.
    #[must_use]
    pub fn last_message_text(&self) -> Option<String> {
        self.output
            .iter()
            .rev()
            .find_map(ResponseItem::message_text)
    }
}

/// A message produced by the model.
#[derive(Debug, Clone)]
pub struct MessageOutputItem {
    /// The agent that produced this item.
    pub agent: Arc<Agent>,
    /// The raw message item.
    pub raw: ResponseItem,
}

/// A tool invocation requested by the model (function, computer, or a tool
/// the provider already executed).
#[derive(Debug, Clone)]
pub struct ToolCallItem {
    /// The agent that produced this item.
    pub agent: Arc<Agent>,
    /// The raw call item.
    pub raw: ResponseItem,
}

/// The output of a tool invocation.
#[derive(Debug, Clone)]
pub struct ToolCallOutputItem {
    /// The agent that produced this item.
    pub agent: Arc<Agent>,
    /// The raw output item fed back into the conversation.
    pub raw: ResponseItem,
    /// The tool's native output value, retained for policy decisions.
    pub output: Value,
}

/// A delegation request expressed as a tool call.
#[derive(Debug, Clone)]
pub struct HandoffCallItem {
    /// The agent that produced this item.
    pub agent: Arc<Agent>,
    /// The raw call item.
    pub raw: ResponseItem,
}

/// The acknowledgement item of a completed handoff.
#[derive(Debug, Clone)]
pub struct HandoffOutputItem {
    /// The agent that produced this item.
    pub agent: Arc<Agent>,
    /// The raw output item fed back into the conversation.
    pub raw: ResponseItem,
    /// The agent control was transferred from.
    pub source_agent: Arc<Agent>,
    /// The agent control was transferred to.
    pub target_agent: Arc<Agent>,
}

/// A reasoning trace item.
#[derive(Debug, Clone)]
pub struct ReasoningItem {
    /// The agent that produced this item.
    pub agent: Arc<Agent>,
    /// The raw reasoning item.
    pub raw: ResponseItem,
}

/// One unit of conversation history produced during a run.
///
/// Items are append-only within a run; every variant records the agent that
/// produced it. Consumption sites match exhaustively, so adding a variant
/// is a compile-visible change everywhere.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum RunItem {
    /// A message produced by the model.
    Message(MessageOutputItem),
    /// A tool invocation requested by the model.
    ToolCall(ToolCallItem),
    /// The output of a tool invocation.
    ToolCallOutput(ToolCallOutputItem),
    /// A delegation request expressed as a tool call.
    HandoffCall(HandoffCallItem),
    /// The acknowledgement of a completed handoff.
    HandoffOutput(HandoffOutputItem),
    /// A reasoning trace.
    Reasoning(ReasoningItem),
}

impl RunItem {
    /// The agent that produced this item.
    #[must_use]
    pub fn agent(&self) -> &Arc<Agent> {
        match self {
            Self::Message(item) => &item.agent,
            Self::ToolCall(item) => &item.agent,
            Self::ToolCallOutput(item) => &item.agent,
            Self::HandoffCall(item) => &item.agent,
            Self::HandoffOutput(item) => &item.agent,
            Self::Reasoning(item) => &item.agent,
        }
    }

    /// The raw wire-level item.
    #[must_use]
    pub fn raw(&self) -> &ResponseItem {
        match self {
            Self::Message(item) => &item.raw,
            Self::ToolCall(item) => &item.raw,
            Self::ToolCallOutput(item) => &item.raw,
            Self::HandoffCall(item) => &item.raw,
            Self::HandoffOutput(item) => &item.raw,
            Self::Reasoning(item) => &item.raw,
        }
    }

    /// A short name for the item kind, used in events and tracing.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Message(_) => "message_output",
            Self::ToolCall(_) => "tool_call",
            Self::ToolCallOutput(_) => "tool_call_output",
            Self::HandoffCall(_) => "handoff_call",
            Self::HandoffOutput(_) => "handoff_output",
            Self::Reasoning(_) => "reasoning",
        }
    }

    /// Convert this item back into model-input form.
    #[must_use]
    pub fn to_input_item(&self) -> ResponseItem {
        self.raw().clone()
    }
}

/// Concatenated text of all message items, in order.
///
/// Useful for guardrails and for turning a conversation delta back into
/// display text.
#[must_use]
pub fn text_message_outputs(items: &[RunItem]) -> String {
    items
        .iter()
        .filter_map(|item| match item {
            RunItem::Message(message) => message.raw.message_text(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_agent() -> Arc<Agent> {
        Arc::new(Agent::new("itemizer"))
    }

    mod response_item {
        use super::*;

        #[test]
        fn message_text_concatenates_text_parts() {
            let item = ResponseItem::Message {
                id: None,
                role: Role::Assistant,
                content: vec![
                    ContentPart::Text {
                        text: "Hello, ".into(),
                    },
                    ContentPart::Refusal {
                        refusal: "nope".into(),
                    },
                    ContentPart::Text {
                        text: "world".into(),
                    },
                ],
            };
            assert_eq!(item.message_text().unwrap(), "Hello, world");
        }

        #[test]
        fn message_text_is_none_for_non_messages() {
            let item = ResponseItem::function_call("call_1", "get_weather", "{}");
            assert!(item.message_text().is_none());
        }

        #[test]
        fn unknown_kind_deserializes_as_other() {
            let item: ResponseItem =
                serde_json::from_str(r#"{"type": "holographic_call", "data": 1}"#).unwrap();
            assert_eq!(item, ResponseItem::Other);
        }

        #[test]
        fn function_call_roundtrips() {
            let item = ResponseItem::function_call("call_9", "lookup", r#"{"q":"rust"}"#);
            let json = serde_json::to_string(&item).unwrap();
            let back: ResponseItem = serde_json::from_str(&json).unwrap();
            assert_eq!(item, back);
        }
    }

    mod model_response {
        use super::*;

        #[test]
        fn last_message_text_picks_last_message() {
            let response = ModelResponse {
                output: vec![
                    ResponseItem::assistant_message("first"),
                    ResponseItem::function_call("c1", "t", "{}"),
                    ResponseItem::assistant_message("second"),
                ],
                usage: Usage::zero(),
                response_id: None,
            };
            assert_eq!(response.last_message_text().unwrap(), "second");
        }

        #[test]
        fn last_message_text_is_none_without_messages() {
            let response = ModelResponse {
                output: vec![ResponseItem::function_call("c1", "t", "{}")],
                usage: Usage::zero(),
                response_id: None,
            };
            assert!(response.last_message_text().is_none());
        }
    }

    mod run_item {
        use super::*;

        #[test]
        fn records_producing_agent() {
            let agent = test_agent();
            let item = RunItem::Message(MessageOutputItem {
                agent: Arc::clone(&agent),
                raw: ResponseItem::assistant_message("hi"),
            });
            assert_eq!(item.agent().name(), "itemizer");
            assert_eq!(item.kind(), "message_output");
        }

        #[test]
        fn to_input_item_preserves_raw() {
            let agent = test_agent();
            let raw = ResponseItem::function_call_output("call_3", "42");
            let item = RunItem::ToolCallOutput(ToolCallOutputItem {
                agent,
                raw: raw.clone(),
                output: serde_json::json!(42),
            });
            assert_eq!(item.to_input_item(), raw);
        }

        #[test]
        fn text_message_outputs_joins_messages_only() {
            let agent = test_agent();
            let items = vec![
                RunItem::Message(MessageOutputItem {
                    agent: Arc::clone(&agent),
                    raw: ResponseItem::assistant_message("a"),
                }),
                RunItem::ToolCall(ToolCallItem {
                    agent: Arc::clone(&agent),
                    raw: ResponseItem::function_call("c", "t", "{}"),
                }),
                RunItem::Message(MessageOutputItem {
                    agent,
                    raw: ResponseItem::assistant_message("b"),
                }),
            ];
            assert_eq!(text_message_outputs(&items), "ab");
        }
    }
}
