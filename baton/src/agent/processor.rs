//! Response classification.
//!
//! One model response is partitioned into ordered [`RunItem`]s plus three
//! actionable buckets: handoff requests, function-tool requests, and
//! computer-action requests. Classification is a pure function — the same
//! response classifies identically every time — and validates that every
//! referenced tool or handoff actually exists on the agent.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::computer::ComputerAction;
use crate::error::{Error, Result};
use crate::items::{
    HandoffCallItem, MessageOutputItem, ModelResponse, ReasoningItem, ResponseItem, RunItem,
    ToolCallItem,
};
use crate::tool::{ComputerTool, FileSearchTool, FunctionTool, Tool, WebSearchTool};

use super::config::{Agent, find_computer_tool};
use super::handoff::Handoff;

/// A function-tool call ready to execute.
#[derive(Debug, Clone)]
pub struct ToolRunFunction {
    /// Correlation id of the call.
    pub call_id: String,
    /// Name of the tool.
    pub name: String,
    /// Raw JSON argument payload.
    pub arguments: String,
    /// The resolved tool.
    pub tool: FunctionTool,
}

/// A handoff request ready to execute.
#[derive(Debug, Clone)]
pub struct ToolRunHandoff {
    /// Correlation id of the call.
    pub call_id: String,
    /// Tool name the handoff was requested under.
    pub name: String,
    /// Raw JSON argument payload.
    pub arguments: String,
    /// The resolved handoff.
    pub handoff: Handoff,
}

/// A computer action ready to execute.
#[derive(Debug, Clone)]
pub struct ToolRunComputerAction {
    /// Correlation id of the call.
    pub call_id: String,
    /// The requested action.
    pub action: ComputerAction,
    /// The computer tool that will perform it.
    pub computer: ComputerTool,
}

/// Classifier output: the run items derived from one model response plus
/// the three buckets of work to execute.
#[derive(Debug, Clone)]
pub struct ProcessedResponse {
    /// Run items in model-output order.
    pub new_items: Vec<RunItem>,
    /// Handoff requests, in request order.
    pub handoffs: Vec<ToolRunHandoff>,
    /// Function-tool requests, in request order.
    pub functions: Vec<ToolRunFunction>,
    /// Computer-action requests, in request order.
    pub computer_actions: Vec<ToolRunComputerAction>,
    /// Flat list of tool names the model used this turn.
    pub tools_used: Vec<String>,
}

impl ProcessedResponse {
    /// Returns `true` iff any actionable bucket is non-empty.
    #[must_use]
    pub fn has_tools_to_run(&self) -> bool {
        !self.handoffs.is_empty() || !self.functions.is_empty() || !self.computer_actions.is_empty()
    }
}

impl Default for ProcessedResponse {
    fn default() -> Self {
        Self {
            new_items: Vec::new(),
            handoffs: Vec::new(),
            functions: Vec::new(),
            computer_actions: Vec::new(),
            tools_used: Vec::new(),
        }
    }
}

/// Partition one model response into run items and actionable buckets.
///
/// # Errors
///
/// Returns [`Error::ModelBehavior`] when the model references a tool or
/// handoff that does not exist on the agent, or requests a computer action
/// while the agent has no computer tool configured. These are
/// non-recoverable data errors from the model, not transient conditions.
pub(crate) fn process_model_response(
    agent: &Arc<Agent>,
    all_tools: &[Tool],
    handoffs: &[Handoff],
    response: &ModelResponse,
) -> Result<ProcessedResponse> {
    let function_map: HashMap<&str, &FunctionTool> = all_tools
        .iter()
        .filter_map(|tool| match tool {
            Tool::Function(function) => Some((function.name(), function)),
            _ => None,
        })
        .collect();
    let handoff_map: HashMap<&str, &Handoff> = handoffs
        .iter()
        .map(|handoff| (handoff.get_tool_name(), handoff))
        .collect();
    let computer_tool = find_computer_tool(all_tools);

    let mut processed = ProcessedResponse::default();

    for item in &response.output {
        match item {
            ResponseItem::Message { .. } => {
                processed.new_items.push(RunItem::Message(MessageOutputItem {
                    agent: Arc::clone(agent),
                    raw: item.clone(),
                }));
            }
            ResponseItem::FileSearchCall { .. } => {
                // Already executed by the provider; recorded for history
                // and tool-usage accounting only.
                processed.new_items.push(RunItem::ToolCall(ToolCallItem {
                    agent: Arc::clone(agent),
                    raw: item.clone(),
                }));
                processed.tools_used.push(FileSearchTool::NAME.to_string());
            }
            ResponseItem::WebSearchCall { .. } => {
                processed.new_items.push(RunItem::ToolCall(ToolCallItem {
                    agent: Arc::clone(agent),
                    raw: item.clone(),
                }));
                processed.tools_used.push(WebSearchTool::NAME.to_string());
            }
            ResponseItem::Reasoning { .. } => {
                processed.new_items.push(RunItem::Reasoning(ReasoningItem {
                    agent: Arc::clone(agent),
                    raw: item.clone(),
                }));
            }
            ResponseItem::ComputerCall { call_id, action, .. } => {
                let Some(computer) = computer_tool else {
                    return Err(Error::model_behavior(format!(
                        "model requested a computer action but agent '{}' has no computer tool",
                        agent.name()
                    )));
                };
                processed.new_items.push(RunItem::ToolCall(ToolCallItem {
                    agent: Arc::clone(agent),
                    raw: item.clone(),
                }));
                processed.tools_used.push(ComputerTool::NAME.to_string());
                processed.computer_actions.push(ToolRunComputerAction {
                    call_id: call_id.clone(),
                    action: action.clone(),
                    computer: computer.clone(),
                });
            }
            ResponseItem::FunctionCall {
                call_id,
                name,
                arguments,
                ..
            } => {
                processed.tools_used.push(name.clone());
                if let Some(handoff) = handoff_map.get(name.as_str()) {
                    processed
                        .new_items
                        .push(RunItem::HandoffCall(HandoffCallItem {
                            agent: Arc::clone(agent),
                            raw: item.clone(),
                        }));
                    processed.handoffs.push(ToolRunHandoff {
                        call_id: call_id.clone(),
                        name: name.clone(),
                        arguments: arguments.clone(),
                        handoff: (*handoff).clone(),
                    });
                } else if let Some(tool) = function_map.get(name.as_str()) {
                    processed.new_items.push(RunItem::ToolCall(ToolCallItem {
                        agent: Arc::clone(agent),
                        raw: item.clone(),
                    }));
                    processed.functions.push(ToolRunFunction {
                        call_id: call_id.clone(),
                        name: name.clone(),
                        arguments: arguments.clone(),
                        tool: (*tool).clone(),
                    });
                } else {
                    return Err(Error::model_behavior(format!(
                        "tool '{name}' not found on agent '{}'",
                        agent.name()
                    )));
                }
            }
            ResponseItem::FunctionCallOutput { .. }
            | ResponseItem::ComputerCallOutput { .. }
            | ResponseItem::Other => {
                debug!(agent = %agent.name(), "Skipping unrecognized model output item");
            }
        }
    }

    Ok(processed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::usage::Usage;
    use serde_json::Value;

    fn function_tool(name: &str) -> Tool {
        Tool::Function(FunctionTool::from_fn(
            name,
            "test tool",
            serde_json::json!({"type": "object"}),
            |_args| async move { Ok(Value::Null) },
        ))
    }

    fn response(output: Vec<ResponseItem>) -> ModelResponse {
        ModelResponse {
            output,
            usage: Usage::new(1, 1),
            response_id: Some("resp".into()),
        }
    }

    fn agent_with_weather() -> (Arc<Agent>, Vec<Tool>) {
        let tools = vec![function_tool("get_weather")];
        let agent = Arc::new(Agent::new("forecaster"));
        (agent, tools)
    }

    #[test]
    fn message_only_response_has_nothing_to_run() {
        let (agent, tools) = agent_with_weather();
        let response = response(vec![ResponseItem::assistant_message("hi")]);

        let processed = process_model_response(&agent, &tools, &[], &response).unwrap();
        assert_eq!(processed.new_items.len(), 1);
        assert!(!processed.has_tools_to_run());
        assert!(processed.tools_used.is_empty());
    }

    #[test]
    fn function_call_lands_in_function_bucket() {
        let (agent, tools) = agent_with_weather();
        let response = response(vec![
            ResponseItem::assistant_message("let me check"),
            ResponseItem::function_call("call_1", "get_weather", r#"{"city":"Oslo"}"#),
        ]);

        let processed = process_model_response(&agent, &tools, &[], &response).unwrap();
        assert_eq!(processed.functions.len(), 1);
        assert_eq!(processed.functions[0].name, "get_weather");
        assert_eq!(processed.functions[0].call_id, "call_1");
        assert!(processed.has_tools_to_run());
        assert_eq!(processed.tools_used, vec!["get_weather"]);
        // Items preserve model-output order: message first, then the call.
        assert_eq!(processed.new_items[0].kind(), "message_output");
        assert_eq!(processed.new_items[1].kind(), "tool_call");
    }

    #[test]
    fn handoff_name_wins_over_function_bucket() {
        let (agent, tools) = agent_with_weather();
        let target = Arc::new(Agent::new("billing"));
        let handoffs = vec![Handoff::new(target)];
        let response = response(vec![ResponseItem::function_call(
            "call_1",
            "transfer_to_billing",
            "{}",
        )]);

        let processed = process_model_response(&agent, &tools, &handoffs, &response).unwrap();
        assert_eq!(processed.handoffs.len(), 1);
        assert!(processed.functions.is_empty());
        assert_eq!(processed.new_items[0].kind(), "handoff_call");
    }

    #[test]
    fn unknown_tool_is_model_behavior_error() {
        let (agent, tools) = agent_with_weather();
        let response = response(vec![ResponseItem::function_call(
            "call_1",
            "frobnicate",
            "{}",
        )]);

        let err = process_model_response(&agent, &tools, &[], &response).unwrap_err();
        assert!(matches!(err, Error::ModelBehavior(_)));
        assert!(err.to_string().contains("frobnicate"));
    }

    #[test]
    fn computer_call_without_computer_tool_is_model_behavior_error() {
        let (agent, tools) = agent_with_weather();
        let response = response(vec![ResponseItem::ComputerCall {
            id: None,
            call_id: "call_1".into(),
            action: ComputerAction::Screenshot,
        }]);

        let err = process_model_response(&agent, &tools, &[], &response).unwrap_err();
        assert!(matches!(err, Error::ModelBehavior(_)));
    }

    #[test]
    fn hosted_calls_are_recorded_not_bucketed() {
        let (agent, tools) = agent_with_weather();
        let response = response(vec![
            ResponseItem::FileSearchCall {
                id: Some("fs_1".into()),
                queries: vec!["rust".into()],
            },
            ResponseItem::WebSearchCall { id: None },
        ]);

        let processed = process_model_response(&agent, &tools, &[], &response).unwrap();
        assert_eq!(processed.new_items.len(), 2);
        assert!(!processed.has_tools_to_run());
        assert_eq!(processed.tools_used, vec!["file_search", "web_search"]);
    }

    #[test]
    fn unrecognized_items_are_skipped_not_fatal() {
        let (agent, tools) = agent_with_weather();
        let response = response(vec![
            ResponseItem::Other,
            ResponseItem::assistant_message("still fine"),
        ]);

        let processed = process_model_response(&agent, &tools, &[], &response).unwrap();
        assert_eq!(processed.new_items.len(), 1);
    }

    #[test]
    fn classification_is_idempotent() {
        let (agent, tools) = agent_with_weather();
        let target = Arc::new(Agent::new("billing"));
        let handoffs = vec![Handoff::new(target)];
        let response = response(vec![
            ResponseItem::assistant_message("working"),
            ResponseItem::function_call("call_1", "get_weather", "{}"),
            ResponseItem::function_call("call_2", "transfer_to_billing", "{}"),
        ]);

        let first = process_model_response(&agent, &tools, &handoffs, &response).unwrap();
        let second = process_model_response(&agent, &tools, &handoffs, &response).unwrap();

        assert_eq!(first.new_items.len(), second.new_items.len());
        for (a, b) in first.new_items.iter().zip(second.new_items.iter()) {
            assert_eq!(a.raw(), b.raw());
            assert_eq!(a.kind(), b.kind());
        }
        assert_eq!(first.functions.len(), second.functions.len());
        assert_eq!(first.handoffs.len(), second.handoffs.len());
        assert_eq!(first.tools_used, second.tools_used);
    }
}
