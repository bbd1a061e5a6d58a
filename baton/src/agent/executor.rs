//! Side-effect execution for one turn.
//!
//! Function-tool calls fan out concurrently; their failures are isolated
//! per call. Computer actions run strictly serially because they share one
//! mutable surface. Handoffs resolve exactly one delegation target per
//! turn and rewrite the carried-forward conversation when a filter is
//! configured.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::callback::RunContext;
use crate::computer::ComputerAction;
use crate::error::{Error, Result};
use crate::items::{
    HandoffOutputItem, ModelResponse, ResponseItem, RunItem, ToolCallOutputItem,
};
use crate::tool::{ComputerTool, FunctionToolResult, stringify_output};

use super::config::{Agent, ToolUseBehavior};
use super::handoff::HandoffInputData;
use super::processor::{ToolRunComputerAction, ToolRunFunction, ToolRunHandoff};
use super::result::{NextStep, RunConfig, RunInput, SingleStepResult};
use super::runner::HookDispatch;

/// Tool output appended for every handoff request beyond the first.
pub(crate) const MULTIPLE_HANDOFFS_IGNORED: &str =
    "Multiple handoffs detected, ignoring this one.";

/// Execute all requested function-tool calls concurrently.
///
/// Results correlate positionally 1:1 with `runs`. A call whose tool
/// defines an error formatter fails soft (the formatted text becomes its
/// result); otherwise its error aborts the turn.
pub(crate) async fn execute_function_tool_calls(
    agent: &Arc<Agent>,
    runs: &[ToolRunFunction],
    ctx: &RunContext,
    hooks: &HookDispatch<'_>,
    include_sensitive: bool,
) -> Result<Vec<FunctionToolResult>> {
    let futures = runs
        .iter()
        .map(|run| execute_single_function(agent, run, ctx, hooks, include_sensitive));
    join_all(futures).await.into_iter().collect()
}

async fn execute_single_function(
    agent: &Arc<Agent>,
    run: &ToolRunFunction,
    ctx: &RunContext,
    hooks: &HookDispatch<'_>,
    include_sensitive: bool,
) -> Result<FunctionToolResult> {
    let trimmed = run.arguments.trim();
    let arguments: Value = if trimmed.is_empty() {
        serde_json::json!({})
    } else {
        serde_json::from_str(trimmed).map_err(|e| {
            Error::model_behavior(format!(
                "invalid JSON arguments for tool '{}': {e}",
                run.name
            ))
        })?
    };

    let span = info_span!(
        "tool",
        tool.name = %run.name,
        tool.call_id = %run.call_id,
        tool.input = tracing::field::Empty,
        tool.output = tracing::field::Empty,
        error = tracing::field::Empty,
    );
    if include_sensitive {
        span.record("tool.input", run.arguments.as_str());
    }

    async {
        hooks.tool_start(ctx, &run.name).await;

        let output = match run.tool.invoke(ctx, arguments).await {
            Ok(value) => value,
            Err(tool_err) => match run.tool.error_formatter() {
                Some(formatter) => {
                    warn!(tool = %run.name, error = %tool_err, "Tool call failed, reporting fallback text to the model");
                    tracing::Span::current().record("error", tracing::field::display(&tool_err));
                    Value::String(formatter(&tool_err))
                }
                None => {
                    error!(tool = %run.name, error = %tool_err, "Tool call failed");
                    tracing::Span::current().record("error", tracing::field::display(&tool_err));
                    return Err(Error::Tool(tool_err));
                }
            },
        };

        let output_text = stringify_output(&output);
        if include_sensitive {
            tracing::Span::current().record("tool.output", output_text.as_str());
        }
        hooks.tool_end(ctx, &run.name, &output_text).await;

        Ok(FunctionToolResult {
            tool_name: run.name.clone(),
            item: RunItem::ToolCallOutput(ToolCallOutputItem {
                agent: Arc::clone(agent),
                raw: ResponseItem::function_call_output(run.call_id.clone(), output_text),
                output: output.clone(),
            }),
            output,
        })
    }
    .instrument(span)
    .await
}

/// Execute all requested computer actions strictly serially, in request
/// order. Each action's handler takes a screenshot afterwards and returns
/// it as the call output.
pub(crate) async fn execute_computer_actions(
    agent: &Arc<Agent>,
    runs: &[ToolRunComputerAction],
    ctx: &RunContext,
    hooks: &HookDispatch<'_>,
    include_sensitive: bool,
) -> Result<Vec<RunItem>> {
    let mut items = Vec::with_capacity(runs.len());
    for run in runs {
        let span = info_span!(
            "computer",
            computer.action = %run.action.kind(),
            tool.call_id = %run.call_id,
            error = tracing::field::Empty,
        );
        let item = execute_single_action(agent, run, ctx, hooks, include_sensitive)
            .instrument(span)
            .await?;
        items.push(item);
    }
    Ok(items)
}

async fn execute_single_action(
    agent: &Arc<Agent>,
    run: &ToolRunComputerAction,
    ctx: &RunContext,
    hooks: &HookDispatch<'_>,
    include_sensitive: bool,
) -> Result<RunItem> {
    hooks.tool_start(ctx, ComputerTool::NAME).await;

    let computer = run.computer.computer();
    let performed = match &run.action {
        ComputerAction::Click { x, y, button } => computer.click(*x, *y, *button).await,
        ComputerAction::DoubleClick { x, y } => computer.double_click(*x, *y).await,
        ComputerAction::Drag { path } => computer.drag(path).await,
        ComputerAction::Keypress { keys } => computer.keypress(keys).await,
        ComputerAction::Move { x, y } => computer.move_mouse(*x, *y).await,
        ComputerAction::Screenshot => Ok(()),
        ComputerAction::Scroll {
            x,
            y,
            scroll_x,
            scroll_y,
        } => computer.scroll(*x, *y, *scroll_x, *scroll_y).await,
        ComputerAction::Type { text } => computer.type_text(text).await,
        ComputerAction::Wait => computer.wait().await,
    };
    if let Err(e) = performed {
        error!(action = %run.action.kind(), error = %e, "Computer action failed");
        tracing::Span::current().record("error", tracing::field::display(&e));
        return Err(Error::Tool(e));
    }

    let screenshot = computer.screenshot().await.map_err(|e| {
        error!(action = %run.action.kind(), error = %e, "Screenshot after computer action failed");
        Error::Tool(e)
    })?;
    let data_url = format!("data:image/png;base64,{screenshot}");

    let reported = if include_sensitive {
        data_url.as_str()
    } else {
        "<screenshot>"
    };
    hooks.tool_end(ctx, ComputerTool::NAME, reported).await;

    Ok(RunItem::ToolCallOutput(ToolCallOutputItem {
        agent: Arc::clone(agent),
        raw: ResponseItem::ComputerCallOutput {
            call_id: run.call_id.clone(),
            output: data_url.clone(),
        },
        output: Value::String(data_url),
    }))
}

/// Execute the turn's handoff requests: exactly one is honored (the first
/// in request order); all others receive a synthesized "ignored" tool
/// output so the model is not left with a dangling call.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn execute_handoffs(
    agent: &Arc<Agent>,
    mut run_handoffs: Vec<ToolRunHandoff>,
    original_input: RunInput,
    pre_turn_items: Vec<RunItem>,
    mut new_items: Vec<RunItem>,
    model_response: ModelResponse,
    ctx: &RunContext,
    hooks: &HookDispatch<'_>,
    config: &RunConfig,
) -> Result<SingleStepResult> {
    let honored = run_handoffs.remove(0);
    for rejected in &run_handoffs {
        debug!(
            handoff = %rejected.name,
            "Ignoring additional handoff request in the same turn"
        );
        new_items.push(RunItem::ToolCallOutput(ToolCallOutputItem {
            agent: Arc::clone(agent),
            raw: ResponseItem::function_call_output(
                rejected.call_id.clone(),
                MULTIPLE_HANDOFFS_IGNORED,
            ),
            output: Value::String(MULTIPLE_HANDOFFS_IGNORED.to_string()),
        }));
    }

    let new_agent = honored.handoff.invoke(ctx, &honored.arguments).await?;
    info!(from = %agent.name(), to = %new_agent.name(), "Handoff");

    new_items.push(RunItem::HandoffOutput(HandoffOutputItem {
        agent: Arc::clone(agent),
        raw: ResponseItem::function_call_output(
            honored.call_id.clone(),
            serde_json::json!({"assistant": new_agent.name()}).to_string(),
        ),
        source_agent: Arc::clone(agent),
        target_agent: Arc::clone(&new_agent),
    }));

    hooks.handoff(ctx, agent.name(), new_agent.name()).await;

    // The handoff's own filter takes precedence over the run-wide default.
    let filter = honored
        .handoff
        .get_input_filter()
        .cloned()
        .or_else(|| config.handoff_input_filter.clone());

    let (original_input, pre_turn_items, new_turn_items) = match filter {
        Some(filter) => {
            let data = filter(HandoffInputData {
                input_history: original_input.to_items(),
                pre_handoff_items: pre_turn_items,
                new_items,
            });
            (
                RunInput::Items(data.input_history),
                data.pre_handoff_items,
                data.new_items,
            )
        }
        None => (original_input, pre_turn_items, new_items),
    };

    Ok(SingleStepResult {
        original_input,
        model_response,
        pre_turn_items,
        new_turn_items,
        next_step: NextStep::Handoff { new_agent },
    })
}

/// Apply the agent's tool-use policy to this turn's function-tool results.
///
/// Returns `Some(final_output)` when the results terminate the run, with
/// the output already coerced to the agent's declared output type (plain
/// text is stringified).
pub(crate) async fn check_tool_use_result(
    agent: &Arc<Agent>,
    ctx: &RunContext,
    results: &[FunctionToolResult],
) -> Result<Option<Value>> {
    if results.is_empty() {
        return Ok(None);
    }

    match agent.get_tool_use_behavior() {
        ToolUseBehavior::RunLlmAgain => Ok(None),
        ToolUseBehavior::StopOnFirstTool => {
            Ok(results.first().map(|r| coerce_tool_output(agent, r)))
        }
        ToolUseBehavior::StopAtTools(names) => Ok(results
            .iter()
            .find(|r| names.contains(&r.tool_name))
            .map(|r| coerce_tool_output(agent, r))),
        ToolUseBehavior::Custom(decision) => {
            let outcome = decision.decide(ctx, results).await?;
            if outcome.is_final_output {
                outcome.final_output.map(Some).ok_or_else(|| {
                    Error::user(
                        "custom tool-use decision reported a final output but provided no value",
                    )
                })
            } else {
                Ok(None)
            }
        }
    }
}

fn coerce_tool_output(agent: &Arc<Agent>, result: &FunctionToolResult) -> Value {
    if agent.get_output_schema().is_some() {
        result.output.clone()
    } else {
        Value::String(stringify_output(&result.output))
    }
}
