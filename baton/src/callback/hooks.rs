//! Core hook traits for run lifecycle callbacks.
//!
//! Both traits use `async_trait` for object safety (`dyn RunHooks`,
//! `dyn AgentHooks`) and provide default no-op implementations for every
//! method, so users only override the events they care about.
//!
//! # Lifecycle Events
//!
//! 1. **`on_agent_start`** — an agent segment begins (run start, or after a
//!    handoff)
//! 2. **Turn loop** (repeats until done):
//!    - `on_llm_start` → *model call* → `on_llm_end`
//!    - `on_tool_start` → *tool execution* → `on_tool_end`
//!    - `on_handoff` when control transfers to another agent
//! 3. **`on_agent_end`** — a final output was produced, or **`on_error`**
//!    on failure

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Error;
use crate::items::{ModelResponse, ResponseItem};

use super::context::RunContext;

/// A boxed, thread-safe [`RunHooks`] trait object.
pub type BoxedRunHooks = Box<dyn RunHooks>;

/// A shared, thread-safe [`RunHooks`] trait object.
pub type SharedRunHooks = std::sync::Arc<dyn RunHooks>;

/// A boxed, thread-safe [`AgentHooks`] trait object.
pub type BoxedAgentHooks = Box<dyn AgentHooks>;

/// A shared, thread-safe [`AgentHooks`] trait object.
pub type SharedAgentHooks = std::sync::Arc<dyn AgentHooks>;

/// Global run-level lifecycle hooks.
///
/// Implementations observe **all** agents within a single run. Every method
/// receives the agent name so listeners can distinguish between agents in
/// multi-agent runs.
#[async_trait]
pub trait RunHooks: Send + Sync {
    /// Called when an agent segment begins (run start or handoff arrival).
    async fn on_agent_start(&self, _ctx: &RunContext, _agent_name: &str) {}

    /// Called after an agent produces the run's final output.
    async fn on_agent_end(&self, _ctx: &RunContext, _agent_name: &str, _output: &Value) {}

    /// Called just before invoking the model.
    async fn on_llm_start(
        &self,
        _ctx: &RunContext,
        _agent_name: &str,
        _system_prompt: Option<&str>,
        _input: &[ResponseItem],
    ) {
    }

    /// Called immediately after the model returns a response.
    async fn on_llm_end(&self, _ctx: &RunContext, _agent_name: &str, _response: &ModelResponse) {}

    /// Called immediately before a tool is invoked.
    async fn on_tool_start(&self, _ctx: &RunContext, _agent_name: &str, _tool_name: &str) {}

    /// Called immediately after a tool completes.
    ///
    /// `result` is the tool output as shown to the model (success or error
    /// text).
    async fn on_tool_end(
        &self,
        _ctx: &RunContext,
        _agent_name: &str,
        _tool_name: &str,
        _result: &str,
    ) {
    }

    /// Called when control is handed off from one agent to another.
    async fn on_handoff(&self, _ctx: &RunContext, _from_agent: &str, _to_agent: &str) {}

    /// Called when an error ends the run.
    async fn on_error(&self, _ctx: &RunContext, _agent_name: &str, _error: &Error) {}
}

/// Per-agent lifecycle hooks.
///
/// Bound to a specific agent instance; only receives events for that agent,
/// so the agent name is implicit.
#[async_trait]
pub trait AgentHooks: Send + Sync {
    /// Called when this agent's segment begins.
    async fn on_start(&self, _ctx: &RunContext) {}

    /// Called after this agent produces the run's final output.
    async fn on_end(&self, _ctx: &RunContext, _output: &Value) {}

    /// Called just before invoking the model for this agent.
    async fn on_llm_start(
        &self,
        _ctx: &RunContext,
        _system_prompt: Option<&str>,
        _input: &[ResponseItem],
    ) {
    }

    /// Called immediately after the model returns a response for this agent.
    async fn on_llm_end(&self, _ctx: &RunContext, _response: &ModelResponse) {}

    /// Called immediately before a tool is invoked by this agent.
    async fn on_tool_start(&self, _ctx: &RunContext, _tool_name: &str) {}

    /// Called immediately after a tool completes for this agent.
    async fn on_tool_end(&self, _ctx: &RunContext, _tool_name: &str, _result: &str) {}

    /// Called when this agent hands off control to another agent.
    async fn on_handoff(&self, _ctx: &RunContext, _to_agent: &str) {}

    /// Called when an error ends the run during this agent's segment.
    async fn on_error(&self, _ctx: &RunContext, _error: &Error) {}
}
