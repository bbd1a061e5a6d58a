//! The per-run context threaded through the engine.

use serde_json::Value;

use crate::usage::Usage;

/// Mutable state owned by one run and visible to hooks, guardrails, tools,
/// and dynamic instructions.
///
/// # Design
///
/// - **Single writer**: no concurrent turns exist, so the engine mutates
///   the context from exactly one turn at a time; observers receive
///   `&RunContext` and cannot alter the execution flow.
/// - **Cumulative usage**: every model response's usage is added exactly
///   once per turn, from both the buffered and streaming paths.
/// - **Caller context**: an opaque JSON value supplied through the run
///   configuration, for sharing data with tools and checks.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    usage: Usage,
    turn: usize,
    agent_name: Option<String>,
    context: Value,
}

impl RunContext {
    /// Create a new empty run context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the active agent name.
    #[must_use]
    pub fn with_agent_name(mut self, name: impl Into<String>) -> Self {
        self.agent_name = Some(name.into());
        self
    }

    /// Set the caller's context value.
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    /// Get the cumulative token usage.
    #[must_use]
    pub const fn usage(&self) -> &Usage {
        &self.usage
    }

    /// Get the current turn number (1-indexed during execution, 0 before).
    #[must_use]
    pub const fn turn(&self) -> usize {
        self.turn
    }

    /// Get the active agent name, if set.
    #[must_use]
    pub fn agent_name(&self) -> Option<&str> {
        self.agent_name.as_deref()
    }

    /// Get the caller's context value.
    #[must_use]
    pub const fn context(&self) -> &Value {
        &self.context
    }

    /// Add a model response's usage to the running total.
    pub const fn add_usage(&mut self, usage: Usage) {
        self.usage.add(&usage);
    }

    /// Advance to the next turn.
    pub const fn advance_turn(&mut self) {
        self.turn += 1;
    }

    /// Update the active agent name.
    pub fn set_agent_name(&mut self, name: impl Into<String>) {
        self.agent_name = Some(name.into());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod construction {
        use super::*;

        #[test]
        fn new_creates_empty_context() {
            let ctx = RunContext::new();
            assert_eq!(ctx.turn(), 0);
            assert!(ctx.agent_name().is_none());
            assert!(ctx.usage().is_empty());
            assert_eq!(ctx.context(), &Value::Null);
        }

        #[test]
        fn builder_chain() {
            let ctx = RunContext::new()
                .with_agent_name("triage")
                .with_context(serde_json::json!({"user_id": 7}));

            assert_eq!(ctx.agent_name(), Some("triage"));
            assert_eq!(ctx.context()["user_id"], 7);
        }
    }

    mod mutation {
        use super::*;

        #[test]
        fn add_usage_accumulates() {
            let mut ctx = RunContext::new();
            ctx.add_usage(Usage::new(100, 50));
            ctx.add_usage(Usage::new(200, 100));
            assert_eq!(ctx.usage().requests, 2);
            assert_eq!(ctx.usage().total_tokens, 450);
        }

        #[test]
        fn advance_turn_increments() {
            let mut ctx = RunContext::new();
            ctx.advance_turn();
            ctx.advance_turn();
            assert_eq!(ctx.turn(), 2);
        }

        #[test]
        fn set_agent_name_updates() {
            let mut ctx = RunContext::new().with_agent_name("old");
            ctx.set_agent_name("new");
            assert_eq!(ctx.agent_name(), Some("new"));
        }
    }
}
