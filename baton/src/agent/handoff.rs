//! Handoffs — delegation of a conversation to another agent.
//!
//! A handoff is presented to the model as a function tool (named
//! `transfer_to_<agent>` by default). When the model calls it, the engine
//! resolves the target agent, appends an acknowledgement item for the
//! model, optionally rewrites the carried-forward history through an input
//! filter, and continues the run under the new agent.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::callback::RunContext;
use crate::error::{Error, Result};
use crate::items::{ResponseItem, RunItem};
use crate::tool::ToolDefinition;

use super::config::Agent;

/// The conversation state passed through a handoff input filter.
///
/// A filter receives the full tuple and returns a same-shaped rewritten
/// tuple; the signature enforces the shape.
#[derive(Debug, Clone)]
pub struct HandoffInputData {
    /// The run's input history as of the handoff.
    pub input_history: Vec<ResponseItem>,
    /// Items generated before the turn the handoff happened in.
    pub pre_handoff_items: Vec<RunItem>,
    /// Items generated during the turn the handoff happened in.
    pub new_items: Vec<RunItem>,
}

/// Rewrites the conversation carried into the next agent.
pub type HandoffInputFilter = Arc<dyn Fn(HandoffInputData) -> HandoffInputData + Send + Sync>;

/// Resolves a handoff's target agent at invocation time.
///
/// Receives the run context and the raw argument payload the model supplied
/// (already parsed as JSON, `None` when the handoff declares no input).
#[async_trait]
pub trait HandoffResolver: Send + Sync {
    /// Resolve the agent the conversation transfers to.
    async fn resolve(&self, ctx: &RunContext, input: Option<Value>) -> Result<Arc<Agent>>;
}

/// Where a handoff transfers control to.
#[derive(Clone)]
#[non_exhaustive]
pub enum HandoffTarget {
    /// A fixed target agent.
    Static(Arc<Agent>),
    /// A target resolved at invocation time.
    Dynamic {
        /// Name of the target, for the default tool name and tracing.
        agent_name: String,
        /// The resolver invoked with the context and argument payload.
        resolver: Arc<dyn HandoffResolver>,
    },
}

impl fmt::Debug for HandoffTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(agent) => f.debug_tuple("Static").field(&agent.name()).finish(),
            Self::Dynamic { agent_name, .. } => {
                f.debug_tuple("Dynamic").field(agent_name).finish()
            }
        }
    }
}

/// A delegation target: a request, expressed as a tool call, to transfer
/// the remainder of the conversation to a different agent.
#[derive(Clone)]
pub struct Handoff {
    tool_name: String,
    tool_description: String,
    input_schema: Option<Value>,
    input_filter: Option<HandoffInputFilter>,
    target: HandoffTarget,
}

impl Handoff {
    /// Create a handoff to a fixed agent with default naming.
    #[must_use]
    pub fn new(agent: Arc<Agent>) -> Self {
        let tool_name = Self::default_tool_name(agent.name());
        let tool_description = Self::default_tool_description(&agent);
        Self {
            tool_name,
            tool_description,
            input_schema: None,
            input_filter: None,
            target: HandoffTarget::Static(agent),
        }
    }

    /// Create a handoff whose target is resolved at invocation time.
    #[must_use]
    pub fn dynamic(agent_name: impl Into<String>, resolver: impl HandoffResolver + 'static) -> Self {
        let agent_name = agent_name.into();
        Self {
            tool_name: Self::default_tool_name(&agent_name),
            tool_description: format!("Handoff to the {agent_name} agent."),
            input_schema: None,
            input_filter: None,
            target: HandoffTarget::Dynamic {
                agent_name,
                resolver: Arc::new(resolver),
            },
        }
    }

    /// The default tool name for a handoff target: `transfer_to_<agent>`.
    #[must_use]
    pub fn default_tool_name(agent_name: &str) -> String {
        let mut slug = String::with_capacity(agent_name.len());
        for c in agent_name.chars() {
            if c.is_ascii_alphanumeric() {
                slug.extend(c.to_lowercase());
            } else if !slug.ends_with('_') {
                slug.push('_');
            }
        }
        format!("transfer_to_{}", slug.trim_matches('_'))
    }

    fn default_tool_description(agent: &Arc<Agent>) -> String {
        match agent.get_handoff_description() {
            Some(description) => {
                format!("Handoff to the {} agent. {description}", agent.name())
            }
            None => format!("Handoff to the {} agent.", agent.name()),
        }
    }

    /// Override the tool name.
    #[must_use]
    pub fn tool_name(mut self, name: impl Into<String>) -> Self {
        self.tool_name = name.into();
        self
    }

    /// Override the tool description.
    #[must_use]
    pub fn tool_description(mut self, description: impl Into<String>) -> Self {
        self.tool_description = description.into();
        self
    }

    /// Declare an input schema the model must satisfy when calling this
    /// handoff. With a schema declared, a call without arguments is a
    /// [`Error::ModelBehavior`].
    #[must_use]
    pub fn input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    /// Install an input filter that rewrites the conversation carried into
    /// the target agent. Takes precedence over the run-wide default filter.
    #[must_use]
    pub fn input_filter(
        mut self,
        filter: impl Fn(HandoffInputData) -> HandoffInputData + Send + Sync + 'static,
    ) -> Self {
        self.input_filter = Some(Arc::new(filter));
        self
    }

    /// The tool name this handoff is exposed under.
    #[must_use]
    pub fn get_tool_name(&self) -> &str {
        &self.tool_name
    }

    /// The name of the target agent.
    #[must_use]
    pub fn agent_name(&self) -> &str {
        match &self.target {
            HandoffTarget::Static(agent) => agent.name(),
            HandoffTarget::Dynamic { agent_name, .. } => agent_name,
        }
    }

    /// The configured input filter, if any.
    #[must_use]
    pub fn get_input_filter(&self) -> Option<&HandoffInputFilter> {
        self.input_filter.as_ref()
    }

    /// The definition presented to the model.
    #[must_use]
    pub fn definition(&self) -> ToolDefinition {
        let parameters = self.input_schema.clone().unwrap_or_else(|| {
            serde_json::json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            })
        });
        ToolDefinition::new(&self.tool_name, &self.tool_description, parameters)
    }

    /// Resolve the target agent for an invocation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelBehavior`] when the argument payload is not
    /// valid JSON, or when this handoff declares an input schema and the
    /// model supplied no payload.
    pub async fn invoke(&self, ctx: &RunContext, arguments: &str) -> Result<Arc<Agent>> {
        let trimmed = arguments.trim();
        let payload: Option<Value> = if trimmed.is_empty() || trimmed == "null" || trimmed == "{}" {
            None
        } else {
            Some(serde_json::from_str(trimmed).map_err(|e| {
                Error::model_behavior(format!(
                    "invalid JSON arguments for handoff '{}': {e}",
                    self.tool_name
                ))
            })?)
        };

        if self.input_schema.is_some() && payload.is_none() {
            return Err(Error::model_behavior(format!(
                "handoff '{}' requires input but the model provided none",
                self.tool_name
            )));
        }

        match &self.target {
            HandoffTarget::Static(agent) => Ok(Arc::clone(agent)),
            HandoffTarget::Dynamic { resolver, .. } => resolver.resolve(ctx, payload).await,
        }
    }
}

impl fmt::Debug for Handoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handoff")
            .field("tool_name", &self.tool_name)
            .field("target", &self.target)
            .field("input_schema", &self.input_schema.is_some())
            .field("input_filter", &self.input_filter.is_some())
            .finish_non_exhaustive()
    }
}

impl From<Arc<Agent>> for Handoff {
    fn from(agent: Arc<Agent>) -> Self {
        Self::new(agent)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod naming {
        use super::*;

        #[test]
        fn default_tool_name_snake_cases() {
            assert_eq!(
                Handoff::default_tool_name("Billing Agent"),
                "transfer_to_billing_agent"
            );
            assert_eq!(Handoff::default_tool_name("triage"), "transfer_to_triage");
            assert_eq!(
                Handoff::default_tool_name("FAQ-bot v2"),
                "transfer_to_faq_bot_v2"
            );
        }

        #[test]
        fn description_includes_handoff_description() {
            let agent = Arc::new(
                Agent::new("billing").handoff_description("Handles refunds and invoices."),
            );
            let handoff = Handoff::new(agent);
            assert!(handoff.definition().description.contains("refunds"));
        }
    }

    mod invoke {
        use super::*;

        #[tokio::test]
        async fn static_target_resolves_without_payload() {
            let agent = Arc::new(Agent::new("billing"));
            let handoff = Handoff::new(Arc::clone(&agent));
            let ctx = RunContext::new();

            let resolved = handoff.invoke(&ctx, "").await.unwrap();
            assert_eq!(resolved.name(), "billing");

            let resolved = handoff.invoke(&ctx, "null").await.unwrap();
            assert_eq!(resolved.name(), "billing");
        }

        #[tokio::test]
        async fn missing_payload_with_schema_is_model_behavior() {
            let agent = Arc::new(Agent::new("billing"));
            let handoff = Handoff::new(agent).input_schema(serde_json::json!({
                "type": "object",
                "properties": { "reason": { "type": "string" } },
                "required": ["reason"]
            }));
            let ctx = RunContext::new();

            let err = handoff.invoke(&ctx, "").await.unwrap_err();
            assert!(matches!(err, Error::ModelBehavior(_)));
        }

        #[tokio::test]
        async fn invalid_json_payload_is_model_behavior() {
            let agent = Arc::new(Agent::new("billing"));
            let handoff = Handoff::new(agent);
            let ctx = RunContext::new();

            let err = handoff.invoke(&ctx, "{not json").await.unwrap_err();
            assert!(matches!(err, Error::ModelBehavior(_)));
        }

        #[tokio::test]
        async fn dynamic_target_sees_payload() {
            struct PickByTier;

            #[async_trait]
            impl HandoffResolver for PickByTier {
                async fn resolve(
                    &self,
                    _ctx: &RunContext,
                    input: Option<Value>,
                ) -> Result<Arc<Agent>> {
                    let tier = input
                        .as_ref()
                        .and_then(|v| v.get("tier"))
                        .and_then(Value::as_str)
                        .unwrap_or("standard");
                    Ok(Arc::new(Agent::new(format!("support-{tier}"))))
                }
            }

            let handoff = Handoff::dynamic("support", PickByTier).input_schema(
                serde_json::json!({
                    "type": "object",
                    "properties": { "tier": { "type": "string" } },
                    "required": ["tier"]
                }),
            );
            let ctx = RunContext::new();

            let resolved = handoff
                .invoke(&ctx, r#"{"tier": "premium"}"#)
                .await
                .unwrap();
            assert_eq!(resolved.name(), "support-premium");
        }
    }

    mod filters {
        use super::*;

        #[test]
        fn filter_precedence_is_observable() {
            let agent = Arc::new(Agent::new("billing"));
            let plain = Handoff::new(Arc::clone(&agent));
            assert!(plain.get_input_filter().is_none());

            let filtered = Handoff::new(agent).input_filter(|mut data| {
                data.new_items.clear();
                data
            });
            assert!(filtered.get_input_filter().is_some());
        }
    }
}
