//! Agent configuration types.
//!
//! The [`Agent`] struct defines an agent's identity, behavior, and
//! capabilities. It is read-only during a run; "modifying" an agent means
//! cloning it and overriding fields through the same consuming builder
//! methods used at construction time.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::callback::{RunContext, SharedAgentHooks};
use crate::error::{Error, Result, ToolError};
use crate::guardrail::{InputGuardrail, OutputGuardrail};
use crate::model::{ModelSettings, SharedModel};
use crate::tool::{
    ComputerTool, FunctionTool, FunctionToolResult, SharedToolServer, Tool, ToolHandler,
};

use super::handoff::Handoff;
use super::result::RunConfig;
use super::runner::Runner;

/// Instructions that guide the agent's behavior.
///
/// Either a static string set at construction time, or a closure over the
/// run context, resolved fresh at every turn.
#[derive(Clone)]
pub enum Instructions {
    /// Static instruction string.
    Static(String),
    /// Dynamic instruction generator over the current run context.
    Dynamic(Arc<dyn Fn(&RunContext) -> String + Send + Sync>),
}

impl Instructions {
    /// Resolve the instructions for the current run context.
    ///
    /// Empty instructions resolve to `None` so no system message is sent.
    #[must_use]
    pub fn resolve(&self, ctx: &RunContext) -> Option<String> {
        let text = match self {
            Self::Static(s) => s.clone(),
            Self::Dynamic(f) => f(ctx),
        };
        (!text.is_empty()).then_some(text)
    }
}

impl fmt::Debug for Instructions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(s) => f.debug_tuple("Static").field(s).finish(),
            Self::Dynamic(_) => f.debug_tuple("Dynamic").field(&"<closure>").finish(),
        }
    }
}

impl<S: Into<String>> From<S> for Instructions {
    fn from(s: S) -> Self {
        Self::Static(s.into())
    }
}

/// Schema specification for structured agent output.
///
/// When set on an [`Agent`], every model request carries the schema as the
/// output contract, and the final message text is parsed as JSON before it
/// becomes the run's final output.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    name: String,
    schema: Value,
    strict: bool,
}

impl OutputSchema {
    /// Creates a new output schema with strict mode enabled (recommended).
    #[must_use]
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
            strict: true,
        }
    }

    /// Creates a new output schema with strict mode explicitly set.
    #[must_use]
    pub fn with_strict(name: impl Into<String>, schema: Value, strict: bool) -> Self {
        Self {
            name: name.into(),
            schema,
            strict,
        }
    }

    /// Creates an output schema by generating JSON Schema from a Rust type.
    ///
    /// The type must derive [`schemars::JsonSchema`]. The schema name is the
    /// type name.
    #[must_use]
    pub fn from_type<T: schemars::JsonSchema>() -> Self {
        let root = schemars::schema_for!(T);
        let mut schema_value = serde_json::to_value(&root).unwrap_or_default();

        // The $schema meta field is noise for model providers.
        if let Value::Object(ref mut map) = schema_value {
            map.remove("$schema");
        }

        let name = <T as schemars::JsonSchema>::schema_name();
        Self {
            name: name.into_owned(),
            schema: schema_value,
            strict: true,
        }
    }

    /// Returns the schema name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the JSON Schema definition.
    #[must_use]
    pub const fn schema(&self) -> &Value {
        &self.schema
    }

    /// Returns whether strict mode is enabled.
    #[must_use]
    pub const fn is_strict(&self) -> bool {
        self.strict
    }

    /// Parse final message text against this contract.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelBehavior`] if the text is not valid JSON — the
    /// model violated its declared output contract.
    pub fn validate(&self, text: &str) -> Result<Value> {
        serde_json::from_str(text).map_err(|e| {
            Error::model_behavior(format!(
                "final output did not match the '{}' schema: {e}",
                self.name
            ))
        })
    }
}

/// The outcome of a custom tool-use decision.
#[derive(Debug, Clone)]
pub struct ToolsToFinalOutput {
    /// Whether the tool results constitute the run's final output.
    pub is_final_output: bool,
    /// The final output value, required when `is_final_output` is `true`.
    pub final_output: Option<Value>,
}

impl ToolsToFinalOutput {
    /// The run should continue with another model turn.
    #[must_use]
    pub const fn run_again() -> Self {
        Self {
            is_final_output: false,
            final_output: None,
        }
    }

    /// The given value is the run's final output.
    #[must_use]
    pub const fn done(final_output: Value) -> Self {
        Self {
            is_final_output: true,
            final_output: Some(final_output),
        }
    }
}

/// A custom decision function over a turn's tool results.
#[async_trait]
pub trait ToolUseDecision: Send + Sync {
    /// Decide whether the given tool results end the run.
    async fn decide(
        &self,
        ctx: &RunContext,
        results: &[FunctionToolResult],
    ) -> Result<ToolsToFinalOutput>;
}

/// The rule deciding whether tool results alone constitute the run's final
/// output.
#[derive(Clone, Default)]
#[non_exhaustive]
pub enum ToolUseBehavior {
    /// Always let the model respond again after tools run.
    #[default]
    RunLlmAgain,
    /// Treat the first tool's output as the final answer.
    StopOnFirstTool,
    /// Stop early if any of the named tools is called; that tool's output
    /// is the final answer.
    StopAtTools(Vec<String>),
    /// A custom decision function over the turn's tool results.
    Custom(Arc<dyn ToolUseDecision>),
}

impl fmt::Debug for ToolUseBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunLlmAgain => f.write_str("RunLlmAgain"),
            Self::StopOnFirstTool => f.write_str("StopOnFirstTool"),
            Self::StopAtTools(names) => f.debug_tuple("StopAtTools").field(names).finish(),
            Self::Custom(_) => f.debug_tuple("Custom").field(&"<decision>").finish(),
        }
    }
}

/// A pure configuration value defining an AI agent.
///
/// `Agent` describes *what* the agent is and *what* it can do; the
/// [`Runner`](super::Runner) decides *how* it runs. Agents are held as
/// `Arc<Agent>` during execution and never mutated in place — clone and
/// override instead:
///
/// ```rust,ignore
/// let pirate = base_agent.clone().instructions("Talk like a pirate.");
/// ```
#[derive(Clone)]
pub struct Agent {
    name: String,
    instructions: Instructions,
    handoff_description: Option<String>,
    model: Option<SharedModel>,
    model_settings: ModelSettings,
    tools: Vec<Tool>,
    tool_servers: Vec<SharedToolServer>,
    handoffs: Vec<Handoff>,
    output_schema: Option<OutputSchema>,
    tool_use_behavior: ToolUseBehavior,
    reset_tool_choice: bool,
    input_guardrails: Vec<InputGuardrail>,
    output_guardrails: Vec<OutputGuardrail>,
    hooks: Option<SharedAgentHooks>,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("instructions", &self.instructions)
            .field("model", &self.model.is_some())
            .field(
                "tools",
                &self.tools.iter().map(Tool::name).collect::<Vec<_>>(),
            )
            .field(
                "handoffs",
                &self
                    .handoffs
                    .iter()
                    .map(Handoff::agent_name)
                    .collect::<Vec<_>>(),
            )
            .field("output_schema", &self.output_schema.as_ref().map(OutputSchema::name))
            .field("tool_use_behavior", &self.tool_use_behavior)
            .field("reset_tool_choice", &self.reset_tool_choice)
            .field("input_guardrails", &self.input_guardrails)
            .field("output_guardrails", &self.output_guardrails)
            .field("hooks", &self.hooks.is_some())
            .finish()
    }
}

impl Agent {
    /// Create a new agent with the given name and sensible defaults.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: Instructions::Static(String::new()),
            handoff_description: None,
            model: None,
            model_settings: ModelSettings::default(),
            tools: Vec::new(),
            tool_servers: Vec::new(),
            handoffs: Vec::new(),
            output_schema: None,
            tool_use_behavior: ToolUseBehavior::RunLlmAgain,
            reset_tool_choice: true,
            input_guardrails: Vec::new(),
            output_guardrails: Vec::new(),
            hooks: None,
        }
    }

    /// Set the system instructions (static string).
    #[must_use]
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Instructions::Static(instructions.into());
        self
    }

    /// Set dynamic instructions resolved from the run context at each turn.
    #[must_use]
    pub fn dynamic_instructions<F>(mut self, f: F) -> Self
    where
        F: Fn(&RunContext) -> String + Send + Sync + 'static,
    {
        self.instructions = Instructions::Dynamic(Arc::new(f));
        self
    }

    /// Set the description shown to other agents that hand off to this one.
    #[must_use]
    pub fn handoff_description(mut self, description: impl Into<String>) -> Self {
        self.handoff_description = Some(description.into());
        self
    }

    /// Set the model used for this agent's turns.
    #[must_use]
    pub fn model(mut self, model: SharedModel) -> Self {
        self.model = Some(model);
        self
    }

    /// Set the agent's default model settings.
    #[must_use]
    pub fn model_settings(mut self, settings: ModelSettings) -> Self {
        self.model_settings = settings;
        self
    }

    /// Add a tool to this agent.
    #[must_use]
    pub fn tool(mut self, tool: impl Into<Tool>) -> Self {
        self.tools.push(tool.into());
        self
    }

    /// Set all tools for this agent.
    #[must_use]
    pub fn tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = tools;
        self
    }

    /// Add an external tool server whose tools are flattened into this
    /// agent's tool list at every turn.
    #[must_use]
    pub fn tool_server(mut self, server: SharedToolServer) -> Self {
        self.tool_servers.push(server);
        self
    }

    /// Add a delegation target.
    #[must_use]
    pub fn handoff(mut self, handoff: impl Into<Handoff>) -> Self {
        self.handoffs.push(handoff.into());
        self
    }

    /// Set all delegation targets.
    #[must_use]
    pub fn handoffs(mut self, handoffs: Vec<Handoff>) -> Self {
        self.handoffs = handoffs;
        self
    }

    /// Set the structured output contract.
    #[must_use]
    pub fn output_schema(mut self, schema: OutputSchema) -> Self {
        self.output_schema = Some(schema);
        self
    }

    /// Set structured output by inferring the JSON Schema from a Rust type.
    ///
    /// The generated output can be deserialized with
    /// [`RunResult::parse`](super::RunResult::parse).
    #[must_use]
    pub fn output_type<T: schemars::JsonSchema>(self) -> Self {
        self.output_schema(OutputSchema::from_type::<T>())
    }

    /// Set the tool-use policy.
    #[must_use]
    pub fn tool_use_behavior(mut self, behavior: ToolUseBehavior) -> Self {
        self.tool_use_behavior = behavior;
        self
    }

    /// Set whether a forced tool choice is reset to auto after tools run.
    ///
    /// Defaults to `true`, which prevents forced-tool infinite loops.
    #[must_use]
    pub const fn reset_tool_choice(mut self, reset: bool) -> Self {
        self.reset_tool_choice = reset;
        self
    }

    /// Add an input guardrail, run once before the first turn when this is
    /// the starting agent.
    #[must_use]
    pub fn input_guardrail(mut self, guardrail: InputGuardrail) -> Self {
        self.input_guardrails.push(guardrail);
        self
    }

    /// Add an output guardrail, run once against this agent's final output.
    #[must_use]
    pub fn output_guardrail(mut self, guardrail: OutputGuardrail) -> Self {
        self.output_guardrails.push(guardrail);
        self
    }

    /// Set per-agent lifecycle hooks.
    #[must_use]
    pub fn hooks(mut self, hooks: SharedAgentHooks) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Returns the agent's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the handoff description, if set.
    #[must_use]
    pub fn get_handoff_description(&self) -> Option<&str> {
        self.handoff_description.as_deref()
    }

    /// Resolve the system instructions for the current run context.
    #[must_use]
    pub fn resolve_instructions(&self, ctx: &RunContext) -> Option<String> {
        self.instructions.resolve(ctx)
    }

    /// Returns the raw instructions value.
    #[must_use]
    pub const fn get_instructions(&self) -> &Instructions {
        &self.instructions
    }

    /// Returns the agent's model, if configured.
    #[must_use]
    pub const fn get_model(&self) -> Option<&SharedModel> {
        self.model.as_ref()
    }

    /// Returns the agent's default model settings.
    #[must_use]
    pub const fn get_model_settings(&self) -> &ModelSettings {
        &self.model_settings
    }

    /// Returns the agent's own tools (tool-server tools not included).
    #[must_use]
    pub fn get_tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Returns the agent's tool servers.
    #[must_use]
    pub fn get_tool_servers(&self) -> &[SharedToolServer] {
        &self.tool_servers
    }

    /// Returns the agent's delegation targets.
    #[must_use]
    pub fn get_handoffs(&self) -> &[Handoff] {
        &self.handoffs
    }

    /// Returns the structured output contract, if declared.
    #[must_use]
    pub const fn get_output_schema(&self) -> Option<&OutputSchema> {
        self.output_schema.as_ref()
    }

    /// Returns the tool-use policy.
    #[must_use]
    pub const fn get_tool_use_behavior(&self) -> &ToolUseBehavior {
        &self.tool_use_behavior
    }

    /// Returns whether forced tool choices reset to auto after tools run.
    #[must_use]
    pub const fn resets_tool_choice(&self) -> bool {
        self.reset_tool_choice
    }

    /// Returns the agent's input guardrails.
    #[must_use]
    pub fn get_input_guardrails(&self) -> &[InputGuardrail] {
        &self.input_guardrails
    }

    /// Returns the agent's output guardrails.
    #[must_use]
    pub fn get_output_guardrails(&self) -> &[OutputGuardrail] {
        &self.output_guardrails
    }

    /// Returns the per-agent hooks as a trait object, if configured.
    #[must_use]
    pub fn get_hooks(&self) -> Option<&dyn crate::callback::AgentHooks> {
        self.hooks.as_deref()
    }

    /// Wrap this agent as a function tool that runs it to completion and
    /// returns its textual final output.
    ///
    /// Unlike a handoff, the caller keeps control of the conversation; the
    /// sub-agent only sees the delegated input.
    #[must_use]
    pub fn into_tool(
        self: Arc<Self>,
        tool_name: impl Into<String>,
        tool_description: impl Into<String>,
    ) -> Tool {
        Tool::Function(FunctionTool::new(
            tool_name,
            tool_description,
            serde_json::json!({
                "type": "object",
                "properties": {
                    "input": {
                        "type": "string",
                        "description": "The task to delegate to this agent."
                    }
                },
                "required": ["input"],
                "additionalProperties": false
            }),
            AgentToolHandler { agent: self },
        ))
    }
}

struct AgentToolHandler {
    agent: Arc<Agent>,
}

#[async_trait]
impl ToolHandler for AgentToolHandler {
    async fn invoke(
        &self,
        _ctx: &RunContext,
        arguments: Value,
    ) -> std::result::Result<Value, ToolError> {
        let input = arguments
            .get("input")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::invalid_args("missing field 'input'"))?
            .to_string();

        let result = Runner::run(&self.agent, input, RunConfig::default())
            .await
            .map_err(|e| ToolError::execution(e.to_string()))?;
        Ok(Value::String(result.final_output_text()))
    }
}

/// Find the computer tool among a resolved tool list, if any.
pub(crate) fn find_computer_tool(tools: &[Tool]) -> Option<&ComputerTool> {
    tools.iter().find_map(|tool| match tool {
        Tool::Computer(computer) => Some(computer),
        _ => None,
    })
}
