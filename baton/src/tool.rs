//! Tools an agent can expose to the model.
//!
//! [`Tool`] is a closed sum type: function tools the engine executes itself,
//! the computer tool driven through the serial action executor, and hosted
//! tools the provider executes on its side (recorded here only for history
//! and accounting). Tool-server tools are flattened into function tools
//! whose handler forwards over the [`ToolServer`] protocol boundary.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::callback::RunContext;
use crate::computer::SharedComputer;
use crate::error::ToolError;
use crate::items::RunItem;

/// Descriptor of a callable tool, as presented to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// Human-readable description shown to the model.
    pub description: String,
    /// JSON Schema of the tool's parameters.
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a new tool definition.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Implements the body of a function tool.
///
/// Handlers must be safe to call concurrently with sibling tool
/// invocations; the engine fans out all function calls of a turn at once.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Invoke the tool with already-parsed JSON arguments.
    async fn invoke(&self, ctx: &RunContext, arguments: Value) -> Result<Value, ToolError>;
}

/// Formats a tool failure into the textual result shown to the model.
pub type ToolErrorFormatter = Arc<dyn Fn(&ToolError) -> String + Send + Sync>;

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ToolError>> + Send,
{
    async fn invoke(&self, _ctx: &RunContext, arguments: Value) -> Result<Value, ToolError> {
        (self.0)(arguments).await
    }
}

/// A tool executed by this engine via a [`ToolHandler`].
#[derive(Clone)]
pub struct FunctionTool {
    name: String,
    description: String,
    parameters: Value,
    handler: Arc<dyn ToolHandler>,
    on_error: Option<ToolErrorFormatter>,
}

impl FunctionTool {
    /// Create a function tool from a handler implementation.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        handler: impl ToolHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Arc::new(handler),
            on_error: None,
        }
    }

    /// Create a function tool from an async closure over the raw arguments.
    #[must_use]
    pub fn from_fn<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        f: F,
    ) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        Self::new(name, description, parameters, FnHandler(f))
    }

    /// Install an error-to-string fallback.
    ///
    /// When set, a failing invocation produces this textual tool result
    /// instead of aborting the turn.
    #[must_use]
    pub fn on_error(mut self, formatter: impl Fn(&ToolError) -> String + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(formatter));
        self
    }

    /// Install the default error fallback, which reports the failure text.
    #[must_use]
    pub fn on_error_default(self) -> Self {
        self.on_error(|err| format!("An error occurred while running the tool: {err}"))
    }

    /// The tool's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tool's description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The tool's parameter schema.
    #[must_use]
    pub const fn parameters(&self) -> &Value {
        &self.parameters
    }

    /// The configured error fallback, if any.
    #[must_use]
    pub(crate) fn error_formatter(&self) -> Option<&ToolErrorFormatter> {
        self.on_error.as_ref()
    }

    /// Invoke the tool body.
    pub(crate) async fn invoke(
        &self,
        ctx: &RunContext,
        arguments: Value,
    ) -> Result<Value, ToolError> {
        self.handler.invoke(ctx, arguments).await
    }

    /// The definition presented to the model.
    #[must_use]
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(&self.name, &self.description, self.parameters.clone())
    }
}

impl fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("on_error", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}

/// The computer-use tool backed by one shared [`Computer`](crate::computer::Computer) surface.
#[derive(Clone)]
pub struct ComputerTool {
    computer: SharedComputer,
}

impl ComputerTool {
    /// Name under which the computer tool is exposed.
    pub const NAME: &'static str = "computer_use";

    /// Create a computer tool over a shared surface.
    #[must_use]
    pub fn new(computer: SharedComputer) -> Self {
        Self { computer }
    }

    /// The backing surface.
    #[must_use]
    pub fn computer(&self) -> &SharedComputer {
        &self.computer
    }

    /// The definition presented to the model.
    #[must_use]
    pub fn definition(&self) -> ToolDefinition {
        let (width, height) = self.computer.dimensions();
        ToolDefinition::new(
            Self::NAME,
            "Control a computer surface with mouse, keyboard, and screenshots.",
            serde_json::json!({
                "type": "object",
                "display_width": width,
                "display_height": height,
                "environment": self.computer.environment(),
            }),
        )
    }
}

impl fmt::Debug for ComputerTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (width, height) = self.computer.dimensions();
        f.debug_struct("ComputerTool")
            .field("environment", &self.computer.environment())
            .field("dimensions", &(width, height))
            .finish_non_exhaustive()
    }
}

/// A provider-hosted file search tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSearchTool {
    /// Vector store ids to search.
    pub vector_store_ids: Vec<String>,
    /// Maximum number of results, when limited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_num_results: Option<u32>,
}

impl FileSearchTool {
    /// Name under which file search is exposed.
    pub const NAME: &'static str = "file_search";
}

/// A provider-hosted web search tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSearchTool {
    /// Approximate user location hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_location: Option<String>,
}

impl WebSearchTool {
    /// Name under which web search is exposed.
    pub const NAME: &'static str = "web_search";
}

/// A tool available to an agent.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Tool {
    /// A function tool executed by this engine.
    Function(FunctionTool),
    /// The computer-use tool, executed serially against a shared surface.
    Computer(ComputerTool),
    /// Provider-hosted file search.
    FileSearch(FileSearchTool),
    /// Provider-hosted web search.
    WebSearch(WebSearchTool),
}

impl Tool {
    /// The tool's name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Function(tool) => tool.name(),
            Self::Computer(_) => ComputerTool::NAME,
            Self::FileSearch(_) => FileSearchTool::NAME,
            Self::WebSearch(_) => WebSearchTool::NAME,
        }
    }

    /// The definition presented to the model.
    #[must_use]
    pub fn definition(&self) -> ToolDefinition {
        match self {
            Self::Function(tool) => tool.definition(),
            Self::Computer(tool) => tool.definition(),
            Self::FileSearch(tool) => ToolDefinition::new(
                FileSearchTool::NAME,
                "Search the configured vector stores.",
                serde_json::to_value(tool).unwrap_or_else(|_| serde_json::json!({})),
            ),
            Self::WebSearch(tool) => ToolDefinition::new(
                WebSearchTool::NAME,
                "Search the web.",
                serde_json::to_value(tool).unwrap_or_else(|_| serde_json::json!({})),
            ),
        }
    }
}

impl From<FunctionTool> for Tool {
    fn from(tool: FunctionTool) -> Self {
        Self::Function(tool)
    }
}

impl From<ComputerTool> for Tool {
    fn from(tool: ComputerTool) -> Self {
        Self::Computer(tool)
    }
}

/// An external server exposing callable tools over a narrow protocol.
///
/// The engine lists a server's tools once per turn and flattens them into
/// the agent's tool list; call failures surface as ordinary
/// [`ToolError`]s.
#[async_trait]
pub trait ToolServer: Send + Sync {
    /// The server's display name, used in logging.
    fn name(&self) -> &str;

    /// List the tools this server currently exposes.
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>, ToolError>;

    /// Invoke a tool by name.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, ToolError>;
}

/// A shared, thread-safe [`ToolServer`] trait object.
pub type SharedToolServer = Arc<dyn ToolServer>;

/// Forwards invocations of one server-exposed tool over the protocol.
pub(crate) struct ServerToolHandler {
    pub(crate) server: SharedToolServer,
    pub(crate) tool: String,
}

#[async_trait]
impl ToolHandler for ServerToolHandler {
    async fn invoke(&self, _ctx: &RunContext, arguments: Value) -> Result<Value, ToolError> {
        self.server.call_tool(&self.tool, arguments).await
    }
}

/// The outcome of one executed function-tool call.
///
/// Results correlate positionally 1:1 with the calls that produced them.
/// The native output value is retained for tool-use-policy decisions; the
/// conversation history carries its stringified form.
#[derive(Debug, Clone)]
pub struct FunctionToolResult {
    /// Name of the tool that ran.
    pub tool_name: String,
    /// The tool's native output value.
    pub output: Value,
    /// The run item appended to the conversation for this result.
    pub item: RunItem,
}

/// Render a tool's native output for inclusion in conversation history.
#[must_use]
pub fn stringify_output(output: &Value) -> String {
    match output {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
