//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use baton::prelude::*;
//! ```

pub use crate::agent::{
    Agent, Handoff, HandoffInputData, HandoffInputFilter, HandoffResolver, HandoffTarget,
    Instructions, NextStep, OutputSchema, ProcessedResponse, RunConfig, RunEvent, RunInput,
    RunResult, Runner, SingleStepResult, StreamedRunResult, ToolRunComputerAction,
    ToolRunFunction, ToolRunHandoff, ToolUseBehavior, ToolUseDecision, ToolsToFinalOutput,
};
pub use crate::callback::{
    AgentHooks, BoxedAgentHooks, BoxedRunHooks, NoopAgentHooks, NoopRunHooks, RunContext,
    RunHooks, SharedAgentHooks, SharedRunHooks,
};
pub use crate::computer::{
    Computer, ComputerAction, Environment, MouseButton, Point, SharedComputer,
};
pub use crate::error::{Error, ModelError, ModelErrorKind, Result, ToolError};
pub use crate::guardrail::{
    GuardrailOutput, InputGuardrail, InputGuardrailCheck, InputGuardrailResult, OutputGuardrail,
    OutputGuardrailCheck, OutputGuardrailResult,
};
pub use crate::items::{
    ContentPart, HandoffCallItem, HandoffOutputItem, MessageOutputItem, ModelResponse,
    ReasoningItem, ResponseItem, Role, RunItem, ToolCallItem, ToolCallOutputItem,
    text_message_outputs,
};
pub use crate::model::{
    Model, ModelEventStream, ModelRequest, ModelSettings, ModelTracing, SharedModel, ToolChoice,
};
pub use crate::stream::{ModelStreamEvent, ResponseAccumulator};
pub use crate::tool::{
    ComputerTool, FileSearchTool, FunctionTool, FunctionToolResult, SharedToolServer, Tool,
    ToolDefinition, ToolErrorFormatter, ToolHandler, ToolServer, WebSearchTool, stringify_output,
};
pub use crate::usage::Usage;
