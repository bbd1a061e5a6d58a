//! Agent module — the turn-based execution engine and its configuration.
//!
//! This module implements a **Runner-driven** architecture:
//!
//! - **[`Agent`]** is a pure configuration value: name, instructions, tools,
//!   delegation targets, output contract, tool-use policy. It contains no
//!   execution logic and is never mutated during a run.
//! - **[`Runner`]** is a stateless execution engine that drives an agent
//!   through the turn loop (model call → classify → execute side effects →
//!   decide next step) until a final output, a handoff continues the run
//!   under another agent, or the turn budget is exhausted.
//! - **[`Handoff`]** transfers the remainder of a conversation to a
//!   different agent, optionally rewriting the carried-forward history
//!   through an input filter.
//!
//! Two entry points with identical semantics: [`Runner::run`] returns one
//! aggregate [`RunResult`]; [`Runner::run_streamed`] returns a
//! [`StreamedRunResult`] that publishes every decision as an ordered
//! [`RunEvent`] while converging on the same terminal state.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use baton::prelude::*;
//!
//! let agent = Agent::new("assistant")
//!     .instructions("You are a helpful assistant.")
//!     .model(provider.clone());
//!
//! let result = Runner::run(&agent, "Hello!", RunConfig::default()).await?;
//! println!("{}", result.final_output_text());
//! ```
//!
//! # Delegation
//!
//! ```rust,ignore
//! let billing = Arc::new(Agent::new("billing")
//!     .instructions("You resolve billing questions.")
//!     .model(provider.clone()));
//!
//! let triage = Arc::new(Agent::new("triage")
//!     .instructions("Route the user to the right specialist.")
//!     .model(provider.clone())
//!     .handoff(Handoff::new(billing)));
//!
//! // The triage model can call `transfer_to_billing`; the run continues
//! // under the billing agent with the same conversation history.
//! let result = Runner::run(&triage, "I was double charged", RunConfig::default()).await?;
//! ```

mod config;
mod executor;
mod handoff;
mod processor;
mod result;
mod runner;
mod streaming;

pub use config::{
    Agent, Instructions, OutputSchema, ToolUseBehavior, ToolUseDecision, ToolsToFinalOutput,
};
pub use handoff::{Handoff, HandoffInputData, HandoffInputFilter, HandoffResolver, HandoffTarget};
pub use processor::{ProcessedResponse, ToolRunComputerAction, ToolRunFunction, ToolRunHandoff};
pub use result::{NextStep, RunConfig, RunInput, RunResult, SingleStepResult};
pub use runner::Runner;
pub use streaming::{RunEvent, StreamedRunResult};
