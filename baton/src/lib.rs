//! Baton — a turn-based execution engine for tool-using, delegating AI
//! agents.
//!
//! An [`Agent`](agent::Agent) bundles instructions, tools, and delegation
//! targets; the [`Runner`](agent::Runner) drives it through repeated model
//! invocations until a final output, a handoff to another agent, or a turn
//! budget is reached. Within a turn, function-tool calls and guardrail
//! checks fan out concurrently while computer actions stay strictly
//! serial; two entry points — buffered [`Runner::run`](agent::Runner::run)
//! and streaming [`Runner::run_streamed`](agent::Runner::run_streamed) —
//! make identical decisions, the latter publishing every step as an
//! ordered event sequence.
//!
//! Model providers, tool servers, and computer surfaces are consumed
//! through narrow traits ([`model::Model`], [`tool::ToolServer`],
//! [`computer::Computer`]); this crate implements the engine, not the
//! wire protocols.

pub mod agent;
pub mod callback;
pub mod computer;
pub mod error;
pub mod guardrail;
pub mod items;
pub mod model;
pub mod prelude;
pub mod stream;
pub mod tool;
pub mod usage;

pub use error::{Error, ModelError, Result, ToolError};
