//! No-op (empty) implementations of the hook traits.
//!
//! Both traits already default every method to an empty body, so these
//! structs simply rely on those defaults. They exist as concrete types for
//! builder defaults and `Option<SharedRunHooks>` scenarios.

use async_trait::async_trait;

use super::hooks::{AgentHooks, RunHooks};

/// A no-op implementation of [`RunHooks`] that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRunHooks;

#[async_trait]
impl RunHooks for NoopRunHooks {}

/// A no-op implementation of [`AgentHooks`] that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAgentHooks;

#[async_trait]
impl AgentHooks for NoopAgentHooks {}
