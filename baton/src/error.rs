//! Unified error types for the baton engine.
//!
//! The taxonomy separates four kinds of failure:
//! - run-control signals that are expected outcomes of normal operation
//!   (turn budget exhaustion, guardrail tripwires),
//! - structurally invalid model output ([`Error::ModelBehavior`]),
//! - caller misconfiguration ([`Error::User`]),
//! - collaborator failures surfaced through the narrow interfaces
//!   ([`ModelError`], [`ToolError`]).

use std::fmt;

use crate::guardrail::{InputGuardrailResult, OutputGuardrailResult};

/// Result type alias for baton operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the baton engine.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The configured turn budget was exhausted without a final output.
    #[error("Maximum turns ({max_turns}) exceeded without final output")]
    MaxTurnsExceeded {
        /// The maximum number of turns configured for the run.
        max_turns: usize,
    },

    /// The model produced something structurally invalid: an unknown tool
    /// name, a missing handoff payload, an unterminated event stream.
    ///
    /// Never retried automatically; the run is over.
    #[error("Model behavior error: {0}")]
    ModelBehavior(String),

    /// The caller misconfigured the run. Indicates a programming error by
    /// the integrator, not a runtime condition.
    #[error("User error: {0}")]
    User(String),

    /// An input guardrail tripwire fired before the first model call.
    ///
    /// Carries the triggering result for inspection; this is a control-flow
    /// signal, not a bug.
    #[error("Input guardrail '{}' tripwire triggered", .0.guardrail_name)]
    InputGuardrailTriggered(InputGuardrailResult),

    /// An output guardrail tripwire fired after a final output was produced.
    ///
    /// The computed final output is discarded and must not reach the caller.
    #[error("Output guardrail '{}' tripwire triggered", .0.guardrail_name)]
    OutputGuardrailTriggered(OutputGuardrailResult),

    /// Model provider error.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Tool execution error.
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a model behavior error with a message.
    #[must_use]
    pub fn model_behavior(msg: impl Into<String>) -> Self {
        Self::ModelBehavior(msg.into())
    }

    /// Create a user (caller misconfiguration) error with a message.
    #[must_use]
    pub fn user(msg: impl Into<String>) -> Self {
        Self::User(msg.into())
    }

    /// Create a max turns error.
    #[must_use]
    pub const fn max_turns(max_turns: usize) -> Self {
        Self::MaxTurnsExceeded { max_turns }
    }

    /// Returns `true` if this error is a guardrail tripwire signal.
    #[must_use]
    pub const fn is_guardrail_tripwire(&self) -> bool {
        matches!(
            self,
            Self::InputGuardrailTriggered(_) | Self::OutputGuardrailTriggered(_)
        )
    }

    /// Returns `true` if this error could succeed on retry.
    ///
    /// Only transient model-provider failures qualify; engine-level errors
    /// (behavior, user, budget, tripwires) never do.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Model(e) if e.is_retryable())
    }
}

/// Error type for model provider operations.
///
/// Providers live behind the [`Model`](crate::model::Model) trait; their
/// failures are reduced to a kind, an optional provider name, and a message.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ModelError {
    /// The error kind.
    pub kind: ModelErrorKind,
    /// The provider name, when known.
    pub provider: Option<String>,
    /// Additional error message.
    pub message: String,
    /// Optional error code from the provider.
    pub code: Option<String>,
}

/// Categories of model provider errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModelErrorKind {
    /// Authentication or authorization failure.
    Auth,
    /// Rate limit exceeded.
    RateLimited,
    /// Context length exceeded.
    ContextExceeded,
    /// Invalid request parameters.
    InvalidRequest,
    /// Network or connection error.
    Network,
    /// Streaming transport error.
    Stream,
    /// Provider-specific error.
    Provider,
    /// Internal error.
    Internal,
    /// Feature not supported by the provider.
    NotSupported,
}

impl ModelError {
    /// Create an authentication error.
    #[must_use]
    pub fn auth(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ModelErrorKind::Auth,
            provider: Some(provider.into()),
            message: message.into(),
            code: None,
        }
    }

    /// Create a rate limit error.
    #[must_use]
    pub fn rate_limited(provider: impl Into<String>) -> Self {
        Self {
            kind: ModelErrorKind::RateLimited,
            provider: Some(provider.into()),
            message: "Rate limit exceeded. Please retry after some time.".into(),
            code: None,
        }
    }

    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: ModelErrorKind::Network,
            provider: None,
            message: message.into(),
            code: None,
        }
    }

    /// Create a streaming transport error.
    #[must_use]
    pub fn stream(message: impl Into<String>) -> Self {
        Self {
            kind: ModelErrorKind::Stream,
            provider: None,
            message: message.into(),
            code: None,
        }
    }

    /// Create a provider-specific error.
    #[must_use]
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ModelErrorKind::Provider,
            provider: Some(provider.into()),
            message: message.into(),
            code: None,
        }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ModelErrorKind::Internal,
            provider: None,
            message: message.into(),
            code: None,
        }
    }

    /// Create a not supported error.
    #[must_use]
    pub fn not_supported(feature: impl Into<String>) -> Self {
        Self {
            kind: ModelErrorKind::NotSupported,
            provider: None,
            message: format!("Feature not supported: {}", feature.into()),
            code: None,
        }
    }

    /// Check if this is a retryable error.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ModelErrorKind::RateLimited | ModelErrorKind::Network
        )
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{provider}] ")?;
        }
        write!(f, "{}", self.message)?;
        if let Some(code) = &self.code {
            write!(f, " (code: {code})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ModelError {}

/// Error type for tool execution failures.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum ToolError {
    /// Error during tool execution.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Invalid arguments provided to the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Tool not found.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// A tool-server call failed.
    #[error("Tool server error: {0}")]
    Server(String),

    /// Generic error.
    #[error("Tool error: {0}")]
    Other(String),
}

impl ToolError {
    /// Create an execution error.
    #[must_use]
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Create an invalid arguments error.
    #[must_use]
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a tool-server error.
    #[must_use]
    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server(msg.into())
    }
}

impl From<String> for ToolError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for ToolError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidArguments(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::guardrail::GuardrailOutput;

    mod error {
        use super::*;

        #[test]
        fn max_turns_creates_error() {
            let err = Error::max_turns(10);
            assert!(matches!(err, Error::MaxTurnsExceeded { max_turns: 10 }));
            assert!(err.to_string().contains("10"));
        }

        #[test]
        fn model_behavior_creates_error() {
            let err = Error::model_behavior("tool 'frobnicate' not found");
            assert!(matches!(err, Error::ModelBehavior(_)));
            assert!(err.to_string().contains("frobnicate"));
        }

        #[test]
        fn user_creates_error() {
            let err = Error::user("no model configured");
            assert!(matches!(err, Error::User(_)));
        }

        #[test]
        fn tripwire_predicate() {
            let result = InputGuardrailResult {
                guardrail_name: "pii".into(),
                output: GuardrailOutput::tripwire("found ssn"),
            };
            let err = Error::InputGuardrailTriggered(result);
            assert!(err.is_guardrail_tripwire());
            assert!(err.to_string().contains("pii"));

            assert!(!Error::max_turns(3).is_guardrail_tripwire());
        }

        #[test]
        fn from_tool_error() {
            let err: Error = ToolError::not_found("my_tool").into();
            assert!(matches!(err, Error::Tool(_)));
        }

        #[test]
        fn from_model_error() {
            let err: Error = ModelError::network("timeout").into();
            assert!(matches!(err, Error::Model(_)));
        }

        #[test]
        fn retryable_only_for_transient_model_errors() {
            assert!(Error::from(ModelError::rate_limited("acme")).is_retryable());
            assert!(!Error::from(ModelError::internal("bug")).is_retryable());
            assert!(!Error::model_behavior("bad").is_retryable());
            assert!(!Error::max_turns(1).is_retryable());
        }
    }

    mod model_error {
        use super::*;

        #[test]
        fn auth_creates_error() {
            let err = ModelError::auth("acme", "Invalid API key");
            assert_eq!(err.kind, ModelErrorKind::Auth);
            assert_eq!(err.provider.as_deref(), Some("acme"));
        }

        #[test]
        fn is_retryable_rate_limited_and_network() {
            assert!(ModelError::rate_limited("acme").is_retryable());
            assert!(ModelError::network("timeout").is_retryable());
            assert!(!ModelError::auth("acme", "bad key").is_retryable());
            assert!(!ModelError::stream("cut off").is_retryable());
        }

        #[test]
        fn display_with_provider() {
            let s = ModelError::auth("acme", "Invalid key").to_string();
            assert!(s.contains("[acme]"));
            assert!(s.contains("Invalid key"));
        }

        #[test]
        fn display_without_provider() {
            let s = ModelError::network("timeout").to_string();
            assert!(!s.contains('['));
            assert!(s.contains("timeout"));
        }
    }

    mod tool_error {
        use super::*;

        #[test]
        fn constructors_map_to_variants() {
            assert!(matches!(
                ToolError::execution("boom"),
                ToolError::Execution(_)
            ));
            assert!(matches!(
                ToolError::invalid_args("bad"),
                ToolError::InvalidArguments(_)
            ));
            assert!(matches!(ToolError::not_found("x"), ToolError::NotFound(_)));
            assert!(matches!(ToolError::server("down"), ToolError::Server(_)));
        }

        #[test]
        fn from_serde_json_error() {
            let json_err = serde_json::from_str::<i32>("invalid").unwrap_err();
            let err: ToolError = json_err.into();
            assert!(matches!(err, ToolError::InvalidArguments(_)));
        }

        #[test]
        fn from_str_and_string() {
            let err: ToolError = "custom".into();
            assert!(matches!(err, ToolError::Other(_)));
            let err: ToolError = String::from("custom").into();
            assert!(matches!(err, ToolError::Other(_)));
        }
    }
}
