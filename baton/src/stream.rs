//! Raw model stream events and incremental response assembly.
//!
//! A streaming model invocation yields [`ModelStreamEvent`]s. The
//! [`ResponseAccumulator`] folds them back into the single
//! [`ModelResponse`] the rest of the engine operates on, so the streaming
//! path makes exactly the same decisions as the buffered path.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::items::{ModelResponse, ResponseItem};
use crate::usage::Usage;

/// One provider-native event from a streaming model invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ModelStreamEvent {
    /// The provider opened a response.
    Created {
        /// Provider response id, when already known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        response_id: Option<String>,
    },

    /// Incremental message text.
    TextDelta {
        /// The text fragment.
        delta: String,
    },

    /// Incremental reasoning text.
    ReasoningDelta {
        /// The reasoning fragment.
        delta: String,
    },

    /// A complete output item.
    ItemDone {
        /// The finished item.
        item: ResponseItem,
    },

    /// The response finished; terminal marker of a well-formed stream.
    Completed {
        /// Provider response id.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        response_id: Option<String>,
        /// Usage of the whole invocation.
        usage: Usage,
    },
}

impl ModelStreamEvent {
    /// Returns `true` if this is the terminal completion marker.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Folds stream events into one [`ModelResponse`].
///
/// The accumulator only trusts [`ModelStreamEvent::ItemDone`] for content —
/// deltas are display-only — and requires the `Completed` marker before it
/// will produce a response.
#[derive(Debug, Clone, Default)]
pub struct ResponseAccumulator {
    items: Vec<ResponseItem>,
    usage: Usage,
    response_id: Option<String>,
    completed: bool,
}

impl ResponseAccumulator {
    /// Create a new accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one stream event.
    pub fn apply(&mut self, event: &ModelStreamEvent) {
        match event {
            ModelStreamEvent::Created { response_id } => {
                if response_id.is_some() {
                    self.response_id.clone_from(response_id);
                }
            }
            ModelStreamEvent::ItemDone { item } => {
                self.items.push(item.clone());
            }
            ModelStreamEvent::Completed { response_id, usage } => {
                if response_id.is_some() {
                    self.response_id.clone_from(response_id);
                }
                self.usage = *usage;
                self.completed = true;
            }
            ModelStreamEvent::TextDelta { .. } | ModelStreamEvent::ReasoningDelta { .. } => {}
        }
    }

    /// Returns `true` once the completion marker has been seen.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Assemble the final response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelBehavior`] if the stream ended without the
    /// `Completed` marker — the response cannot be trusted to be whole.
    pub fn into_response(self) -> Result<ModelResponse> {
        if !self.completed {
            return Err(Error::model_behavior(
                "model stream ended without a response completion marker",
            ));
        }
        Ok(ModelResponse {
            output: self.items,
            usage: self.usage,
            response_id: self.response_id,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_items_in_order() {
        let mut acc = ResponseAccumulator::new();
        acc.apply(&ModelStreamEvent::Created {
            response_id: Some("resp_1".into()),
        });
        acc.apply(&ModelStreamEvent::TextDelta { delta: "He".into() });
        acc.apply(&ModelStreamEvent::TextDelta {
            delta: "llo".into(),
        });
        acc.apply(&ModelStreamEvent::ItemDone {
            item: ResponseItem::assistant_message("Hello"),
        });
        acc.apply(&ModelStreamEvent::ItemDone {
            item: ResponseItem::function_call("c1", "lookup", "{}"),
        });
        acc.apply(&ModelStreamEvent::Completed {
            response_id: None,
            usage: Usage::new(10, 5),
        });

        let response = acc.into_response().unwrap();
        assert_eq!(response.output.len(), 2);
        assert_eq!(response.response_id.as_deref(), Some("resp_1"));
        assert_eq!(response.usage.total_tokens, 15);
        assert_eq!(
            response.output[0],
            ResponseItem::assistant_message("Hello")
        );
    }

    #[test]
    fn missing_completion_marker_is_model_behavior_error() {
        let mut acc = ResponseAccumulator::new();
        acc.apply(&ModelStreamEvent::ItemDone {
            item: ResponseItem::assistant_message("partial"),
        });

        let err = acc.into_response().unwrap_err();
        assert!(matches!(err, Error::ModelBehavior(_)));
    }

    #[test]
    fn completed_overrides_created_response_id() {
        let mut acc = ResponseAccumulator::new();
        acc.apply(&ModelStreamEvent::Created {
            response_id: Some("early".into()),
        });
        acc.apply(&ModelStreamEvent::Completed {
            response_id: Some("final".into()),
            usage: Usage::zero(),
        });
        let response = acc.into_response().unwrap();
        assert_eq!(response.response_id.as_deref(), Some("final"));
    }

    #[test]
    fn is_completed_tracks_marker() {
        let mut acc = ResponseAccumulator::new();
        assert!(!acc.is_completed());
        acc.apply(&ModelStreamEvent::Completed {
            response_id: None,
            usage: Usage::zero(),
        });
        assert!(acc.is_completed());
    }

    #[test]
    fn event_serde_roundtrip() {
        let event = ModelStreamEvent::ItemDone {
            item: ResponseItem::assistant_message("hi"),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: ModelStreamEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
        assert!(!back.is_completed());
    }
}
