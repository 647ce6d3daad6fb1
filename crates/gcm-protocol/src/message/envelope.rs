//! The message envelope.

use serde::{Deserialize, Serialize};

use gcm_core::{AppError, ErrorKind};

use super::action::Action;
use super::payload::{ErrorPayload, Outcome, Payload};

/// One request or response: an action code plus its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// What the message asks for or answers.
    pub action: Action,
    /// Body; absent on the wire means [`Payload::Empty`].
    #[serde(default = "empty_payload")]
    pub payload: Payload,
}

fn empty_payload() -> Payload {
    Payload::Empty
}

impl Message {
    /// Create a message.
    pub fn new(action: Action, payload: Payload) -> Self {
        Self { action, payload }
    }

    /// Create a message without a body.
    pub fn empty(action: Action) -> Self {
        Self::new(action, Payload::Empty)
    }

    /// Create an outcome response.
    pub fn outcome(action: Action, outcome: Outcome) -> Self {
        Self::new(action, Payload::Outcome(outcome))
    }

    /// Create an `ERROR` response.
    pub fn error(kind: ErrorKind, description: impl Into<String>) -> Self {
        Self::new(
            Action::Error,
            Payload::Error(ErrorPayload {
                kind,
                description: description.into(),
            }),
        )
    }

    /// Whether this is an `ERROR` response.
    pub fn is_error(&self) -> bool {
        self.action == Action::Error
    }

    /// The outcome body, if any.
    pub fn as_outcome(&self) -> Option<&Outcome> {
        match &self.payload {
            Payload::Outcome(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// The error body, if any.
    pub fn as_error(&self) -> Option<&ErrorPayload> {
        match &self.payload {
            Payload::Error(error) => Some(error),
            _ => None,
        }
    }
}

impl From<AppError> for Message {
    fn from(err: AppError) -> Self {
        Self::error(err.kind, err.message)
    }
}
