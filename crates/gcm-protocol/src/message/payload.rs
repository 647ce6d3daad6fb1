//! Typed message payloads.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gcm_core::ErrorKind;
use gcm_core::types::{MapId, SessionId};
use gcm_entity::approval::{ContentRequestView, PriceUpdateView};
use gcm_entity::user::UserSummary;
use gcm_service::ContentSubmission;

/// Body of a [`Message`](super::Message), tagged by `type` with its fields
/// under `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Payload {
    /// No body (pings, logout, list requests).
    Empty,
    /// Credentials.
    Login(LoginRequest),
    /// Result of a login attempt.
    LoginResult(LoginResponse),
    /// A proposed map price.
    PriceChange(PriceChangeRequest),
    /// A proposed catalog edit.
    ContentChange(ContentSubmission),
    /// Points at a pending record to approve or deny.
    RecordRef(RecordRef),
    /// Account to unblock.
    Unblock(UnblockRequest),
    /// Open price proposals.
    PendingPrices(PendingList<PriceUpdateView>),
    /// Open content proposals.
    PendingContent(PendingList<ContentRequestView>),
    /// Success flag plus failure reason for a workflow step.
    Outcome(Outcome),
    /// The request could not be served.
    Error(ErrorPayload),
}

impl Payload {
    /// Name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Login(_) => "login",
            Self::LoginResult(_) => "login_result",
            Self::PriceChange(_) => "price_change",
            Self::ContentChange(_) => "content_change",
            Self::RecordRef(_) => "record_ref",
            Self::Unblock(_) => "unblock",
            Self::PendingPrices(_) => "pending_prices",
            Self::PendingContent(_) => "pending_content",
            Self::Outcome(_) => "outcome",
            Self::Error(_) => "error",
        }
    }
}

/// `LOGIN_REQUEST` body.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// `LOGIN_RESPONSE` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Whether the connection is now authenticated.
    pub success: bool,
    /// Human-readable result.
    pub message: String,
    /// The authenticated user on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    /// Session bound to the connection on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    /// Attempts left after a wrong password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_attempts: Option<u32>,
    /// Lockout length in seconds when the account is or just became blocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lockout_seconds: Option<u64>,
}

/// `SUBMIT_PRICE_CHANGE` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceChangeRequest {
    pub map_id: MapId,
    pub new_price: Decimal,
}

/// Identifies a pending record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub record_id: Uuid,
}

/// `UNBLOCK_USER` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnblockRequest {
    pub username: String,
}

/// A list of pending records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingList<T> {
    pub count: usize,
    pub records: Vec<T>,
}

impl<T> PendingList<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self {
            count: records.len(),
            records,
        }
    }
}

/// Result of a submit, approve, deny, or unblock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Whether the step took effect.
    pub success: bool,
    /// Machine-readable failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Human-readable detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Record created or decided by the step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<Uuid>,
    /// Catalog entity the step affected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<Uuid>,
}

impl Outcome {
    /// A successful step.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            reason: None,
            message: Some(message.into()),
            record_id: None,
            target_id: None,
        }
    }

    /// A step that did not take effect.
    pub fn failed(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: Some(reason.into()),
            message: Some(message.into()),
            record_id: None,
            target_id: None,
        }
    }

    /// Attach the affected record.
    pub fn with_record(mut self, record_id: impl Into<Uuid>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    /// Attach the affected catalog entity.
    pub fn with_target(mut self, target_id: Option<Uuid>) -> Self {
        self.target_id = target_id;
        self
    }
}

/// `ERROR` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub description: String,
}
