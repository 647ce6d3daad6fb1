//! Action codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies what a message asks for or answers.
///
/// Codes travel as SCREAMING_SNAKE_CASE strings. A code this server does not
/// know decodes to [`Action::Unknown`] so it can be answered with `ERROR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    LoginRequest,
    LoginResponse,
    LogoutRequest,
    LogoutResponse,
    SubmitPriceChange,
    SubmitPriceChangeResponse,
    GetPendingApprovals,
    PendingApprovals,
    ApprovePending,
    ApprovePendingResponse,
    DenyPending,
    DenyPendingResponse,
    SubmitContentChange,
    SubmitContentChangeResponse,
    GetPendingContent,
    PendingContent,
    ApproveContent,
    ApproveContentResponse,
    DenyContent,
    DenyContentResponse,
    UnblockUser,
    UnblockUserResponse,
    Ping,
    Pong,
    Error,
    #[serde(other)]
    Unknown,
}

impl Action {
    /// Every request code, in registration order.
    pub const REQUESTS: [Action; 12] = [
        Action::LoginRequest,
        Action::LogoutRequest,
        Action::SubmitPriceChange,
        Action::GetPendingApprovals,
        Action::ApprovePending,
        Action::DenyPending,
        Action::SubmitContentChange,
        Action::GetPendingContent,
        Action::ApproveContent,
        Action::DenyContent,
        Action::UnblockUser,
        Action::Ping,
    ];

    /// The code a successful handler answers a request with.
    pub fn response(&self) -> Option<Action> {
        let response = match self {
            Self::LoginRequest => Self::LoginResponse,
            Self::LogoutRequest => Self::LogoutResponse,
            Self::SubmitPriceChange => Self::SubmitPriceChangeResponse,
            Self::GetPendingApprovals => Self::PendingApprovals,
            Self::ApprovePending => Self::ApprovePendingResponse,
            Self::DenyPending => Self::DenyPendingResponse,
            Self::SubmitContentChange => Self::SubmitContentChangeResponse,
            Self::GetPendingContent => Self::PendingContent,
            Self::ApproveContent => Self::ApproveContentResponse,
            Self::DenyContent => Self::DenyContentResponse,
            Self::UnblockUser => Self::UnblockUserResponse,
            Self::Ping => Self::Pong,
            _ => return None,
        };
        Some(response)
    }

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoginRequest => "LOGIN_REQUEST",
            Self::LoginResponse => "LOGIN_RESPONSE",
            Self::LogoutRequest => "LOGOUT_REQUEST",
            Self::LogoutResponse => "LOGOUT_RESPONSE",
            Self::SubmitPriceChange => "SUBMIT_PRICE_CHANGE",
            Self::SubmitPriceChangeResponse => "SUBMIT_PRICE_CHANGE_RESPONSE",
            Self::GetPendingApprovals => "GET_PENDING_APPROVALS",
            Self::PendingApprovals => "PENDING_APPROVALS",
            Self::ApprovePending => "APPROVE_PENDING",
            Self::ApprovePendingResponse => "APPROVE_PENDING_RESPONSE",
            Self::DenyPending => "DENY_PENDING",
            Self::DenyPendingResponse => "DENY_PENDING_RESPONSE",
            Self::SubmitContentChange => "SUBMIT_CONTENT_CHANGE",
            Self::SubmitContentChangeResponse => "SUBMIT_CONTENT_CHANGE_RESPONSE",
            Self::GetPendingContent => "GET_PENDING_CONTENT",
            Self::PendingContent => "PENDING_CONTENT",
            Self::ApproveContent => "APPROVE_CONTENT",
            Self::ApproveContentResponse => "APPROVE_CONTENT_RESPONSE",
            Self::DenyContent => "DENY_CONTENT",
            Self::DenyContentResponse => "DENY_CONTENT_RESPONSE",
            Self::UnblockUser => "UNBLOCK_USER",
            Self::UnblockUserResponse => "UNBLOCK_USER_RESPONSE",
            Self::Ping => "PING",
            Self::Pong => "PONG",
            Self::Error => "ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
