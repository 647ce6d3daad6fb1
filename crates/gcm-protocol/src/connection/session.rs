//! Session binding driven by responses.
//!
//! Handlers never touch connection state. The connection inspects each
//! response and binds or clears its session accordingly.

use gcm_service::SessionUser;

use crate::message::{Action, Message, Payload};

/// How a response changes the connection's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    /// A login succeeded.
    Bind(SessionUser),
    /// The user logged out.
    Clear,
}

impl SessionChange {
    /// The change implied by `response`, if any.
    pub fn from_response(response: &Message) -> Option<Self> {
        match (&response.action, &response.payload) {
            (Action::LoginResponse, Payload::LoginResult(result)) if result.success => {
                let user = result.user.clone()?;
                let session_id = result.session_id?;
                Some(Self::Bind(SessionUser { session_id, user }))
            }
            (Action::LogoutResponse, _) => Some(Self::Clear),
            _ => None,
        }
    }
}
