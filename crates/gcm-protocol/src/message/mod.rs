//! Protocol messages and their framing.

pub mod action;
pub mod codec;
pub mod envelope;
pub mod payload;

pub use action::Action;
pub use codec::MessageCodec;
pub use envelope::Message;
pub use payload::{
    ErrorPayload, LoginRequest, LoginResponse, Outcome, Payload, PendingList, PriceChangeRequest,
    RecordRef, UnblockRequest,
};
