//! Minimal client for the GCM protocol.
//!
//! Used by the integration tests and handy for scripting against a running
//! server.

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use rust_decimal::Decimal;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::Framed;
use uuid::Uuid;

use gcm_core::types::MapId;
use gcm_core::{AppError, AppResult};
use gcm_service::ContentSubmission;

use crate::message::{
    Action, LoginRequest, LoginResponse, Message, MessageCodec, Payload, PriceChangeRequest,
    RecordRef, UnblockRequest,
};

/// A connected protocol client. Requests are answered in order.
#[derive(Debug)]
pub struct GcmClient {
    framed: Framed<TcpStream, MessageCodec>,
}

impl GcmClient {
    /// Connect to a server.
    pub async fn connect(addr: impl ToSocketAddrs, max_frame_bytes: usize) -> AppResult<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self {
            framed: Framed::new(stream, MessageCodec::new(max_frame_bytes)),
        })
    }

    /// Send a message and wait for its response.
    pub async fn request(&mut self, message: Message) -> AppResult<Message> {
        self.framed.send(message).await?;
        self.receive().await
    }

    /// Send an arbitrary frame body and wait for the response.
    pub async fn request_raw(&mut self, body: impl Into<Bytes>) -> AppResult<Message> {
        self.framed.send(body.into()).await?;
        self.receive().await
    }

    async fn receive(&mut self) -> AppResult<Message> {
        match self.framed.next().await {
            Some(Ok(decoded)) => decoded,
            Some(Err(e)) => Err(e.into()),
            None => Err(AppError::protocol("Server closed the connection")),
        }
    }

    /// `LOGIN_REQUEST`
    pub async fn login(&mut self, username: &str, password: &str) -> AppResult<LoginResponse> {
        let response = self
            .request(Message::new(
                Action::LoginRequest,
                Payload::Login(LoginRequest {
                    username: username.to_string(),
                    password: password.to_string(),
                }),
            ))
            .await?;
        match response.payload {
            Payload::LoginResult(result) => Ok(result),
            Payload::Error(e) => Err(AppError::new(e.kind, e.description)),
            other => Err(AppError::protocol(format!(
                "Unexpected login reply: {}",
                other.kind()
            ))),
        }
    }

    /// `LOGOUT_REQUEST`
    pub async fn logout(&mut self) -> AppResult<Message> {
        self.request(Message::empty(Action::LogoutRequest)).await
    }

    /// `PING`
    pub async fn ping(&mut self) -> AppResult<Message> {
        self.request(Message::empty(Action::Ping)).await
    }

    /// `SUBMIT_PRICE_CHANGE`
    pub async fn submit_price(&mut self, map_id: MapId, new_price: Decimal) -> AppResult<Message> {
        self.request(Message::new(
            Action::SubmitPriceChange,
            Payload::PriceChange(PriceChangeRequest { map_id, new_price }),
        ))
        .await
    }

    /// `SUBMIT_CONTENT_CHANGE`
    pub async fn submit_content(&mut self, submission: ContentSubmission) -> AppResult<Message> {
        self.request(Message::new(
            Action::SubmitContentChange,
            Payload::ContentChange(submission),
        ))
        .await
    }

    /// Any request whose body is a [`RecordRef`].
    pub async fn decide(&mut self, action: Action, record_id: impl Into<Uuid>) -> AppResult<Message> {
        self.request(Message::new(
            action,
            Payload::RecordRef(RecordRef {
                record_id: record_id.into(),
            }),
        ))
        .await
    }

    /// `UNBLOCK_USER`
    pub async fn unblock(&mut self, username: &str) -> AppResult<Message> {
        self.request(Message::new(
            Action::UnblockUser,
            Payload::Unblock(UnblockRequest {
                username: username.to_string(),
            }),
        ))
        .await
    }
}
