//! The per-connection request loop.

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use gcm_core::types::ConnectionId;
use gcm_core::{AppError, ErrorKind};
use gcm_service::{RequestContext, SessionUser};

use super::pool::ConnectionPool;
use super::session::SessionChange;
use crate::message::{Message, MessageCodec};
use crate::registry::HandlerRegistry;

/// One client connection.
///
/// Requests are read, dispatched, and answered strictly in order; the next
/// frame is not read until the previous response has been written.
#[derive(Debug)]
pub struct ClientConnection {
    id: ConnectionId,
    peer_addr: SocketAddr,
    registry: Arc<HandlerRegistry>,
    pool: Arc<ConnectionPool>,
    session: Option<SessionUser>,
}

impl ClientConnection {
    /// Creates a connection for a freshly accepted peer.
    pub fn new(
        peer_addr: SocketAddr,
        registry: Arc<HandlerRegistry>,
        pool: Arc<ConnectionPool>,
    ) -> Self {
        Self {
            id: ConnectionId::new(),
            peer_addr,
            registry,
            pool,
            session: None,
        }
    }

    /// Connection identifier.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The session bound by the last successful login.
    pub fn session(&self) -> Option<&SessionUser> {
        self.session.as_ref()
    }

    /// Serve requests until the peer disconnects, the stream fails, or
    /// `shutdown` is cancelled.
    pub async fn run<S>(mut self, stream: S, max_frame_bytes: usize, shutdown: CancellationToken)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.pool.add(self.id, self.peer_addr.to_string());
        info!(connection_id = %self.id, peer = %self.peer_addr, "Client connected");

        let mut framed = Framed::new(stream, MessageCodec::server(max_frame_bytes));

        loop {
            let next = tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!(connection_id = %self.id, "Closing connection for shutdown");
                    break;
                }
                next = framed.next() => next,
            };

            let frame = match next {
                None => break,
                Some(Ok(frame)) => frame,
                Some(Err(e)) => {
                    warn!(connection_id = %self.id, error = %e, "Unreadable stream, closing");
                    let _ = framed
                        .send(Message::error(ErrorKind::Protocol, format!("Unreadable frame: {e}")))
                        .await;
                    break;
                }
            };

            let response = self.handle_frame(frame).await;
            if let Err(e) = framed.send(response).await {
                warn!(connection_id = %self.id, error = %e, "Failed to write response");
                break;
            }
        }

        self.pool.remove(&self.id);
        info!(
            connection_id = %self.id,
            peer = %self.peer_addr,
            user_id = ?self.session.as_ref().map(|s| s.user.id),
            "Client disconnected"
        );
    }

    /// Produce the response to one decoded frame.
    pub async fn handle_frame(&mut self, frame: Result<Message, AppError>) -> Message {
        let request = match frame {
            Ok(request) => request,
            Err(e) => {
                debug!(connection_id = %self.id, error = %e, "Malformed frame");
                return Message::from(e);
            }
        };

        debug!(connection_id = %self.id, action = %request.action, "Request received");
        let ctx = RequestContext::new(self.id, self.peer_addr.to_string(), self.session.clone());
        let response = self.registry.dispatch(ctx, request).await;

        match SessionChange::from_response(&response) {
            Some(SessionChange::Bind(session)) => {
                self.pool.set_user(&self.id, Some(session.user.clone()));
                self.session = Some(session);
            }
            Some(SessionChange::Clear) => {
                self.pool.set_user(&self.id, None);
                self.session = None;
            }
            None => {}
        }
        response
    }
}
