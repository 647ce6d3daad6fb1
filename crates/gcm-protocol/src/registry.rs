//! Action-keyed handler registry.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{error, info, warn};

use gcm_core::{AppResult, ErrorKind};
use gcm_service::RequestContext;

use crate::message::{Action, Message};

/// Boxed future returned by a handler.
pub type HandlerFuture = BoxFuture<'static, AppResult<Message>>;

/// A request handler.
pub type Handler = Arc<dyn Fn(RequestContext, Message) -> HandlerFuture + Send + Sync>;

/// Maps each request action to its handler.
///
/// [`dispatch`](Self::dispatch) always produces a response: unknown actions,
/// handler errors, panics, and timeouts all become `ERROR` messages.
pub struct HandlerRegistry {
    handlers: HashMap<Action, Handler>,
    timeout: Duration,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("actions", &self.handlers.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HandlerRegistry {
    /// Create an empty registry with a per-request time limit.
    pub fn new(timeout: Duration) -> Self {
        Self {
            handlers: HashMap::new(),
            timeout,
        }
    }

    /// Register `handler` for `action`, replacing any previous one.
    pub fn register<F, Fut>(&mut self, action: Action, handler: F)
    where
        F: Fn(RequestContext, Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Message>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |ctx, msg| handler(ctx, msg).boxed());
        if self.handlers.insert(action, handler).is_some() {
            warn!(action = %action, "Replaced existing handler");
        }
    }

    /// Whether `action` has a handler.
    pub fn contains(&self, action: Action) -> bool {
        self.handlers.contains_key(&action)
    }

    /// Number of registered actions.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Route `message` to its handler and produce the response.
    pub async fn dispatch(&self, ctx: RequestContext, message: Message) -> Message {
        let action = message.action;
        let connection_id = ctx.connection_id;

        let Some(handler) = self.handlers.get(&action).cloned() else {
            warn!(connection_id = %connection_id, action = %action, "No handler for action");
            return Message::error(ErrorKind::Protocol, format!("Unknown action: {action}"));
        };

        // The handler runs inside the guarded future so a panic while building
        // its future is caught as well.
        let guarded = AssertUnwindSafe(async move { handler(ctx, message).await }).catch_unwind();

        match tokio::time::timeout(self.timeout, guarded).await {
            Ok(Ok(Ok(response))) => response,
            Ok(Ok(Err(e))) => {
                match e.kind {
                    ErrorKind::Internal | ErrorKind::Database => {
                        error!(connection_id = %connection_id, action = %action, error = %e, "Handler failed")
                    }
                    _ => info!(connection_id = %connection_id, action = %action, error = %e, "Request rejected"),
                }
                Message::from(e)
            }
            Ok(Err(panic)) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(connection_id = %connection_id, action = %action, panic = %detail, "Handler panicked");
                Message::error(ErrorKind::Internal, "Internal error while handling request")
            }
            Err(_) => {
                warn!(
                    connection_id = %connection_id,
                    action = %action,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Handler timed out"
                );
                Message::error(ErrorKind::Timeout, "Request timed out")
            }
        }
    }
}
