//! Duplex channels carrying protocol messages between the client and the
//! dispatch loop.

pub mod sse;
pub mod stdio;

pub use sse::{Frame, Session, SessionState, SseOptions, SseTransport, router};
pub use stdio::StdioTransport;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

use crate::protocol::Message;

/// Errors raised by a transport
///
/// The HTTP-facing variants map onto the status codes returned to the client.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("session already established")]
    AlreadyEstablished,

    #[error("SSE stream not established")]
    NotEstablished,

    #[error("invalid or missing session ID")]
    Forbidden,

    #[error("invalid JSON: {0}")]
    BadRequest(String),

    #[error("server shutting down")]
    ShuttingDown,

    #[error("SSE stream not connected")]
    NotConnected,

    #[error("marshaling message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("listening on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TransportError::AlreadyEstablished => StatusCode::CONFLICT,
            TransportError::NotEstablished | TransportError::ShuttingDown => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            TransportError::Forbidden => StatusCode::FORBIDDEN,
            TransportError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TransportError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

/// A bidirectional message channel used by the dispatch loop
#[async_trait]
pub trait Transport: Send + Sync {
    /// Wait for the next inbound message; `Ok(None)` means end of stream
    async fn recv(&self) -> Result<Option<Message>, TransportError>;

    /// Deliver one message to the client
    async fn send(&self, msg: &Message) -> Result<(), TransportError>;

    /// Shut the transport down. Safe to call more than once.
    async fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(TransportError::AlreadyEstablished.status_code(), StatusCode::CONFLICT);
        assert_eq!(TransportError::NotEstablished.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(TransportError::ShuttingDown.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(TransportError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            TransportError::BadRequest("eof".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(TransportError::NotConnected.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
