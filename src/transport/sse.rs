//! HTTP/SSE transport.
//!
//! `GET /sse` opens the server-to-client event stream and announces where the
//! client should post; `POST /message?sessionId=<token>` carries client-to-
//! server messages. Exactly one session may be established per transport.

use async_trait::async_trait;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use futures_util::stream::{self, Stream};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::Deserialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{Transport, TransportError};
use crate::protocol::Message;

/// Random bytes behind each session token
const TOKEN_BYTES: usize = 16;

/// How long `close` waits for in-flight HTTP connections to drain
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Tunables for [`SseTransport`]
#[derive(Debug, Clone)]
pub struct SseOptions {
    /// Capacity of the inbound FIFO between POST handlers and `recv`
    pub queue_capacity: usize,
    /// Frames buffered for the event stream before `send` waits on the client
    pub outbound_capacity: usize,
    /// Interval for SSE comment pings, `None` disables them
    pub keep_alive: Option<Duration>,
}

impl Default for SseOptions {
    fn default() -> Self {
        Self {
            queue_capacity: 16,
            outbound_capacity: 16,
            keep_alive: None,
        }
    }
}

/// One server-sent event queued for the open stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub event: &'static str,
    pub data: String,
}

impl Frame {
    fn into_event(self) -> Event {
        Event::default().event(self.event).data(self.data)
    }
}

/// Observable lifecycle of a [`Session`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unestablished,
    Established,
    Closed,
}

/// Token and sink of the live stream; both change together
enum Slot {
    Unestablished,
    Established {
        token: String,
        sink: mpsc::Sender<Frame>,
    },
    Closed,
}

/// The single client session behind an [`SseTransport`]
pub struct Session {
    slot: Mutex<Slot>,
    inbound_tx: mpsc::Sender<Message>,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<Message>>,
    closed: CancellationToken,
    outbound_capacity: usize,
    keep_alive: Option<Duration>,
}

impl Session {
    pub fn new(options: &SseOptions) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(options.queue_capacity.max(1));

        Self {
            slot: Mutex::new(Slot::Unestablished),
            inbound_tx,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            closed: CancellationToken::new(),
            outbound_capacity: options.outbound_capacity.max(1),
            keep_alive: options.keep_alive,
        }
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> SessionState {
        match *self.slot() {
            Slot::Unestablished => SessionState::Unestablished,
            Slot::Established { .. } => SessionState::Established,
            Slot::Closed => SessionState::Closed,
        }
    }

    /// Signal that fires once the session is closed
    pub fn closed(&self) -> CancellationToken {
        self.closed.clone()
    }

    /// Open the stream: mint a token, register the sink and queue the
    /// `endpoint` event
    ///
    /// Returns the token and the receiving half of the sink.
    pub fn establish(&self) -> Result<(String, mpsc::Receiver<Frame>), TransportError> {
        let mut slot = self.slot();
        match *slot {
            Slot::Established { .. } => return Err(TransportError::AlreadyEstablished),
            Slot::Closed => return Err(TransportError::ShuttingDown),
            Slot::Unestablished => {}
        }

        let token = new_token();
        let (sink, frames) = mpsc::channel(self.outbound_capacity);
        sink.try_send(Frame {
            event: "endpoint",
            data: format!("/message?sessionId={}", token),
        })
        .map_err(|_| TransportError::NotConnected)?;

        *slot = Slot::Established {
            token: token.clone(),
            sink,
        };

        info!(session = %short(&token), "SSE session established");
        Ok((token, frames))
    }

    /// Accept one inbound message body posted with `token`
    ///
    /// Waits while the queue is full, giving up if the session closes.
    pub async fn submit(&self, token: Option<&str>, body: &[u8]) -> Result<(), TransportError> {
        self.authorize(token)?;

        let msg = Message::from_slice(body).map_err(TransportError::BadRequest)?;
        debug!(method = ?msg.method, "inbound message");

        tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(TransportError::ShuttingDown),
            sent = self.inbound_tx.send(msg) => sent.map_err(|_| TransportError::ShuttingDown),
        }
    }

    fn authorize(&self, token: Option<&str>) -> Result<(), TransportError> {
        match &*self.slot() {
            Slot::Unestablished => Err(TransportError::NotEstablished),
            Slot::Closed => Err(TransportError::ShuttingDown),
            Slot::Established { token: active, .. } if token == Some(active.as_str()) => Ok(()),
            Slot::Established { .. } => Err(TransportError::Forbidden),
        }
    }

    /// Next inbound message in arrival order, or `None` once closed
    pub async fn receive(&self) -> Option<Message> {
        if self.closed.is_cancelled() {
            return None;
        }

        let mut inbound = self.inbound_rx.lock().await;
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => None,
            msg = inbound.recv() => msg,
        }
    }

    /// Write one message to the open stream as a `message` event
    ///
    /// Waits while the client is behind on reading, giving up if the session
    /// closes.
    pub async fn send(&self, msg: &Message) -> Result<(), TransportError> {
        let data = serde_json::to_string(msg)?;

        let sink = match &*self.slot() {
            Slot::Established { sink, .. } => sink.clone(),
            _ => return Err(TransportError::NotConnected),
        };

        tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(TransportError::ShuttingDown),
            sent = sink.send(Frame { event: "message", data }) => {
                sent.map_err(|_| TransportError::NotConnected)
            }
        }
    }

    /// Tear the session down and wake every blocked caller
    ///
    /// Only the first call has any effect.
    pub fn close(&self) {
        let previous = std::mem::replace(&mut *self.slot(), Slot::Closed);
        self.closed.cancel();

        match previous {
            Slot::Established { token, .. } => {
                info!(session = %short(&token), "SSE session closed")
            }
            Slot::Unestablished => debug!("SSE transport closed before a session was established"),
            Slot::Closed => {}
        }
    }
}

fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Token prefix safe to put in logs
fn short(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}

/// Closes the session when the event stream is dropped, which is how a
/// client disconnect surfaces
struct StreamGuard(Arc<Session>);

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.0.close();
    }
}

fn event_stream(
    session: Arc<Session>,
    frames: mpsc::Receiver<Frame>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold((frames, StreamGuard(session)), |(mut frames, guard)| async move {
        let closed = guard.0.closed();
        let next = tokio::select! {
            biased;
            frame = frames.recv() => frame,
            _ = closed.cancelled() => None,
        };
        next.map(|frame| (Ok(frame.into_event()), (frames, guard)))
    })
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

async fn handle_sse(State(session): State<Arc<Session>>) -> Result<Response, TransportError> {
    let (_token, frames) = session.establish().inspect_err(|err| {
        warn!(error = %err, "rejected SSE stream");
    })?;

    let keep_alive = session.keep_alive;
    let mut sse = Sse::new(event_stream(session, frames));
    if let Some(interval) = keep_alive {
        sse = sse.keep_alive(KeepAlive::new().interval(interval));
    }

    Ok(([(header::CONNECTION, "keep-alive")], sse).into_response())
}

async fn handle_message(
    State(session): State<Arc<Session>>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> Result<StatusCode, TransportError> {
    session
        .submit(query.session_id.as_deref(), &body)
        .await
        .inspect_err(|err| debug!(error = %err, "rejected inbound message"))?;
    Ok(StatusCode::ACCEPTED)
}

/// Routes for the SSE transport bound to `session`
pub fn router(session: Arc<Session>) -> Router {
    Router::new()
        .route("/sse", get(handle_sse))
        .route("/message", post(handle_message))
        .with_state(session)
}

/// SSE transport serving one session over HTTP
pub struct SseTransport {
    session: Arc<Session>,
    local_addr: SocketAddr,
    server: Mutex<Option<JoinHandle<()>>>,
}

impl SseTransport {
    /// Bind `addr` and start serving in the background
    ///
    /// Port 0 picks an ephemeral port; see [`SseTransport::local_addr`].
    pub async fn bind(addr: SocketAddr, options: SseOptions) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        let session = Arc::new(Session::new(&options));
        let app = router(Arc::clone(&session));
        let shutdown = session.closed();

        let server = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await;
            if let Err(err) = result {
                error!(error = %err, "SSE server error");
            }
        });

        info!(addr = %local_addr, "SSE transport listening");

        Ok(Self {
            session,
            local_addr,
            server: Mutex::new(Some(server)),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }
}

#[async_trait]
impl Transport for SseTransport {
    async fn recv(&self) -> Result<Option<Message>, TransportError> {
        Ok(self.session.receive().await)
    }

    async fn send(&self, msg: &Message) -> Result<(), TransportError> {
        self.session.send(msg).await
    }

    async fn close(&self) {
        self.session.close();

        let server = self
            .server
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(server) = server {
            if tokio::time::timeout(SHUTDOWN_GRACE, server).await.is_err() {
                warn!("SSE server did not shut down in time");
            }
        }
    }
}
