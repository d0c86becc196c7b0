use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::watch;

/// Errors produced by a transport.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,

    #[error("transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// HTTP verbs used by the rules API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied deadline and cancellation signal.
///
/// The client never inspects this; it is handed to the transport as-is
/// on every call.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

impl RequestContext {
    /// A context with no deadline that is never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context plus the sender that cancels it.
    ///
    /// Sending `true` cancels every request using this context (or a
    /// clone of it).
    pub fn cancellable() -> (Self, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self::background().with_cancellation(rx), tx)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Cancel on a signal shared with other contexts.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once the context is cancelled.
    ///
    /// Never resolves for contexts without a cancellation signal, or
    /// whose sender was dropped without cancelling.
    pub async fn cancelled(&self) {
        if let Some(rx) = &self.cancel {
            let mut rx = rx.clone();
            if *rx.borrow_and_update() {
                return;
            }
            while rx.changed().await.is_ok() {
                if *rx.borrow_and_update() {
                    return;
                }
            }
        }
        std::future::pending::<()>().await
    }
}

/// A request handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Bytes>,
}

/// Body of a response still held by the transport.
///
/// The underlying connection resource is released when the body is
/// dropped, whether or not it was read.
#[async_trait]
pub trait ResponseBody: Send {
    /// Drain the remaining body.
    async fn read_all(&mut self) -> Result<Bytes, TransportError>;
}

#[async_trait]
impl ResponseBody for Bytes {
    async fn read_all(&mut self) -> Result<Bytes, TransportError> {
        Ok(std::mem::take(self))
    }
}

/// Status plus an owned body.
pub struct TransportResponse {
    status: u16,
    body: Box<dyn ResponseBody>,
}

impl TransportResponse {
    pub fn new(status: u16, body: Box<dyn ResponseBody>) -> Self {
        TransportResponse { status, body }
    }

    /// Response with an in-memory body.
    pub fn from_bytes(status: u16, body: impl Into<Bytes>) -> Self {
        Self::new(status, Box::new(body.into()))
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Read the full body, releasing the response.
    pub async fn bytes(mut self) -> Result<Bytes, TransportError> {
        self.body.read_all().await
    }

    /// Release the response without reading the body.
    pub fn release(self) {
        drop(self);
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Request executor the client delegates all I/O to.
///
/// Implementations report any non-2xx response as
/// [`TransportError::Status`]. Deadlines and cancellation carried by
/// `ctx` are theirs to honour.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn execute(
        &self,
        ctx: &RequestContext,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError>;
}
