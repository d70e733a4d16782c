//! The connection contract between the core and the network server that drives it.
//!
//! A connection is handed over as a triple:
//! - a [`Scope`] describing what kind of connection it is and, for HTTP, the request metadata
//! - an [`Inbound`] side that yields the request body as a sequence of [`InboundMessage`]s
//! - an [`Outbound`] side that accepts exactly two [`OutboundMessage`]s per request:
//!   [`OutboundMessage::ResponseStart`] followed by [`OutboundMessage::ResponseBody`]
//!
//! Any server that can produce this triple can host an application; `tokio` channels
//! implement both sides so the pipeline can be driven in-process.

use crate::error::TransportError;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

pub type BoxInbound = Box<dyn Inbound>;
pub type BoxOutbound = Box<dyn Outbound>;

/// Describes one incoming connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Http(HttpScope),
    /// Any other connection type, e.g. `lifespan` or `websocket`.
    Other(String),
}

impl Scope {
    /// The connection type, `http` for [`Scope::Http`].
    pub fn kind(&self) -> &str {
        match self {
            Scope::Http(_) => "http",
            Scope::Other(kind) => kind,
        }
    }

    #[inline]
    pub fn is_http(&self) -> bool {
        matches!(self, Scope::Http(_))
    }

    pub fn as_http(&self) -> Option<&HttpScope> {
        match self {
            Scope::Http(http) => Some(http),
            Scope::Other(_) => None,
        }
    }
}

impl From<HttpScope> for Scope {
    fn from(http: HttpScope) -> Self {
        Scope::Http(http)
    }
}

/// Request metadata of an HTTP connection.
///
/// `headers` keeps the raw byte pairs in arrival order, duplicates included.
/// `query_string` is the raw part after `?`, without the `?`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpScope {
    pub method: String,
    pub path: String,
    pub headers: Vec<(Bytes, Bytes)>,
    pub query_string: Bytes,
}

impl HttpScope {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self { method: method.into(), path: path.into(), headers: Vec::new(), query_string: Bytes::new() }
    }

    pub fn with_header(mut self, name: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_query_string(mut self, query_string: impl Into<Bytes>) -> Self {
        self.query_string = query_string.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// A piece of the request body; `more_body` is false on the last piece.
    Request { body: Bytes, more_body: bool },
    /// The client went away.
    Disconnect,
}

impl InboundMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            InboundMessage::Request { .. } => "http.request",
            InboundMessage::Disconnect => "http.disconnect",
        }
    }

    /// A whole request body delivered in one message.
    pub fn body(body: impl Into<Bytes>) -> Self {
        InboundMessage::Request { body: body.into(), more_body: false }
    }

    /// A piece of the request body that will be followed by more.
    pub fn chunk(body: impl Into<Bytes>) -> Self {
        InboundMessage::Request { body: body.into(), more_body: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    ResponseStart { status: u16, headers: Vec<(Bytes, Bytes)> },
    ResponseBody { body: Bytes },
}

impl OutboundMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::ResponseStart { .. } => "http.response.start",
            OutboundMessage::ResponseBody { .. } => "http.response.body",
        }
    }
}

/// The receiving side of a connection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Inbound: Send {
    async fn receive(&mut self) -> Result<InboundMessage, TransportError>;
}

/// The sending side of a connection.
#[async_trait]
pub trait Outbound: Send {
    async fn send(&mut self, message: OutboundMessage) -> Result<(), TransportError>;
}

#[async_trait]
impl Inbound for mpsc::UnboundedReceiver<InboundMessage> {
    async fn receive(&mut self) -> Result<InboundMessage, TransportError> {
        self.recv().await.ok_or(TransportError::Closed)
    }
}

#[async_trait]
impl Inbound for mpsc::Receiver<InboundMessage> {
    async fn receive(&mut self) -> Result<InboundMessage, TransportError> {
        self.recv().await.ok_or(TransportError::Closed)
    }
}

#[async_trait]
impl Outbound for mpsc::UnboundedSender<OutboundMessage> {
    async fn send(&mut self, message: OutboundMessage) -> Result<(), TransportError> {
        mpsc::UnboundedSender::send(self, message).map_err(|_closed| TransportError::Closed)
    }
}

#[async_trait]
impl Outbound for mpsc::Sender<OutboundMessage> {
    async fn send(&mut self, message: OutboundMessage) -> Result<(), TransportError> {
        mpsc::Sender::send(self, message).await.map_err(|_closed| TransportError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_kind() {
        assert_eq!(Scope::from(HttpScope::new("GET", "/")).kind(), "http");
        assert_eq!(Scope::Other("lifespan".into()).kind(), "lifespan");
        assert!(Scope::Other("websocket".into()).as_http().is_none());
    }

    #[tokio::test]
    async fn channel_transport() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(InboundMessage::body("hello")).unwrap();
        drop(tx);

        assert_eq!(rx.receive().await.unwrap(), InboundMessage::body("hello"));
        assert!(matches!(rx.receive().await, Err(TransportError::Closed)));

        let (mut tx, mut rx) = mpsc::unbounded_channel();
        Outbound::send(&mut tx, OutboundMessage::ResponseBody { body: Bytes::from_static(b"ok") }).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().kind(), "http.response.body");
    }
}
