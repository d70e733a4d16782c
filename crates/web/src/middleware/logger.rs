use crate::error::BoxError;
use crate::middleware::{Middleware, SharedStage, Stage};
use crate::transport::{BoxInbound, BoxOutbound, Scope};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Logs the method and path of every HTTP request before passing it on.
///
/// The response is never touched, other connection types pass through silently.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestLogger;

impl RequestLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for RequestLogger {
    fn wrap(&self, next: SharedStage) -> SharedStage {
        Arc::new(LoggedStage { next })
    }
}

struct LoggedStage {
    next: SharedStage,
}

#[async_trait]
impl Stage for LoggedStage {
    async fn call(&self, scope: Scope, receive: BoxInbound, send: BoxOutbound) -> Result<(), BoxError> {
        if let Scope::Http(http) = &scope {
            info!("{} {}", http.method, http.path);
        }
        self.next.call(scope, receive, send).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{compose, stage_fn};
    use crate::transport::{HttpScope, InboundMessage, Outbound, OutboundMessage};
    use bytes::Bytes;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn passes_messages_through_unchanged() {
        let inner: SharedStage = Arc::new(stage_fn(|_scope, _receive, mut send: BoxOutbound| async move {
            send.send(OutboundMessage::ResponseStart { status: 201, headers: vec![] }).await?;
            send.send(OutboundMessage::ResponseBody { body: Bytes::from_static(b"made") }).await?;
            Ok::<(), BoxError>(())
        }));
        let pipeline = compose(inner, &[Box::new(RequestLogger::new()) as Box<dyn Middleware>]);

        let (_inbound_tx, inbound_rx) = mpsc::unbounded_channel::<InboundMessage>();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<OutboundMessage>();
        pipeline
            .call(HttpScope::new("POST", "/things").into(), Box::new(inbound_rx), Box::new(outbound_tx))
            .await
            .unwrap();

        assert_eq!(outbound_rx.recv().await.unwrap(), OutboundMessage::ResponseStart { status: 201, headers: vec![] });
        assert_eq!(
            outbound_rx.recv().await.unwrap(),
            OutboundMessage::ResponseBody { body: Bytes::from_static(b"made") }
        );
        assert!(outbound_rx.recv().await.is_none());
    }
}
