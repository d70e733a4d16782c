use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::StatusCode;
use lilac_web::transport::{InboundMessage, OutboundMessage, Scope};
use lilac_web::{SharedStage, Stage};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::select;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{error, info, warn};

use crate::codec::{RequestDecoder, ResponseEncoder};
use crate::protocol::{HttpError, Message, ParseError, PayloadItem, PayloadSize, ResponseHead};

/// Body chunks buffered between the socket and the application
const BODY_CHANNEL_SIZE: usize = 8;

/// An HTTP/1.1 connection driving an application.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, ResponseEncoder>,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::new(), 8 * 1024),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
        }
    }

    /// Serves one request with `app` and closes the connection.
    ///
    /// A malformed request is answered with `400`, an unsupported body framing with `501`,
    /// and an application that fails without completing its response with `500`.
    ///
    /// # Errors
    ///
    /// Returns the first failure of the exchange after the client has been answered, if it
    /// still could be.
    pub async fn process(mut self, app: SharedStage) -> Result<(), HttpError> {
        let head = match self.framed_read.next().await {
            Some(Ok(Message::Header(head))) => head,

            Some(Ok(Message::Payload(_))) => {
                error!("receive request body before request head");
                self.send_error_response(StatusCode::BAD_REQUEST).await?;
                return Err(ParseError::invalid_body("need header while receive body").into());
            }

            Some(Err(e)) => {
                error!(cause = %e, "can't receive request head");
                if let Some(status) = e.status() {
                    self.send_error_response(status).await?;
                }
                return Err(e.into());
            }

            None => {
                info!("can't read request, connection closed by peer");
                return Ok(());
            }
        };

        let (body_sender, body_receiver) = mpsc::channel::<InboundMessage>(BODY_CHANNEL_SIZE);
        let (response_sender, mut response_receiver) = mpsc::unbounded_channel::<OutboundMessage>();
        let scope = Scope::Http(head.into_scope());

        // The application may wait for body chunks while the body is still being read from
        // the socket, so both run concurrently until the application is done. A body the
        // application never reads is abandoned, the connection closes afterwards anyway.
        let app_result = {
            let app_future = app.call(scope, Box::new(body_receiver), Box::new(response_sender));
            let body_future = send_body(&mut self.framed_read, body_sender);
            tokio::pin!(app_future, body_future);

            let mut body_finished = false;
            loop {
                select! {
                    biased;
                    result = &mut app_future => break result,
                    body_result = &mut body_future, if !body_finished => {
                        body_finished = true;
                        if let Err(e) = body_result {
                            warn!(cause = %e, "failed to read request body");
                        }
                    }
                }
            }
        };

        let start = response_receiver.try_recv().ok();
        let body = response_receiver.try_recv().ok();
        match start.zip(body).and_then(|(start, body)| ResponseHead::from_messages(start, body)) {
            Some((head, body)) => self.send_response(head, body).await?,
            None => {
                error!("application finished without a complete response");
                self.send_error_response(StatusCode::INTERNAL_SERVER_ERROR).await?;
            }
        }

        app_result.map_err(|source| HttpError::ApplicationError { source })
    }

    async fn send_response(&mut self, head: ResponseHead, body: Bytes) -> Result<(), HttpError> {
        let payload_size = PayloadSize::of(&body);

        self.framed_write.feed(Message::Header((head, payload_size))).await?;
        if !payload_size.is_empty() {
            self.framed_write.feed(Message::from(body)).await?;
        }
        // using send instead of feed, because we want to flush the underlying IO
        self.framed_write.send(Message::Payload(PayloadItem::Eof)).await?;
        self.framed_write.close().await?;
        Ok(())
    }

    async fn send_error_response(&mut self, status: StatusCode) -> Result<(), HttpError> {
        self.send_response(ResponseHead::new(status.as_u16(), vec![]), Bytes::new()).await
    }
}

/// Forwards the request body from the socket to the application, ending with a last chunk
/// or a disconnect.
async fn send_body<R>(
    framed_read: &mut FramedRead<R, RequestDecoder>,
    body_sender: mpsc::Sender<InboundMessage>,
) -> Result<(), ParseError>
where
    R: AsyncRead + Unpin,
{
    loop {
        let (message, result) = match framed_read.next().await {
            Some(Ok(Message::Payload(PayloadItem::Chunk(bytes)))) => (InboundMessage::chunk(bytes), None),
            Some(Ok(Message::Payload(PayloadItem::Eof))) => (InboundMessage::body(Bytes::new()), Some(Ok(()))),
            Some(Ok(Message::Header(_))) => {
                (InboundMessage::Disconnect, Some(Err(ParseError::invalid_body("pipelined requests are not supported"))))
            }
            Some(Err(e)) => (InboundMessage::Disconnect, Some(Err(e))),
            None => (InboundMessage::Disconnect, Some(Ok(()))),
        };

        if body_sender.send(message).await.is_err() {
            // the application dropped its receiving side
            return Ok(());
        }

        if let Some(result) = result {
            return result;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use lilac_web::{handler_fn, App, ApplicationError, BoxError, PathParams, Request};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::io::{duplex, split, AsyncReadExt, AsyncWriteExt};

    async fn hello(_req: Request, params: PathParams) -> Result<Value, BoxError> {
        Ok(json!({ "message": format!("Hello, {}", params.get("name").unwrap_or_default()) }))
    }

    async fn echo(mut req: Request, _params: PathParams) -> Result<Value, BoxError> {
        let payload = req.json().await?;
        if !payload.is_object() {
            return Err(ApplicationError::bad_request("Expected JSON object").into());
        }
        Ok(json!({ "you_sent": payload }))
    }

    fn app() -> SharedStage {
        let app = App::builder()
            .get("/hello/{name}", handler_fn(hello))
            .and_then(|b| b.post("/echo", handler_fn(echo)))
            .unwrap()
            .build();
        Arc::new(app)
    }

    /// Writes `request` to a connection served by `app` and returns everything written back
    async fn roundtrip(app: SharedStage, request: &[u8]) -> (String, Result<(), HttpError>) {
        let (mut client, server) = duplex(64 * 1024);
        let (reader, writer) = split(server);

        client.write_all(request).await.unwrap();
        client.shutdown().await.unwrap();
        let result = HttpConnection::new(reader, writer).process(app).await;

        let mut response = String::new();
        client.read_to_string(&mut response).await.unwrap();
        (response, result)
    }

    #[tokio::test]
    async fn serves_a_get_request() {
        let request = indoc! {"
        GET /hello/Ada HTTP/1.1
        Host: localhost

        "};
        let (response, result) = roundtrip(app(), request.as_bytes()).await;

        result.unwrap();
        assert_eq!(
            response,
            "HTTP/1.1 200 OK\r\ncontent-type: application/json; charset=utf-8\r\ncontent-length: 24\r\nconnection: close\r\n\r\n{\"message\":\"Hello, Ada\"}"
        );
    }

    #[tokio::test]
    async fn streams_the_body_to_the_application() {
        let request = "POST /echo HTTP/1.1\r\nContent-Length: 7\r\n\r\n{\"k\":1}";
        let (response, result) = roundtrip(app(), request.as_bytes()).await;

        result.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.ends_with("\r\n\r\n{\"you_sent\":{\"k\":1}}"));
    }

    #[tokio::test]
    async fn application_errors_keep_their_status() {
        let request = "POST /echo HTTP/1.1\r\nContent-Length: 5\r\n\r\n[1,2]";
        let (response, _result) = roundtrip(app(), request.as_bytes()).await;

        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(response.ends_with("{\"detail\":\"Expected JSON object\"}"));
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        let (response, result) = roundtrip(app(), b"DELETE /hello/Ada HTTP/1.1\r\n\r\n").await;

        result.unwrap();
        assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(response.ends_with("\r\n\r\nNot Found"));
    }

    #[tokio::test]
    async fn malformed_requests_are_rejected() {
        let (response, result) = roundtrip(app(), b"NOT AN HTTP REQUEST\r\n\r\n").await;

        assert!(matches!(result, Err(HttpError::RequestError { .. })));
        assert_eq!(response, "HTTP/1.1 400 Bad Request\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
    }

    #[tokio::test]
    async fn chunked_requests_are_not_implemented() {
        let request = "POST /echo HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n0\r\n\r\n";
        let (response, result) = roundtrip(app(), request.as_bytes()).await;

        assert!(matches!(result, Err(HttpError::RequestError { source: ParseError::UnsupportedTransferEncoding })));
        assert!(response.starts_with("HTTP/1.1 501 Not Implemented\r\n"));
    }

    #[tokio::test]
    async fn incomplete_application_gets_internal_server_error() {
        struct Silent;

        #[async_trait::async_trait]
        impl Stage for Silent {
            async fn call(
                &self,
                _scope: Scope,
                _receive: lilac_web::transport::BoxInbound,
                _send: lilac_web::transport::BoxOutbound,
            ) -> Result<(), BoxError> {
                Err("nothing to say".into())
            }
        }

        let (response, result) = roundtrip(Arc::new(Silent), b"GET / HTTP/1.1\r\n\r\n").await;

        assert!(matches!(result, Err(HttpError::ApplicationError { .. })));
        assert_eq!(response, "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
    }

    #[tokio::test]
    async fn closed_connection_is_not_an_error() {
        let (response, result) = roundtrip(app(), b"").await;

        result.unwrap();
        assert!(response.is_empty());
    }
}
