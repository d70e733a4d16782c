//! The outbound side of an exchange.
//!
//! A [`Response`] is a status, an ordered list of headers (duplicates allowed, all emitted)
//! and the body bytes. It is built once from a [`Body`] and is not changed after being
//! handed to the sending stage.

use crate::body::Body;
use crate::transport::OutboundMessage;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderName, HeaderValue, StatusCode};
use mime::Mime;
use serde_json::Value;

const APPLICATION_JSON_UTF_8: &str = "application/json; charset=utf-8";
const TEXT_PLAIN_UTF_8: &str = "text/plain; charset=utf-8";

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
}

impl Response {
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::default()
    }

    /// Creates a `200 OK` response from any body
    pub fn new(body: impl Into<Body>) -> Self {
        Self::builder().body(body)
    }

    pub fn json(value: Value) -> Self {
        Self::new(Body::Json(value))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Body::Text(text.into()))
    }

    pub fn bytes(bytes: impl Into<Bytes>) -> Self {
        Self::new(Body::Bytes(bytes.into()))
    }

    pub fn empty() -> Self {
        Self::new(Body::Empty)
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Appends a header, keeping any existing header of the same name
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }

    /// Returns the first value of the header `name`
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.iter().find(|(header_name, _)| header_name.as_str().eq_ignore_ascii_case(name)).map(|(_, value)| value)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Splits the response into the start message and the body message, in sending order
    pub fn into_messages(self) -> (OutboundMessage, OutboundMessage) {
        let headers = self
            .headers
            .iter()
            .map(|(name, value)| (Bytes::copy_from_slice(name.as_str().as_bytes()), Bytes::copy_from_slice(value.as_bytes())))
            .collect();

        (
            OutboundMessage::ResponseStart { status: self.status.as_u16(), headers },
            OutboundMessage::ResponseBody { body: self.body },
        )
    }
}

#[derive(Debug, Default)]
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    media_type: Option<Mime>,
}

impl ResponseBuilder {
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    /// Sets the `content-type` used for text, bytes and empty bodies
    pub fn media_type(mut self, media_type: Mime) -> Self {
        self.media_type = Some(media_type);
        self
    }

    /// Encodes `body` and finishes the response.
    ///
    /// The `content-type` header, if any, is appended after the headers set on the builder:
    /// - json: always `application/json; charset=utf-8`
    /// - text: the media type, or `text/plain; charset=utf-8`
    /// - bytes and empty: the media type, if one was set
    pub fn body(self, body: impl Into<Body>) -> Response {
        let Self { status, mut headers, media_type } = self;
        let media_type = media_type.and_then(|media_type| HeaderValue::from_str(media_type.as_ref()).ok());

        let (content_type, bytes) = match body.into() {
            Body::Json(value) => (Some(HeaderValue::from_static(APPLICATION_JSON_UTF_8)), Bytes::from(value.to_string())),
            Body::Text(text) => (Some(media_type.unwrap_or_else(|| HeaderValue::from_static(TEXT_PLAIN_UTF_8))), Bytes::from(text)),
            Body::Bytes(bytes) => (media_type, bytes),
            Body::Empty => (media_type, Bytes::new()),
        };

        if let Some(content_type) = content_type {
            headers.push((CONTENT_TYPE, content_type));
        }

        Response { status, headers, body: bytes }
    }
}
