use bytes::Bytes;
use serde_json::Value;

/// The content of a response, chosen explicitly by the caller.
///
/// Each variant decides how the bytes are produced and which `content-type` is attached,
/// see [`ResponseBuilder::body`](crate::response::ResponseBuilder::body).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Body {
    /// A JSON document, encoded with `application/json; charset=utf-8`
    Json(Value),
    /// UTF-8 text, encoded with `text/plain; charset=utf-8` unless a media type is given
    Text(String),
    /// Raw bytes passed through unchanged
    Bytes(Bytes),
    /// No content at all
    #[default]
    Empty,
}

impl Body {
    pub fn empty() -> Self {
        Self::Empty
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Text(value)
    }
}

impl From<&'static str> for Body {
    fn from(value: &'static str) -> Self {
        Body::Text(value.to_owned())
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        Body::Bytes(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Body::Bytes(Bytes::from(value))
    }
}

impl From<()> for Body {
    fn from(_: ()) -> Self {
        Self::empty()
    }
}

impl<B: Into<Body>> From<Option<B>> for Body {
    fn from(option: Option<B>) -> Self {
        match option {
            Some(body) => body.into(),
            None => Self::empty(),
        }
    }
}
