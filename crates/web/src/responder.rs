//! Response handling module that converts handler results into HTTP responses.
//!
//! This module provides the [`Responder`] trait which defines how different types
//! can be converted into a [`Response`]. A handler may return a finished response or
//! any value with a responder implementation; the value is then encoded according to
//! its shape, e.g. a JSON value becomes a JSON response.

use crate::body::Body;
use crate::error::ApplicationError;
use crate::response::Response;
use bytes::Bytes;
use http::StatusCode;
use serde_json::{json, Value};

/// A trait for types that can be converted into HTTP responses.
///
/// Types implementing this trait can be returned directly from request handlers
/// and will be automatically converted into HTTP responses.
pub trait Responder {
    fn into_response(self) -> Response;
}

/// Implementation for Response allows passing through pre-built responses.
impl Responder for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl Responder for Body {
    fn into_response(self) -> Response {
        Response::new(self)
    }
}

impl Responder for Value {
    fn into_response(self) -> Response {
        Response::json(self)
    }
}

impl Responder for String {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}

impl Responder for &'static str {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}

impl Responder for Bytes {
    fn into_response(self) -> Response {
        Response::bytes(self)
    }
}

impl Responder for Vec<u8> {
    fn into_response(self) -> Response {
        Response::bytes(self)
    }
}

/// Implementation for unit type () returns an empty response.
impl Responder for () {
    fn into_response(self) -> Response {
        Response::empty()
    }
}

/// Implementation for Option allows handlers to return Option types.
/// None case returns an empty response.
impl<T: Responder> Responder for Option<T> {
    fn into_response(self) -> Response {
        match self {
            Some(t) => t.into_response(),
            None => Response::empty(),
        }
    }
}

/// Implementation for (StatusCode, T) tuple allows setting a status code
/// along with the response content.
impl<T: Responder> Responder for (StatusCode, T) {
    fn into_response(self) -> Response {
        let (status, responder) = self;
        responder.into_response().with_status(status)
    }
}

/// The error's status with a `{"detail": ...}` JSON body.
impl Responder for ApplicationError {
    fn into_response(self) -> Response {
        Response::json(json!({ "detail": self.detail() })).with_status(self.status())
    }
}
