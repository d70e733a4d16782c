//! Request handling module that provides access to HTTP request information and path parameters.
//!
//! This module contains the core types for working with HTTP requests in the web framework:
//! - `Request`: a view over one inbound exchange, with a lazily assembled, cached body
//! - `PathParams`: the values captured by a route template's `{name}` placeholders

use crate::error::RequestError;
use crate::transport::{BoxInbound, HttpScope, InboundMessage};
use bytes::{Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Represents one HTTP request as seen by a handler.
///
/// Metadata accessors are pure projections of the [`HttpScope`]. The body is read from the
/// connection on first access and cached, so every body accessor observes the same bytes.
pub struct Request {
    scope: HttpScope,
    method: String,
    receive: BoxInbound,
    body: Option<Bytes>,
    /// chunks received before a failed read
    partial: BytesMut,
}

impl Request {
    /// Creates a request over the given scope and the receiving side of its connection
    pub fn new(scope: HttpScope, receive: BoxInbound) -> Self {
        let method = scope.method.to_ascii_uppercase();
        Self { scope, method, receive, body: None, partial: BytesMut::new() }
    }

    /// Returns the underlying scope
    pub fn scope(&self) -> &HttpScope {
        &self.scope
    }

    /// Returns the HTTP method, uppercased
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the path exactly as the transport delivered it
    pub fn path(&self) -> &str {
        &self.scope.path
    }

    /// Returns the request headers keyed by lowercase name.
    ///
    /// When a header is repeated the last value wins.
    pub fn headers(&self) -> HashMap<String, String> {
        self.scope
            .headers
            .iter()
            .map(|(name, value)| {
                (String::from_utf8_lossy(name).to_ascii_lowercase(), String::from_utf8_lossy(value).into_owned())
            })
            .collect()
    }

    /// Returns the last value of the header `name`, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<String> {
        self.scope
            .headers
            .iter()
            .rev()
            .find(|(header_name, _)| header_name.eq_ignore_ascii_case(name.as_bytes()))
            .map(|(_, value)| String::from_utf8_lossy(value).into_owned())
    }

    /// Returns the query parameters parsed from the raw query string
    pub fn query_params(&self) -> HashMap<String, String> {
        parse_query(&String::from_utf8_lossy(&self.scope.query_string))
    }

    /// Returns the request body.
    ///
    /// The first call drains the connection until the last body message; later calls
    /// return the cached bytes without touching the connection again.
    ///
    /// When the connection fails midway the chunks received so far are kept, and calling
    /// `body` again resumes after them, so no chunk is ever received twice.
    pub async fn body(&mut self) -> Result<Bytes, RequestError> {
        if let Some(body) = &self.body {
            return Ok(body.clone());
        }

        loop {
            match self.receive.receive().await? {
                InboundMessage::Request { body, more_body } => {
                    self.partial.extend_from_slice(&body);
                    if !more_body {
                        break;
                    }
                }
                InboundMessage::Disconnect => break,
            }
        }

        let body = std::mem::take(&mut self.partial).freeze();
        self.body = Some(body.clone());
        Ok(body)
    }

    /// Returns the body decoded as UTF-8 text
    pub async fn text(&mut self) -> Result<String, RequestError> {
        let body = self.body().await?;
        Ok(std::str::from_utf8(&body)?.to_owned())
    }

    /// Returns the body parsed as JSON, [`Value::Null`] when the body is empty
    pub async fn json(&mut self) -> Result<Value, RequestError> {
        let body = self.body().await?;
        if body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&body)?)
    }

    /// Returns the body parsed as JSON into `T`
    pub async fn json_as<T: DeserializeOwned>(&mut self) -> Result<T, RequestError> {
        let value = self.json().await?;
        Ok(serde_json::from_value(value)?)
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.scope.path)
            .field("body_read", &self.body.is_some())
            .finish_non_exhaustive()
    }
}

/// Splits on `&`, then on the first `=`; a bare key maps to an empty value and later keys win.
fn parse_query(raw: &str) -> HashMap<String, String> {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_owned(), value.to_owned()),
            None => (pair.to_owned(), String::new()),
        })
        .collect()
}

/// Represents path parameters extracted from the URL path of an HTTP request.
///
/// Path parameters are named segments in the URL path that can be extracted and accessed
/// by name. For example, in the path "/users/{id}", "id" is a path parameter.
/// Entries keep the order of the placeholders in the template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    entries: Vec<(String, String)>,
}

impl PathParams {
    /// Creates an empty PathParams instance with no parameters
    #[inline]
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity) }
    }

    /// Sets `name` to `value`, replacing the value of an existing entry in place
    pub(crate) fn insert(&mut self, name: String, value: String) {
        match self.entries.iter_mut().find(|(entry_name, _)| *entry_name == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Returns true if there are no path parameters
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of path parameters
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Gets the value of a path parameter by its name
    /// Returns None if the parameter doesn't exist
    #[inline]
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        let key = key.as_ref();
        self.entries.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str())
    }

    /// Iterates over `(name, value)` pairs in template order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = PathParams::empty();
        for (name, value) in iter {
            params.insert(name.into(), value.into());
        }
        params
    }
}
