//! The decoded head of an HTTP request.

use bytes::Bytes;
use lilac_web::transport::HttpScope;

/// Method, target and headers of a request, plus the announced body length.
///
/// Header names are lowercase, values are kept as received. The request target is split
/// at the first `?` into the path and the raw query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    method: String,
    path: String,
    query_string: Bytes,
    headers: Vec<(Bytes, Bytes)>,
    content_length: u64,
}

impl RequestHead {
    pub fn new(method: String, target: &str, headers: Vec<(Bytes, Bytes)>, content_length: u64) -> Self {
        let (path, query_string) = match target.split_once('?') {
            Some((path, query)) => (path, Bytes::copy_from_slice(query.as_bytes())),
            None => (target, Bytes::new()),
        };
        Self { method, path: path.to_owned(), query_string, headers, content_length }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_string(&self) -> &Bytes {
        &self.query_string
    }

    pub fn headers(&self) -> &[(Bytes, Bytes)] {
        &self.headers
    }

    /// Returns the first value of the lowercase header `name`
    pub fn header(&self, name: &str) -> Option<&Bytes> {
        self.headers.iter().find(|(header_name, _)| header_name.as_ref() == name.as_bytes()).map(|(_, value)| value)
    }

    /// The number of body bytes following the head
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Converts the head into the scope handed to the application
    pub fn into_scope(self) -> HttpScope {
        HttpScope { method: self.method, path: self.path, headers: self.headers, query_string: self.query_string }
    }
}
