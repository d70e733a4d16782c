//! HTTP connection handling module
//!
//! [`HttpConnection`] serves exactly one request per TCP connection: it decodes the head,
//! hands the application a `(scope, receive, send)` triple, streams the body to it while
//! it runs, then writes the response and closes the connection.

mod http_connection;

pub use http_connection::HttpConnection;
