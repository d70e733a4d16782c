//! A small HTTP/1.1 server for lilac applications.
//!
//! The server accepts TCP connections, decodes one request per connection with
//! [`httparse`], and drives a [`lilac_web::Stage`] (usually a [`lilac_web::App`]) through
//! the `(scope, receive, send)` connection contract:
//!
//! - the request head becomes an HTTP scope, with lowercase header names
//! - the `content-length` body is streamed to the application as it arrives
//! - the application's response start and body are encoded with `content-length` and
//!   `connection: close`
//!
//! Malformed requests are answered with `400`, `transfer-encoding` bodies with `501`.
//!
//! # Modules
//!
//! - [`codec`]: request decoding and response encoding on top of `tokio_util::codec`
//! - [`connection`]: serving one connection
//! - [`protocol`]: message types and errors

pub mod codec;
pub mod connection;
pub mod protocol;

mod server;
mod utils;

pub use server::Server;
pub use server::ServerBuildError;
pub use server::ServerBuilder;

pub(crate) use utils::ensure;
