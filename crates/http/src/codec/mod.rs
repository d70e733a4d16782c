//! HTTP codec module for encoding and decoding HTTP/1.1 messages
//!
//! - Request handling: [`RequestDecoder`] decodes a head with the [`header`] decoder,
//!   then its `content-length` body with the [`body`] decoder
//! - Response handling: [`ResponseEncoder`] writes a head with the [`header`] encoder,
//!   then the body bytes
//!
//! Both work on [`Message`](crate::protocol::Message)s and plug into
//! `tokio_util::codec::{FramedRead, FramedWrite}`.

mod body;
mod header;
mod request_decoder;
mod response_encoder;

pub use request_decoder::RequestDecoder;
pub use response_encoder::ResponseEncoder;
