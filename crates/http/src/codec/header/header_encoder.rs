//! HTTP response head encoder.
//!
//! Writes the status line, the application's headers in order, then `content-length`
//! and `connection: close`. Framing headers sent by the application are dropped so the
//! announced length always matches the body that follows.

use crate::ensure;
use crate::protocol::{PayloadSize, ResponseHead, SendError};

use bytes::{BufMut, BytesMut};
use http::header::{CONNECTION, CONTENT_LENGTH, TRANSFER_ENCODING};
use http::StatusCode;
use std::io;
use std::io::Write;
use tokio_util::codec::Encoder;

/// Initial buffer size allocated for head serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

/// Encoder for HTTP response heads implementing the [`Encoder`] trait.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderEncoder;

impl Encoder<(ResponseHead, PayloadSize)> for HeaderEncoder {
    type Error = SendError;

    /// Encodes a response head into `dst`.
    ///
    /// # Errors
    ///
    /// Returns error if the status code is outside `100..=999` or a header contains a
    /// line break.
    fn encode(&mut self, item: (ResponseHead, PayloadSize), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (head, payload_size) = item;
        let status = StatusCode::from_u16(head.status()).map_err(|_invalid| SendError::invalid_status(head.status()))?;

        dst.reserve(INIT_HEADER_SIZE);
        write!(FastWrite(dst), "HTTP/1.1 {} {}\r\n", status.as_str(), status.canonical_reason().unwrap_or(""))?;

        for (name, value) in head.headers() {
            if is_framing_header(name) {
                continue;
            }
            ensure!(
                !has_line_break(name) && !has_line_break(value),
                SendError::invalid_header(format!("line break in header '{}'", String::from_utf8_lossy(name)))
            );

            dst.put_slice(name);
            dst.put_slice(b": ");
            dst.put_slice(value);
            dst.put_slice(b"\r\n");
        }

        write!(FastWrite(dst), "content-length: {}\r\n", payload_size.length())?;
        dst.put_slice(b"connection: close\r\n\r\n");
        Ok(())
    }
}

fn is_framing_header(name: &[u8]) -> bool {
    [CONTENT_LENGTH, TRANSFER_ENCODING, CONNECTION].iter().any(|framing| name.eq_ignore_ascii_case(framing.as_str().as_bytes()))
}

fn has_line_break(bytes: &[u8]) -> bool {
    bytes.iter().any(|b| matches!(b, b'\r' | b'\n'))
}

/// Fast writer implementation for writing to BytesMut.
///
/// This avoids going through an intermediate `String` when formatting into the buffer.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn encode(head: ResponseHead, payload_size: PayloadSize) -> Result<String, SendError> {
        let mut dst = BytesMut::new();
        HeaderEncoder.encode((head, payload_size), &mut dst)?;
        Ok(String::from_utf8(dst.to_vec()).unwrap())
    }

    #[test]
    fn status_line_and_headers() {
        let head = ResponseHead::new(
            200,
            vec![(Bytes::from_static(b"content-type"), Bytes::from_static(b"application/json; charset=utf-8"))],
        );

        assert_eq!(
            encode(head, PayloadSize::Length(24)).unwrap(),
            "HTTP/1.1 200 OK\r\ncontent-type: application/json; charset=utf-8\r\ncontent-length: 24\r\nconnection: close\r\n\r\n"
        );
    }

    #[test]
    fn framing_headers_are_replaced() {
        let head = ResponseHead::new(
            404,
            vec![
                (Bytes::from_static(b"Content-Length"), Bytes::from_static(b"999")),
                (Bytes::from_static(b"connection"), Bytes::from_static(b"keep-alive")),
                (Bytes::from_static(b"x-trace"), Bytes::from_static(b"1")),
            ],
        );

        assert_eq!(
            encode(head, PayloadSize::Empty).unwrap(),
            "HTTP/1.1 404 Not Found\r\nx-trace: 1\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
        );
    }

    #[test]
    fn uncommon_status_has_empty_reason() {
        let head = ResponseHead::new(299, vec![]);
        assert!(encode(head, PayloadSize::Empty).unwrap().starts_with("HTTP/1.1 299 \r\n"));
    }

    #[test]
    fn invalid_heads_are_rejected() {
        assert!(matches!(encode(ResponseHead::new(42, vec![]), PayloadSize::Empty), Err(SendError::InvalidStatus { status: 42 })));

        let head = ResponseHead::new(200, vec![(Bytes::from_static(b"x-evil"), Bytes::from_static(b"a\r\nset-cookie: b"))]);
        assert!(matches!(encode(head, PayloadSize::Empty), Err(SendError::InvalidHeader { .. })));
    }
}
