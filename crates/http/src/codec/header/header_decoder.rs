//! HTTP request head decoder.
//!
//! Parses the request line and header fields with `httparse` and copies them out into an
//! owned [`RequestHead`]. Header names are lowercased on the way.
//!
//! # Limits
//!
//! - Maximum number of headers: 64
//! - Maximum head size: 8KB
//! - Only HTTP/1.0 and HTTP/1.1
//! - Bodies must be framed by `content-length`; any `transfer-encoding` is rejected

use bytes::{Buf, Bytes, BytesMut};
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use httparse::{Error, Status};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::{ParseError, RequestHead};

/// Maximum number of headers allowed in a request
const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the entire head
const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Decoder for HTTP request heads implementing the [`Decoder`] trait.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderDecoder;

impl Decoder for HeaderDecoder {
    type Item = RequestHead;
    type Error = ParseError;

    /// Attempts to decode a request head from `src`.
    ///
    /// Returns `Ok(None)` when more bytes are needed. On success the head bytes are
    /// consumed from `src` and the body bytes, if any, are left in place.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the head is malformed, exceeds the limits above, uses an
    /// unsupported version or carries an unusable body framing.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let mut req = httparse::Request::new(&mut headers);

        let parsed_result = req.parse(src).map_err(|e| match e {
            Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
            e => ParseError::invalid_header(e.to_string()),
        });

        let body_offset = match parsed_result? {
            Status::Complete(body_offset) => body_offset,
            Status::Partial => {
                ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                return Ok(None);
            }
        };

        trace!(head_size = body_offset, "parsed request head");
        ensure!(body_offset <= MAX_HEADER_BYTES, ParseError::too_large_header(body_offset, MAX_HEADER_BYTES));

        match req.version {
            Some(0 | 1) => {}
            // HTTP/2 and HTTP/3 are not supported
            version => return Err(ParseError::InvalidVersion(version)),
        }

        let method = req.method.ok_or(ParseError::InvalidMethod)?.to_owned();
        let target = req.path.ok_or(ParseError::InvalidUri)?;
        ensure!(target.starts_with('/'), ParseError::InvalidUri);

        let headers: Vec<(Bytes, Bytes)> = req
            .headers
            .iter()
            .map(|header| (Bytes::from(header.name.to_ascii_lowercase()), Bytes::copy_from_slice(header.value)))
            .collect();

        let content_length = parse_content_length(&headers)?;
        let head = RequestHead::new(method, target, headers, content_length);

        src.advance(body_offset);
        Ok(Some(head))
    }
}

/// Reads the body length from the headers, 0 when absent.
///
/// # Errors
///
/// Returns `ParseError` when `transfer-encoding` is present, or when `content-length` is
/// not a number or is repeated with different values.
fn parse_content_length(headers: &[(Bytes, Bytes)]) -> Result<u64, ParseError> {
    // refer: https://www.rfc-editor.org/rfc/rfc9112.html#name-transfer-encoding
    let has_transfer_encoding = headers.iter().any(|(name, _)| name.as_ref() == TRANSFER_ENCODING.as_str().as_bytes());
    ensure!(!has_transfer_encoding, ParseError::UnsupportedTransferEncoding);

    let mut content_length = None;
    for (_, value) in headers.iter().filter(|(name, _)| name.as_ref() == CONTENT_LENGTH.as_str().as_bytes()) {
        let length = std::str::from_utf8(value)
            .ok()
            .map(str::trim)
            .filter(|value| !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|value| value.parse::<u64>().ok())
            .ok_or_else(|| ParseError::invalid_content_length(format!("'{}'", String::from_utf8_lossy(value))))?;

        match content_length {
            Some(previous) if previous != length => {
                return Err(ParseError::invalid_content_length("conflicting content-length values"));
            }
            _ => content_length = Some(length),
        }
    }

    Ok(content_length.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn header<'a>(head: &'a RequestHead, name: &str) -> Option<&'a [u8]> {
        head.header(name).map(Bytes::as_ref)
    }

    #[test]
    fn from_curl() {
        let str = indoc! {r##"
        GET /index.html HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*

        "##};

        let mut buf = BytesMut::from(str);

        let head = HeaderDecoder.decode(&mut buf).unwrap().unwrap();

        assert_eq!(head.method(), "GET");
        assert_eq!(head.path(), "/index.html");
        assert!(head.query_string().is_empty());
        assert_eq!(head.content_length(), 0);

        assert_eq!(head.headers().len(), 3);
        assert_eq!(header(&head, "host"), Some(&b"127.0.0.1:8080"[..]));
        assert_eq!(header(&head, "user-agent"), Some(&b"curl/7.79.1"[..]));
        assert_eq!(header(&head, "accept"), Some(&b"*/*"[..]));
        assert!(buf.is_empty());
    }

    #[test]
    fn from_edge() {
        let str = indoc! {r##"
        GET /index/?a=1&b=2&a=3 HTTP/1.1
        Host: 127.0.0.1:8080
        Connection: keep-alive
        Cache-Control: max-age=0
        sec-ch-ua: "#Not_A Brand";v="99", "Microsoft Edge";v="109", "Chromium";v="109"
        sec-ch-ua-mobile: ?0
        sec-ch-ua-platform: "macOS"
        Upgrade-Insecure-Requests: 1
        Accept-Encoding: gzip, deflate, br
        Accept-Language: zh-CN,zh;q=0.9,en-US;q=0.8,en;q=0.7

        "##};

        let mut buf = BytesMut::from(str);

        let head = HeaderDecoder.decode(&mut buf).unwrap().unwrap();

        assert_eq!(head.path(), "/index/");
        assert_eq!(head.query_string().as_ref(), b"a=1&b=2&a=3");
        assert_eq!(head.headers().len(), 9);

        assert_eq!(header(&head, "connection"), Some(&b"keep-alive"[..]));
        assert_eq!(
            header(&head, "sec-ch-ua"),
            Some(&br##""#Not_A Brand";v="99", "Microsoft Edge";v="109", "Chromium";v="109""##[..])
        );
        assert_eq!(header(&head, "sec-ch-ua-platform"), Some(&b"\"macOS\""[..]));
        assert_eq!(header(&head, "upgrade-insecure-requests"), Some(&b"1"[..]));
        assert_eq!(header(&head, "accept-language"), Some(&b"zh-CN,zh;q=0.9,en-US;q=0.8,en;q=0.7"[..]));
    }

    #[test]
    fn body_is_left_in_the_buffer() {
        let mut buf = BytesMut::from("POST /echo HTTP/1.1\r\nContent-Length: 7\r\n\r\n{\"k\":1}");

        let head = HeaderDecoder.decode(&mut buf).unwrap().unwrap();

        assert_eq!(head.method(), "POST");
        assert_eq!(head.content_length(), 7);
        assert_eq!(&buf[..], b"{\"k\":1}");
    }

    #[test]
    fn partial_head_needs_more_bytes() {
        let mut buf = BytesMut::from("GET /index.html HTTP/1.1\r\nHost: 127.0");
        assert!(HeaderDecoder.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 37);
    }

    #[test]
    fn oversized_head_is_rejected() {
        let mut buf = BytesMut::from("GET / HTTP/1.1\r\n");
        buf.extend_from_slice(format!("X-Padding: {}\r\n", "a".repeat(MAX_HEADER_BYTES)).as_bytes());

        assert!(matches!(HeaderDecoder.decode(&mut buf), Err(ParseError::TooLargeHeader { .. })));
    }

    #[test]
    fn too_many_headers_are_rejected() {
        let mut head = String::from("GET / HTTP/1.1\r\n");
        for i in 0..=MAX_HEADER_NUM {
            head.push_str(&format!("X-Header-{i}: {i}\r\n"));
        }
        head.push_str("\r\n");

        let mut buf = BytesMut::from(head.as_str());
        assert!(matches!(HeaderDecoder.decode(&mut buf), Err(ParseError::TooManyHeaders { .. })));
    }

    #[test]
    fn transfer_encoding_is_rejected() {
        let mut buf = BytesMut::from("POST /echo HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n");

        let error = HeaderDecoder.decode(&mut buf).unwrap_err();
        assert!(matches!(error, ParseError::UnsupportedTransferEncoding));
        assert_eq!(error.status(), Some(http::StatusCode::NOT_IMPLEMENTED));
    }

    #[test]
    fn bad_content_length_is_rejected() {
        for value in ["abc", "-1", "", "1, 2"] {
            let mut buf = BytesMut::from(format!("POST / HTTP/1.1\r\nContent-Length: {value}\r\n\r\n").as_str());
            assert!(matches!(HeaderDecoder.decode(&mut buf), Err(ParseError::InvalidContentLength { .. })), "{value}");
        }

        let mut buf = BytesMut::from("POST / HTTP/1.1\r\nContent-Length: 1\r\nContent-Length: 2\r\n\r\n");
        assert!(matches!(HeaderDecoder.decode(&mut buf), Err(ParseError::InvalidContentLength { .. })));

        let mut buf = BytesMut::from("POST / HTTP/1.1\r\nContent-Length: 2\r\nContent-Length: 2\r\n\r\nok");
        assert_eq!(HeaderDecoder.decode(&mut buf).unwrap().unwrap().content_length(), 2);
    }

    #[test]
    fn garbage_is_a_bad_request() {
        let mut buf = BytesMut::from("NOT AN HTTP REQUEST\r\n\r\n");

        let error = HeaderDecoder.decode(&mut buf).unwrap_err();
        assert_eq!(error.status(), Some(http::StatusCode::BAD_REQUEST));
    }
}
