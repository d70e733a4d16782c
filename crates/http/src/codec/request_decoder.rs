//! HTTP request decoder module
//!
//! [`RequestDecoder`] turns a byte stream into a request head followed by body chunks,
//! using [`HeaderDecoder`] for the head and [`LengthDecoder`] for the body.
//!
//! ```no_run
//! use lilac_http::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from("GET / HTTP/1.1\r\n\r\n");
//! let head = decoder.decode(&mut buffer);
//! ```

use crate::codec::body::LengthDecoder;
use crate::codec::header::HeaderDecoder;
use crate::protocol::{Message, ParseError, PayloadItem, RequestHead};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// A decoder for HTTP requests that handles both the head and the payload
///
/// The decoder maintains its state through the `payload_decoder` field:
/// - `None`: currently parsing a head
/// - `Some(LengthDecoder)`: currently parsing the body of the last head
#[derive(Debug, Default)]
pub struct RequestDecoder {
    header_decoder: HeaderDecoder,
    payload_decoder: Option<LengthDecoder>,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for RequestDecoder {
    type Item = Message<RequestHead>;
    type Error = ParseError;

    /// Attempts to decode the next part of a request
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Message::Header(_)))`: a request head
    /// - `Ok(Some(Message::Payload(_)))`: a body chunk, or the end of the body
    /// - `Ok(None)`: need more data to proceed
    /// - `Err(_)`: the request is malformed
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // parse payload if have payload_decoder
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let message = match payload_decoder.decode(src)? {
                Some(item @ PayloadItem::Chunk(_)) => Some(Message::Payload(item)),
                Some(item @ PayloadItem::Eof) => {
                    // no need payload decoder in this request now
                    self.payload_decoder.take();
                    Some(Message::Payload(item))
                }
                None => None,
            };

            return Ok(message);
        }

        let message = match self.header_decoder.decode(src)? {
            Some(head) => {
                self.payload_decoder = Some(LengthDecoder::new(head.content_length()));
                Some(Message::Header(head))
            }
            None => None,
        };

        Ok(message)
    }
}
