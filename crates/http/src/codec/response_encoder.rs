use crate::codec::header::HeaderEncoder;
use crate::protocol::{Message, PayloadItem, PayloadSize, ResponseHead, SendError};
use bytes::{BufMut, BytesMut};
use std::io;
use std::io::ErrorKind;
use tokio_util::codec::Encoder;
use tracing::error;

/// Encodes a response head followed by its body chunks and a final [`PayloadItem::Eof`].
///
/// The chunks must add up to exactly the length announced with the head.
#[derive(Debug, Default)]
pub struct ResponseEncoder {
    header_encoder: HeaderEncoder,
    /// body bytes still expected, `None` while waiting for a head
    remaining: Option<u64>,
}

impl ResponseEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Encoder<Message<(ResponseHead, PayloadSize)>> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: Message<(ResponseHead, PayloadSize)>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Message::Header((head, payload_size)) => {
                if self.remaining.is_some() {
                    error!("expect payload item but receive response head");
                    return Err(io::Error::from(ErrorKind::InvalidInput).into());
                }

                self.header_encoder.encode((head, payload_size), dst)?;
                self.remaining = Some(payload_size.length());
                Ok(())
            }

            Message::Payload(payload_item) => {
                let Some(remaining) = self.remaining.as_mut() else {
                    error!("expect response head but receive payload item");
                    return Err(io::Error::from(ErrorKind::InvalidInput).into());
                };

                match payload_item {
                    PayloadItem::Chunk(bytes) => {
                        let length = bytes.len() as u64;
                        if length > *remaining {
                            return Err(SendError::invalid_body(format!("{length} bytes exceed the announced length")));
                        }
                        *remaining -= length;
                        dst.put(bytes);
                        Ok(())
                    }
                    PayloadItem::Eof => {
                        let missing = *remaining;
                        self.remaining = None;
                        if missing > 0 {
                            return Err(SendError::invalid_body(format!("body ended {missing} bytes short")));
                        }
                        Ok(())
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn head() -> ResponseHead {
        ResponseHead::new(200, vec![(Bytes::from_static(b"content-type"), Bytes::from_static(b"text/plain; charset=utf-8"))])
    }

    #[test]
    fn head_then_body() {
        let mut encoder = ResponseEncoder::new();
        let mut dst = BytesMut::new();

        encoder.encode(Message::Header((head(), PayloadSize::Length(5))), &mut dst).unwrap();
        encoder.encode(Message::from(Bytes::from_static(b"hello")), &mut dst).unwrap();
        encoder.encode(Message::Payload(PayloadItem::Eof), &mut dst).unwrap();

        assert_eq!(
            &dst[..],
            b"HTTP/1.1 200 OK\r\ncontent-type: text/plain; charset=utf-8\r\ncontent-length: 5\r\nconnection: close\r\n\r\nhello"
        );
    }

    #[test]
    fn body_must_follow_a_head() {
        let mut encoder = ResponseEncoder::new();
        let mut dst = BytesMut::new();

        assert!(encoder.encode(Message::from(Bytes::from_static(b"hello")), &mut dst).is_err());
    }

    #[test]
    fn body_must_match_the_announced_length() {
        let mut encoder = ResponseEncoder::new();
        let mut dst = BytesMut::new();

        encoder.encode(Message::Header((head(), PayloadSize::Length(3))), &mut dst).unwrap();
        assert!(matches!(
            encoder.encode(Message::from(Bytes::from_static(b"hello")), &mut dst),
            Err(SendError::InvalidBody { .. })
        ));

        let mut encoder = ResponseEncoder::new();
        encoder.encode(Message::Header((head(), PayloadSize::Length(3))), &mut dst).unwrap();
        encoder.encode(Message::from(Bytes::from_static(b"he")), &mut dst).unwrap();
        assert!(matches!(encoder.encode(Message::Payload(PayloadItem::Eof), &mut dst), Err(SendError::InvalidBody { .. })));
    }
}
