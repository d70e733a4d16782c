use bytes::Bytes;
use lilac_web::transport::OutboundMessage;

/// Status and headers of a response, in the order the application sent them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    status: u16,
    headers: Vec<(Bytes, Bytes)>,
}

impl ResponseHead {
    pub fn new(status: u16, headers: Vec<(Bytes, Bytes)>) -> Self {
        Self { status, headers }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &[(Bytes, Bytes)] {
        &self.headers
    }

    /// Assembles a complete response from the application's two messages, if they came in order
    pub fn from_messages(start: OutboundMessage, body: OutboundMessage) -> Option<(Self, Bytes)> {
        match (start, body) {
            (OutboundMessage::ResponseStart { status, headers }, OutboundMessage::ResponseBody { body }) => {
                Some((Self::new(status, headers), body))
            }
            _ => None,
        }
    }
}
