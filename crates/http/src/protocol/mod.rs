//! HTTP/1.1 protocol types shared by the codecs and the connection.
//!
//! - [`Message`]: either a head or a piece of payload
//! - [`RequestHead`] / [`ResponseHead`]: the decoded request head and the response head to encode
//! - [`HttpError`], [`ParseError`], [`SendError`]: failures while serving one connection

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod request;
pub use request::RequestHead;

mod response;
pub use response::ResponseHead;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
