//! Request body decoding.
//!
//! Bodies are framed by `content-length` only, see [`LengthDecoder`].

mod length_decoder;

pub use length_decoder::LengthDecoder;
