//! Body codec and transport conversion.
//!
//! # Module Structure
//!
//! - `charset` - supported character sets
//! - `media_type` - `Content-Type` parsing and binary/text classification
//! - `body` - body encode/decode with content type negotiation
//! - `http` - hyper request/response conversion

pub mod body;
pub mod charset;
pub mod http;
pub mod media_type;

pub use body::{decode_body, encode_body, write_body, EncodedBody};
pub use charset::{Charset, DEFAULT_CHARSET};
pub use media_type::MediaType;
