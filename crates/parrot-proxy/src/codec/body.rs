//! Body encoding and decoding with `Content-Type` negotiation.
//!
//! Encoding picks the byte charset from the body (explicit charset, then its
//! content type) before looking at an explicit `Content-Type` header, and
//! never overwrites a header the message already carries. Decoding trusts the
//! header: binary media types stay raw, everything else becomes a STRING body
//! decoded with the declared (or default) charset.

use super::charset::DEFAULT_CHARSET;
use super::media_type::MediaType;
use crate::model::key_values::{self, Header};
use crate::model::{Body, BodyContent};
use bytes::Bytes;
use tracing::debug;

pub const CONTENT_TYPE: &str = "content-type";

/// Bytes for a body plus the `Content-Type` to add, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub bytes: Bytes,
    /// `None` when no header should be added (no body, no inferable type,
    /// or an explicit header is already present).
    pub content_type: Option<String>,
}

/// Encode `body` for a message that may already carry `explicit_content_type`.
pub fn encode_body(body: Option<&Body>, explicit_content_type: Option<&str>) -> EncodedBody {
    let Some(body) = body else {
        return EncodedBody {
            bytes: Bytes::new(),
            content_type: None,
        };
    };

    let header_charset = explicit_content_type.and_then(|value| {
        let charset = MediaType::parse(value).and_then(|media_type| media_type.charset());
        if charset.is_none() {
            debug!("No supported charset in Content-Type '{}', using default", value);
        }
        charset
    });
    let charset = body.charset(header_charset.unwrap_or(DEFAULT_CHARSET));

    let bytes = match body.content() {
        BodyContent::Binary(bytes) => bytes.clone(),
        _ => Bytes::from(charset.encode(&body.text().unwrap_or_default())),
    };

    let content_type = if explicit_content_type.is_some() {
        None
    } else {
        body.effective_content_type()
    };

    EncodedBody {
        bytes,
        content_type,
    }
}

/// Encode a message body, adding a `Content-Type` header to `headers` when
/// one is inferred and none is present.
pub fn write_body(body: Option<&Body>, headers: &mut Vec<Header>) -> Bytes {
    let explicit = key_values::first_value(headers, CONTENT_TYPE, true);
    let encoded = encode_body(body, explicit);
    if let Some(content_type) = encoded.content_type {
        key_values::add_value(headers, "Content-Type", &content_type, true);
    }
    encoded.bytes
}

/// Decode raw bytes using the message's `Content-Type` header.
///
/// Empty payloads decode to no body at all.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> Option<Body> {
    if bytes.is_empty() {
        return None;
    }

    let media_type = content_type.and_then(MediaType::parse);
    if media_type.as_ref().is_some_and(MediaType::is_binary) {
        return Some(Body::binary(Bytes::copy_from_slice(bytes)));
    }

    let charset = match &media_type {
        Some(media_type) => match (media_type.charset_label(), media_type.charset()) {
            (_, Some(charset)) => charset,
            (Some(label), None) => {
                debug!("Unsupported charset '{}', decoding as {}", label, DEFAULT_CHARSET);
                DEFAULT_CHARSET
            }
            (None, None) => DEFAULT_CHARSET,
        },
        None => DEFAULT_CHARSET,
    };

    let charset = charset.for_payload(bytes);
    let value = charset.decode(bytes);
    Some(if charset == DEFAULT_CHARSET {
        Body::string(value)
    } else {
        Body::string_with_charset(value, charset)
    })
}
