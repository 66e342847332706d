//! Character sets supported by the body codec.
//!
//! Only the charsets a proxy actually meets on the wire are supported. Any
//! other label resolves to `None` and callers fall back to [`DEFAULT_CHARSET`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Charset used for text bodies when nothing else is declared.
pub const DEFAULT_CHARSET: Charset = Charset::Utf8;

const UTF16_BE_BOM: [u8; 2] = [0xFE, 0xFF];
const UTF16_LE_BOM: [u8; 2] = [0xFF, 0xFE];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Charset {
    Utf8,
    /// Big-endian with a byte order mark when encoding; honours either BOM when decoding.
    Utf16,
    /// `utf-16` content that arrived with a little-endian byte order mark,
    /// which is written back when encoding.
    Utf16LeBom,
    Utf16Be,
    Utf16Le,
    UsAscii,
    Iso8859_1,
}

impl Charset {
    /// Resolve a charset label (case-insensitive, common aliases accepted).
    pub fn for_label(label: &str) -> Option<Self> {
        let label = label.trim().trim_matches('"').to_ascii_lowercase();
        match label.as_str() {
            "utf-8" | "utf8" => Some(Charset::Utf8),
            "utf-16" | "utf16" => Some(Charset::Utf16),
            "utf-16be" | "utf16be" => Some(Charset::Utf16Be),
            "utf-16le" | "utf16le" => Some(Charset::Utf16Le),
            "us-ascii" | "ascii" | "iso646-us" => Some(Charset::UsAscii),
            "iso-8859-1" | "iso8859-1" | "latin1" | "l1" => Some(Charset::Iso8859_1),
            _ => None,
        }
    }

    /// Canonical lower-case label, as written into `Content-Type` headers.
    pub fn name(&self) -> &'static str {
        match self {
            Charset::Utf8 => "utf-8",
            Charset::Utf16 | Charset::Utf16LeBom => "utf-16",
            Charset::Utf16Be => "utf-16be",
            Charset::Utf16Le => "utf-16le",
            Charset::UsAscii => "us-ascii",
            Charset::Iso8859_1 => "iso-8859-1",
        }
    }

    /// Encode text. Characters the charset cannot represent become `?`.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Charset::Utf8 => text.as_bytes().to_vec(),
            Charset::Utf16 => {
                let mut bytes = UTF16_BE_BOM.to_vec();
                bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
                bytes
            }
            Charset::Utf16LeBom => {
                let mut bytes = UTF16_LE_BOM.to_vec();
                bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
                bytes
            }
            Charset::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            Charset::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            Charset::UsAscii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
            Charset::Iso8859_1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
        }
    }

    /// Refine the charset from the payload's byte order mark, so that
    /// encoding the decoded text reproduces the original bytes.
    pub fn for_payload(self, bytes: &[u8]) -> Self {
        match self {
            Charset::Utf16 | Charset::Utf16LeBom if bytes.starts_with(&UTF16_LE_BOM) => {
                Charset::Utf16LeBom
            }
            Charset::Utf16LeBom => Charset::Utf16,
            other => other,
        }
    }

    /// Decode bytes. Malformed sequences become U+FFFD rather than failing.
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Charset::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Charset::Utf16 | Charset::Utf16LeBom => {
                if let Some(rest) = bytes.strip_prefix(&UTF16_BE_BOM) {
                    decode_utf16(rest, u16::from_be_bytes)
                } else if let Some(rest) = bytes.strip_prefix(&UTF16_LE_BOM) {
                    decode_utf16(rest, u16::from_le_bytes)
                } else {
                    decode_utf16(bytes, u16::from_be_bytes)
                }
            }
            Charset::Utf16Be => decode_utf16(bytes, u16::from_be_bytes),
            Charset::Utf16Le => decode_utf16(bytes, u16::from_le_bytes),
            Charset::UsAscii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { '\u{FFFD}' })
                .collect(),
            Charset::Iso8859_1 => bytes.iter().map(|&b| b as char).collect(),
        }
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let mut units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    if bytes.len() % 2 == 1 {
        // dangling byte
        units.push(0xFFFD);
    }
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Charset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Charset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;
        let label = String::deserialize(deserializer)?;
        Charset::for_label(&label)
            .ok_or_else(|| D::Error::custom(format!("unsupported charset: {label}")))
    }
}
