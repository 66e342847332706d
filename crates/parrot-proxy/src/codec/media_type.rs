//! Minimal `Content-Type` parsing.

use super::charset::Charset;
use std::fmt;

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_XML: &str = "application/xml";
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const TEXT_PLAIN: &str = "text/plain";

/// A parsed media type: `type/subtype; name=value; ...`.
///
/// Type, subtype and parameter names are lower-cased; parameter values are
/// kept as written (quotes stripped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    kind: String,
    subtype: String,
    parameters: Vec<(String, String)>,
}

impl MediaType {
    pub fn new(kind: &str, subtype: &str) -> Self {
        Self {
            kind: kind.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            parameters: Vec::new(),
        }
    }

    /// Parse a header value. Returns `None` when there is no `type/subtype` pair.
    pub fn parse(value: &str) -> Option<Self> {
        let mut segments = value.split(';');
        let essence = segments.next()?.trim();
        let (kind, subtype) = essence.split_once('/')?;
        let (kind, subtype) = (kind.trim(), subtype.trim());
        if kind.is_empty() || subtype.is_empty() {
            return None;
        }

        let mut media_type = MediaType::new(kind, subtype);
        for segment in segments {
            if let Some((name, value)) = segment.split_once('=') {
                let name = name.trim().to_ascii_lowercase();
                if !name.is_empty() {
                    media_type
                        .parameters
                        .push((name, value.trim().trim_matches('"').to_string()));
                }
            }
        }
        Some(media_type)
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The raw `charset` parameter, if any.
    pub fn charset_label(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// The `charset` parameter when it names a supported charset.
    pub fn charset(&self) -> Option<Charset> {
        self.charset_label().and_then(Charset::for_label)
    }

    /// Replace (or add) the charset parameter.
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.parameters
            .retain(|(name, _)| !name.eq_ignore_ascii_case("charset"));
        self.parameters
            .push(("charset".to_string(), charset.name().to_string()));
        self
    }

    /// Whether a payload of this type should be carried as raw bytes.
    ///
    /// A declared charset always means text. Otherwise `text/*` and the
    /// structured-text application subtypes are text; media, fonts,
    /// multipart and the remaining `application/*` subtypes are binary.
    pub fn is_binary(&self) -> bool {
        if self.charset_label().is_some() {
            return false;
        }
        match self.kind.as_str() {
            "text" => false,
            "image" | "audio" | "video" | "font" | "model" | "multipart" => true,
            "application" => !is_textual_application_subtype(&self.subtype),
            _ => false,
        }
    }
}

fn is_textual_application_subtype(subtype: &str) -> bool {
    const TEXTUAL: &[&str] = &[
        "json",
        "xml",
        "javascript",
        "ecmascript",
        "x-javascript",
        "x-www-form-urlencoded",
        "graphql",
        "yaml",
        "x-yaml",
        "html",
        "xhtml",
        "soap",
        "csv",
        "sql",
        "problem",
    ];
    TEXTUAL.contains(&subtype)
        || subtype.ends_with("+json")
        || subtype.ends_with("+xml")
        || subtype.ends_with("+yaml")
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.subtype)?;
        for (name, value) in &self.parameters {
            write!(f, "; {}={}", name, value)?;
        }
        Ok(())
    }
}
