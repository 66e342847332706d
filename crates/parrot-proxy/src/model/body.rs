//! Request and response bodies.
//!
//! A [`Body`] is one variant of [`BodyContent`] wrapped in a shared envelope
//! carrying the negation flag and an optional declared content type. The same
//! type describes both concrete payloads (what was sent) and expectations
//! (what a matcher requires).
//!
//! # Wire format
//!
//! A bare JSON string is shorthand for a STRING body. Anything else is an
//! object tagged by `type`:
//!
//! ```json
//! {"not": true, "contentType": "...", "type": "JSON", "json": "{...}", "matchType": "STRICT"}
//! ```

use super::key_values::{to_form_urlencoded, Parameter};
use crate::codec::charset::{Charset, DEFAULT_CHARSET};
use crate::codec::media_type::{
    MediaType, APPLICATION_JSON, APPLICATION_XML, FORM_URLENCODED, TEXT_PLAIN,
};
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BodyType {
    String,
    Binary,
    Json,
    JsonSchema,
    Xml,
    #[serde(rename = "XPATH")]
    XPath,
    Regex,
    Parameters,
}

/// How strictly a JSON expectation is compared against an actual body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    /// Same keys at every level, arrays in order.
    Strict,
    /// Expected fields must be present with equal values; extra fields are ignored.
    #[default]
    OnlyMatchingFields,
}

#[derive(Debug, Clone)]
pub enum BodyContent {
    String {
        value: String,
        /// Encoding to use when writing the value; independent of `contentType`.
        charset: Option<Charset>,
    },
    Binary(Bytes),
    Json {
        value: String,
        match_type: MatchType,
    },
    JsonSchema(String),
    Xml(String),
    XPath(String),
    Regex(String),
    Parameters(Vec<Parameter>),
}

impl PartialEq for BodyContent {
    fn eq(&self, other: &Self) -> bool {
        use BodyContent::*;
        match (self, other) {
            (
                String { value: a, charset: ca },
                String { value: b, charset: cb },
            ) => a == b && ca.unwrap_or(DEFAULT_CHARSET) == cb.unwrap_or(DEFAULT_CHARSET),
            (Binary(a), Binary(b)) => a == b,
            (
                Json { value: a, match_type: ma },
                Json { value: b, match_type: mb },
            ) => a == b && ma == mb,
            (JsonSchema(a), JsonSchema(b))
            | (Xml(a), Xml(b))
            | (XPath(a), XPath(b))
            | (Regex(a), Regex(b)) => a == b,
            (Parameters(a), Parameters(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Body {
    content: BodyContent,
    not: Option<bool>,
    content_type: Option<String>,
}

impl PartialEq for Body {
    fn eq(&self, other: &Self) -> bool {
        self.content == other.content
            && self.is_not() == other.is_not()
            && self.content_type == other.content_type
    }
}

impl Body {
    pub fn new(content: BodyContent) -> Self {
        Self {
            content,
            not: None,
            content_type: None,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(BodyContent::String {
            value: value.into(),
            charset: None,
        })
    }

    pub fn string_with_charset(value: impl Into<String>, charset: Charset) -> Self {
        Self::new(BodyContent::String {
            value: value.into(),
            charset: Some(charset),
        })
    }

    pub fn binary(value: impl Into<Bytes>) -> Self {
        Self::new(BodyContent::Binary(value.into()))
    }

    pub fn json(value: impl Into<String>) -> Self {
        Self::json_with_match_type(value, MatchType::default())
    }

    pub fn json_with_match_type(value: impl Into<String>, match_type: MatchType) -> Self {
        Self::new(BodyContent::Json {
            value: value.into(),
            match_type,
        })
    }

    /// JSON declared in a specific charset: `application/json; charset=<charset>`.
    pub fn json_with_charset(
        value: impl Into<String>,
        charset: Charset,
        match_type: MatchType,
    ) -> Self {
        Self::json_with_match_type(value, match_type).with_content_type(
            MediaType::new("application", "json")
                .with_charset(charset)
                .to_string(),
        )
    }

    pub fn json_schema(value: impl Into<String>) -> Self {
        Self::new(BodyContent::JsonSchema(value.into()))
    }

    pub fn xml(value: impl Into<String>) -> Self {
        Self::new(BodyContent::Xml(value.into()))
    }

    /// XML declared in a specific charset: `application/xml; charset=<charset>`.
    pub fn xml_with_charset(value: impl Into<String>, charset: Charset) -> Self {
        Self::xml(value).with_content_type(
            MediaType::new("application", "xml")
                .with_charset(charset)
                .to_string(),
        )
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(BodyContent::XPath(value.into()))
    }

    pub fn regex(value: impl Into<String>) -> Self {
        Self::new(BodyContent::Regex(value.into()))
    }

    pub fn parameters(parameters: Vec<Parameter>) -> Self {
        Self::new(BodyContent::Parameters(parameters))
    }

    /// Require the body NOT to match.
    pub fn negated(mut self) -> Self {
        self.not = Some(true);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn body_type(&self) -> BodyType {
        match &self.content {
            BodyContent::String { .. } => BodyType::String,
            BodyContent::Binary(_) => BodyType::Binary,
            BodyContent::Json { .. } => BodyType::Json,
            BodyContent::JsonSchema(_) => BodyType::JsonSchema,
            BodyContent::Xml(_) => BodyType::Xml,
            BodyContent::XPath(_) => BodyType::XPath,
            BodyContent::Regex(_) => BodyType::Regex,
            BodyContent::Parameters(_) => BodyType::Parameters,
        }
    }

    pub fn content(&self) -> &BodyContent {
        &self.content
    }

    pub fn is_not(&self) -> bool {
        self.not.unwrap_or(false)
    }

    /// The content type set on this body, without variant defaults.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// The variant's default media type, if it has one.
    pub fn default_content_type(&self) -> Option<&'static str> {
        match self.content {
            BodyContent::Json { .. } | BodyContent::JsonSchema(_) => Some(APPLICATION_JSON),
            BodyContent::Xml(_) => Some(APPLICATION_XML),
            BodyContent::Parameters(_) => Some(FORM_URLENCODED),
            BodyContent::String { .. }
            | BodyContent::Binary(_)
            | BodyContent::XPath(_)
            | BodyContent::Regex(_) => None,
        }
    }

    /// The `Content-Type` this body announces when nothing else is set.
    ///
    /// An explicit content type wins. Otherwise the variant default is used;
    /// a STRING body with a non-default explicit charset announces
    /// `text/plain; charset=<charset>`.
    pub fn effective_content_type(&self) -> Option<String> {
        if let Some(content_type) = &self.content_type {
            return Some(content_type.clone());
        }
        match (&self.content, self.default_content_type()) {
            (_, Some(default)) => Some(default.to_string()),
            (BodyContent::String { charset: Some(charset), .. }, None) => {
                if *charset == DEFAULT_CHARSET {
                    Some(TEXT_PLAIN.to_string())
                } else {
                    Some(
                        MediaType::new("text", "plain")
                            .with_charset(*charset)
                            .to_string(),
                    )
                }
            }
            _ => None,
        }
    }

    /// Charset given directly on a STRING body.
    pub fn explicit_charset(&self) -> Option<Charset> {
        match self.content {
            BodyContent::String { charset, .. } => charset,
            _ => None,
        }
    }

    /// Charset for the body bytes: explicit charset, then the content type's
    /// charset parameter, then `default`.
    pub fn charset(&self, default: Charset) -> Charset {
        self.explicit_charset()
            .or_else(|| {
                self.content_type
                    .as_deref()
                    .and_then(MediaType::parse)
                    .and_then(|media_type| media_type.charset())
            })
            .unwrap_or(default)
    }

    /// Textual view of the body. `None` for binary payloads.
    pub fn text(&self) -> Option<Cow<'_, str>> {
        match &self.content {
            BodyContent::String { value, .. }
            | BodyContent::Json { value, .. }
            | BodyContent::JsonSchema(value)
            | BodyContent::Xml(value)
            | BodyContent::XPath(value)
            | BodyContent::Regex(value) => Some(Cow::Borrowed(value)),
            BodyContent::Parameters(parameters) => Some(Cow::Owned(to_form_urlencoded(parameters))),
            BodyContent::Binary(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum BodyRepr {
    Shorthand(String),
    Typed(TypedBody),
}

#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypedBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    not: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    body_type: Option<BodyType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    json: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    json_schema: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    xml: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    xpath: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parameters: Option<Vec<Parameter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    match_type: Option<MatchType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    charset: Option<Charset>,
}

impl TypedBody {
    fn inferred_type(&self) -> Option<BodyType> {
        if self.string.is_some() {
            Some(BodyType::String)
        } else if self.json.is_some() {
            Some(BodyType::Json)
        } else if self.json_schema.is_some() {
            Some(BodyType::JsonSchema)
        } else if self.xml.is_some() {
            Some(BodyType::Xml)
        } else if self.xpath.is_some() {
            Some(BodyType::XPath)
        } else if self.regex.is_some() {
            Some(BodyType::Regex)
        } else if self.parameters.is_some() {
            Some(BodyType::Parameters)
        } else {
            None
        }
    }
}

/// JSON payloads may be given as a string of JSON text or inline.
fn json_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text,
        other => other.to_string(),
    }
}

impl TryFrom<BodyRepr> for Body {
    type Error = String;

    fn try_from(repr: BodyRepr) -> Result<Self, Self::Error> {
        let typed = match repr {
            BodyRepr::Shorthand(value) => return Ok(Body::string(value)),
            BodyRepr::Typed(typed) => typed,
        };
        let body_type = typed
            .body_type
            .or_else(|| typed.inferred_type())
            .ok_or_else(|| "body has no \"type\" and no recognisable payload".to_string())?;
        let missing = || format!("{body_type:?} body is missing its value");

        let value = typed.value;
        let text = |field: Option<String>| -> Result<String, String> {
            field
                .or_else(|| value.clone().map(json_text))
                .ok_or_else(missing)
        };

        let content = match body_type {
            BodyType::String => BodyContent::String {
                value: text(typed.string)?,
                charset: typed.charset,
            },
            BodyType::Json => BodyContent::Json {
                value: text(typed.json.map(json_text))?,
                match_type: typed.match_type.unwrap_or_default(),
            },
            BodyType::JsonSchema => {
                BodyContent::JsonSchema(text(typed.json_schema.map(json_text))?)
            }
            BodyType::Xml => BodyContent::Xml(text(typed.xml)?),
            BodyType::XPath => BodyContent::XPath(text(typed.xpath)?),
            BodyType::Regex => BodyContent::Regex(text(typed.regex)?),
            BodyType::Binary => {
                let encoded = text(None)?;
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(encoded.as_bytes())
                    .map_err(|e| format!("BINARY body is not valid base64: {e}"))?;
                BodyContent::Binary(Bytes::from(bytes))
            }
            BodyType::Parameters => match (typed.parameters, value.clone()) {
                (Some(parameters), _) => BodyContent::Parameters(parameters),
                (None, Some(value)) => BodyContent::Parameters(
                    serde_json::from_value(value).map_err(|e| e.to_string())?,
                ),
                (None, None) => return Err(missing()),
            },
        };

        Ok(Body {
            content,
            not: typed.not,
            content_type: typed.content_type,
        })
    }
}

impl From<&Body> for BodyRepr {
    fn from(body: &Body) -> Self {
        let content_type = body.content_type.clone();
        let mut typed = TypedBody {
            not: body.is_not().then_some(true),
            body_type: Some(body.body_type()),
            ..TypedBody::default()
        };

        match &body.content {
            BodyContent::String { value, charset } => {
                if typed.not.is_none() && content_type.is_none() && charset.is_none() {
                    return BodyRepr::Shorthand(value.clone());
                }
                typed.content_type = content_type;
                typed.string = Some(value.clone());
                typed.charset = *charset;
            }
            BodyContent::Json { value, match_type } => {
                typed.content_type = content_type.filter(|ct| ct != APPLICATION_JSON);
                typed.json = Some(serde_json::Value::String(value.clone()));
                typed.match_type = (*match_type == MatchType::Strict).then_some(MatchType::Strict);
            }
            BodyContent::JsonSchema(value) => {
                typed.content_type = content_type.filter(|ct| ct != APPLICATION_JSON);
                typed.json_schema = Some(serde_json::Value::String(value.clone()));
            }
            BodyContent::Xml(value) => {
                typed.content_type = content_type.filter(|ct| ct != APPLICATION_XML);
                typed.xml = Some(value.clone());
            }
            BodyContent::XPath(value) => {
                typed.content_type = content_type;
                typed.xpath = Some(value.clone());
            }
            BodyContent::Regex(value) => {
                typed.content_type = content_type;
                typed.regex = Some(value.clone());
            }
            BodyContent::Binary(bytes) => {
                typed.content_type = content_type;
                typed.value = Some(serde_json::Value::String(
                    base64::engine::general_purpose::STANDARD.encode(bytes),
                ));
            }
            BodyContent::Parameters(parameters) => {
                typed.content_type = content_type.filter(|ct| ct != FORM_URLENCODED);
                typed.parameters = Some(parameters.clone());
            }
        }
        BodyRepr::Typed(typed)
    }
}

impl Serialize for Body {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        BodyRepr::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Body {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = BodyRepr::deserialize(deserializer)?;
        Body::try_from(repr).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::key_values::KeyToMultiValue;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    #[test]
    fn test_json_body_defaults() {
        let body = Body::json("{}");
        assert_eq!(body.body_type(), BodyType::Json);
        assert!(matches!(
            body.content(),
            BodyContent::Json { match_type: MatchType::OnlyMatchingFields, .. }
        ));
        assert_eq!(body.content_type(), None);
        assert_eq!(body.effective_content_type().as_deref(), Some("application/json"));
    }

    #[test]
    fn test_json_body_with_charset() {
        let body = Body::json_with_charset("{}", Charset::Utf16, MatchType::Strict);
        assert_eq!(
            body.effective_content_type().as_deref(),
            Some("application/json; charset=utf-16")
        );
        assert_eq!(body.charset(DEFAULT_CHARSET), Charset::Utf16);
    }

    #[test]
    fn test_string_body_content_type() {
        assert_eq!(Body::string("x").effective_content_type(), None);
        assert_eq!(
            Body::string_with_charset("x", Charset::Utf16)
                .effective_content_type()
                .as_deref(),
            Some("text/plain; charset=utf-16")
        );
        assert_eq!(
            Body::string_with_charset("x", Charset::Utf8)
                .effective_content_type()
                .as_deref(),
            Some("text/plain")
        );
    }

    #[test]
    fn test_variant_default_content_types() {
        assert_eq!(Body::xml("<a/>").effective_content_type().as_deref(), Some("application/xml"));
        assert_eq!(
            Body::json_schema("{}").effective_content_type().as_deref(),
            Some("application/json")
        );
        assert_eq!(
            Body::parameters(vec![]).effective_content_type().as_deref(),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(Body::regex(".*").effective_content_type(), None);
        assert_eq!(Body::xpath("/a").effective_content_type(), None);
        assert_eq!(Body::binary(vec![1u8]).effective_content_type(), None);
    }

    #[test]
    fn test_explicit_charset_beats_content_type_charset() {
        let body = Body::string_with_charset("x", Charset::Utf16)
            .with_content_type("text/plain; charset=us-ascii");
        assert_eq!(body.charset(DEFAULT_CHARSET), Charset::Utf16);
        let body = Body::string("x").with_content_type("text/plain; charset=us-ascii");
        assert_eq!(body.charset(DEFAULT_CHARSET), Charset::UsAscii);
    }

    #[test]
    fn test_string_equality_treats_missing_charset_as_default() {
        assert_eq!(Body::string("x"), Body::string_with_charset("x", Charset::Utf8));
        assert_ne!(Body::string("x"), Body::string_with_charset("x", Charset::Utf16));
        assert_ne!(Body::string("x"), Body::string("x").negated());
    }

    #[test]
    fn test_string_shorthand_serialization() {
        assert_eq!(serde_json::to_value(Body::string("somebody")).unwrap(), json!("somebody"));
        assert_json_eq!(
            serde_json::to_value(Body::string("somebody").negated()).unwrap(),
            json!({"not": true, "type": "STRING", "string": "somebody"})
        );
    }

    #[test]
    fn test_json_serialization_omits_defaults() {
        assert_eq!(
            serde_json::to_string(&Body::json("{\"a\":1}")).unwrap(),
            r#"{"type":"JSON","json":"{\"a\":1}"}"#
        );
        assert_eq!(
            serde_json::to_string(
                &Body::json_with_charset("{}", Charset::Utf16, MatchType::Strict).negated()
            )
            .unwrap(),
            r#"{"not":true,"contentType":"application/json; charset=utf-16","type":"JSON","json":"{}","matchType":"STRICT"}"#
        );
    }

    #[test]
    fn test_deserialize_variants() {
        let body: Body =
            serde_json::from_value(json!({"type": "JSON", "json": {"a": [1, 2]}})).unwrap();
        assert_eq!(body, Body::json("{\"a\":[1,2]}"));

        let body: Body = serde_json::from_value(
            json!({"type": "JSON", "value": "{}", "matchType": "STRICT"}),
        )
        .unwrap();
        assert_eq!(body, Body::json_with_match_type("{}", MatchType::Strict));

        let body: Body = serde_json::from_value(json!({"type": "XPATH", "xpath": "/a"})).unwrap();
        assert_eq!(body, Body::xpath("/a"));

        let body: Body = serde_json::from_value(json!({"type": "REGEX", "value": "a.*"})).unwrap();
        assert_eq!(body, Body::regex("a.*"));

        let body: Body =
            serde_json::from_value(json!({"type": "BINARY", "value": "AQID"})).unwrap();
        assert_eq!(body, Body::binary(vec![1u8, 2, 3]));

        let body: Body = serde_json::from_value(json!({
            "type": "PARAMETERS",
            "parameters": [{"name": "a", "values": ["1", "2"]}]
        }))
        .unwrap();
        assert_eq!(body, Body::parameters(vec![KeyToMultiValue::new("a", ["1", "2"])]));

        let body: Body =
            serde_json::from_value(json!({"not": true, "xml": "<a/>"})).unwrap();
        assert_eq!(body, Body::xml("<a/>").negated());
    }

    #[test]
    fn test_deserialize_rejects_missing_value() {
        assert!(serde_json::from_value::<Body>(json!({"type": "REGEX"})).is_err());
        assert!(serde_json::from_value::<Body>(json!({"type": "BINARY", "value": "***"})).is_err());
        assert!(serde_json::from_value::<Body>(json!({})).is_err());
    }

    #[test]
    fn test_binary_serialization() {
        assert_json_eq!(
            serde_json::to_value(Body::binary(vec![1u8, 2, 3]).with_content_type("video/quicktime"))
                .unwrap(),
            json!({"contentType": "video/quicktime", "type": "BINARY", "value": "AQID"})
        );
    }

    #[test]
    fn test_text_view() {
        let body = Body::parameters(vec![KeyToMultiValue::new("a", ["1"])]);
        assert_eq!(body.text().as_deref(), Some("a=1"));
        assert!(Body::binary(vec![0u8]).text().is_none());
    }
}
