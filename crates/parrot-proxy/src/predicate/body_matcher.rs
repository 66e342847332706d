//! Body matching, one rule per body variant.
//!
//! The expectation's variant decides how an actual body is compared. Actual
//! bodies are usually STRING or BINARY (that is what decoding produces), so
//! every rule first takes the view it needs: text, bytes or form parameters.

use super::json_matcher::json_matches;
use super::not::apply_not;
use super::string_matcher::{ExactStringMatcher, RegexStringMatcher};
use super::validator::{BodyValidator, StandardValidator};
use crate::codec::charset::{Charset, DEFAULT_CHARSET};
use crate::model::key_values::{parse_form_urlencoded, Parameter};
use crate::model::{Body, BodyContent, NottableString};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct BodyMatcher {
    expected: Body,
    regex: Option<RegexStringMatcher>,
    validator: Arc<dyn BodyValidator>,
}

impl BodyMatcher {
    pub fn new(expected: Body) -> Self {
        Self::with_validator(expected, Arc::new(StandardValidator))
    }

    pub fn with_validator(expected: Body, validator: Arc<dyn BodyValidator>) -> Self {
        let regex = match expected.content() {
            BodyContent::Regex(pattern) => Some(RegexStringMatcher::new(pattern.as_str())),
            _ => None,
        };
        Self {
            expected,
            regex,
            validator,
        }
    }

    /// Match an actual body (`None` when the message had no body).
    pub fn matches(&self, actual: Option<&Body>) -> bool {
        let charset = self.expected.charset(DEFAULT_CHARSET);
        let text = || actual.and_then(|body| text_of(body, charset));

        let raw = match self.expected.content() {
            BodyContent::String { value, .. } => {
                ExactStringMatcher::new(value.as_str()).matches(text().as_deref())
            }
            BodyContent::Binary(expected) => {
                actual.is_some_and(|body| bytes_of(body)[..] == expected[..])
            }
            BodyContent::Json { value, match_type } => {
                text().is_some_and(|actual| json_matches(value, &actual, *match_type))
            }
            BodyContent::JsonSchema(schema) => {
                text().is_some_and(|actual| self.validator.json_schema_valid(schema, &actual))
            }
            BodyContent::Xml(expected) => {
                text().is_some_and(|actual| self.validator.xml_equivalent(expected, &actual))
            }
            BodyContent::XPath(xpath) => {
                text().is_some_and(|actual| self.validator.xpath_truthy(xpath, &actual))
            }
            BodyContent::Regex(_) => match &self.regex {
                Some(regex) => regex.matches(text().as_deref()),
                None => false,
            },
            BodyContent::Parameters(expected) => {
                actual.is_some_and(|body| parameters_match(expected, &parameters_of(body)))
            }
        };
        apply_not(raw, self.expected.is_not())
    }
}

fn text_of(body: &Body, charset: Charset) -> Option<Cow<'_, str>> {
    match body.content() {
        BodyContent::Binary(bytes) => Some(Cow::Owned(charset.decode(bytes))),
        _ => body.text(),
    }
}

fn bytes_of(body: &Body) -> Cow<'_, [u8]> {
    match body.content() {
        BodyContent::Binary(bytes) => Cow::Borrowed(bytes.as_ref()),
        _ => Cow::Owned(
            body.charset(DEFAULT_CHARSET)
                .encode(&body.text().unwrap_or_default()),
        ),
    }
}

fn parameters_of(body: &Body) -> Cow<'_, [Parameter]> {
    match body.content() {
        BodyContent::Parameters(parameters) => Cow::Borrowed(parameters.as_slice()),
        _ => Cow::Owned(
            text_of(body, body.charset(DEFAULT_CHARSET))
                .map(|text| parse_form_urlencoded(&text))
                .unwrap_or_default(),
        ),
    }
}

/// Every expected parameter must be present with the same set of values.
/// A negated name requires the parameter to be absent.
fn parameters_match(expected: &[Parameter], actual: &[Parameter]) -> bool {
    expected.iter().all(|parameter| {
        let name = parameter.name.value().unwrap_or("");
        let found = actual.iter().find(|candidate| candidate.name_str() == name);
        let raw = match found {
            Some(candidate) => value_set(&parameter.values) == value_set(&candidate.values),
            None => false,
        };
        apply_not(raw, parameter.name.is_not())
    })
}

fn value_set(values: &[NottableString]) -> BTreeSet<&str> {
    values.iter().filter_map(NottableString::value).collect()
}
