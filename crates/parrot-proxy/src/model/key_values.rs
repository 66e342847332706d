//! Multi-valued entries: headers, query parameters, form parameters, cookies.

use super::nottable::NottableString;
use serde::{Deserialize, Serialize};

/// A name with an ordered list of values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyToMultiValue {
    pub name: NottableString,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<NottableString>,
}

pub type Header = KeyToMultiValue;
pub type Parameter = KeyToMultiValue;

impl KeyToMultiValue {
    pub fn new<I, V>(name: impl Into<NottableString>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<NottableString>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name_str(&self) -> &str {
        self.name.value().unwrap_or("")
    }

    pub fn first_value(&self) -> Option<&str> {
        self.values.first().and_then(NottableString::value)
    }

    fn name_is(&self, name: &str, ignore_case: bool) -> bool {
        if ignore_case {
            self.name_str().eq_ignore_ascii_case(name)
        } else {
            self.name_str() == name
        }
    }
}

/// A cookie sent by a client (`Cookie`) or set by a server (`Set-Cookie`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: NottableString,
    pub value: NottableString,
}

impl Cookie {
    pub fn new(name: impl Into<NottableString>, value: impl Into<NottableString>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Append `value` under `name`, merging into an existing entry with the same name.
pub fn add_value(entries: &mut Vec<KeyToMultiValue>, name: &str, value: &str, ignore_case: bool) {
    match entries.iter_mut().find(|e| e.name_is(name, ignore_case)) {
        Some(entry) => entry.values.push(NottableString::string(value)),
        None => entries.push(KeyToMultiValue::new(name, [value])),
    }
}

pub fn find<'a>(
    entries: &'a [KeyToMultiValue],
    name: &str,
    ignore_case: bool,
) -> Option<&'a KeyToMultiValue> {
    entries.iter().find(|e| e.name_is(name, ignore_case))
}

pub fn first_value<'a>(
    entries: &'a [KeyToMultiValue],
    name: &str,
    ignore_case: bool,
) -> Option<&'a str> {
    find(entries, name, ignore_case).and_then(KeyToMultiValue::first_value)
}

pub fn remove(entries: &mut Vec<KeyToMultiValue>, name: &str, ignore_case: bool) {
    entries.retain(|e| !e.name_is(name, ignore_case));
}

/// Render as `application/x-www-form-urlencoded` / query string text.
pub fn to_form_urlencoded(entries: &[KeyToMultiValue]) -> String {
    entries
        .iter()
        .flat_map(|entry| {
            let name = urlencoding::encode(entry.name_str()).into_owned();
            let values: Vec<&str> = if entry.values.is_empty() {
                vec![""]
            } else {
                entry.values.iter().map(|v| v.value().unwrap_or("")).collect()
            };
            values
                .into_iter()
                .map(move |value| format!("{}={}", name, urlencoding::encode(value)))
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Parse `a=1&b=2&a=3` into multi-valued entries, keeping first-seen order.
///
/// `+` is a space. Pairs that fail percent-decoding are skipped.
pub fn parse_form_urlencoded(input: &str) -> Vec<KeyToMultiValue> {
    let mut entries = Vec::new();
    for pair in input.split('&').filter(|p| !p.is_empty()) {
        let (raw_name, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let raw_name = raw_name.replace('+', " ");
        let raw_value = raw_value.replace('+', " ");
        let name = urlencoding::decode(&raw_name);
        let value = urlencoding::decode(&raw_value);
        match (name, value) {
            (Ok(name), Ok(value)) => add_value(&mut entries, &name, &value, false),
            _ => tracing::debug!("Skipping malformed form parameter: {}", pair),
        }
    }
    entries
}
