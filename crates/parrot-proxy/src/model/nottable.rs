//! Strings that can be negated.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A string value paired with a negation flag.
///
/// A `None` value is a wildcard. The flag takes no part in equality; it only
/// flips the final outcome of a match.
#[derive(Debug, Clone, Default)]
pub struct NottableString {
    value: Option<String>,
    not: bool,
}

impl NottableString {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            not: false,
        }
    }

    /// A negated value: matches whatever `value` does not.
    pub fn not(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            not: true,
        }
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_not(&self) -> bool {
        self.not
    }

    pub fn negate(&self) -> Self {
        Self {
            value: self.value.clone(),
            not: !self.not,
        }
    }

    /// `None` or empty. Blank expectations match anything.
    pub fn is_blank(&self) -> bool {
        self.value.as_deref().map_or(true, str::is_empty)
    }

    /// Nothing set at all; skipped when serializing.
    pub fn is_unset(&self) -> bool {
        self.value.is_none() && !self.not
    }
}

impl PartialEq for NottableString {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for NottableString {}

impl From<&str> for NottableString {
    fn from(value: &str) -> Self {
        NottableString::string(value)
    }
}

impl From<String> for NottableString {
    fn from(value: String) -> Self {
        NottableString::string(value)
    }
}

impl From<Option<String>> for NottableString {
    fn from(value: Option<String>) -> Self {
        Self { value, not: false }
    }
}

impl fmt::Display for NottableString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.not {
            f.write_str("!")?;
        }
        f.write_str(self.value.as_deref().unwrap_or(""))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum NottableRepr {
    Plain(Option<String>),
    Object {
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        not: bool,
        value: Option<String>,
    },
}

impl Serialize for NottableString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = if self.not {
            NottableRepr::Object {
                not: true,
                value: self.value.clone(),
            }
        } else {
            NottableRepr::Plain(self.value.clone())
        };
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NottableString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match NottableRepr::deserialize(deserializer)? {
            NottableRepr::Plain(value) => Self { value, not: false },
            NottableRepr::Object { not, value } => Self { value, not },
        })
    }
}
