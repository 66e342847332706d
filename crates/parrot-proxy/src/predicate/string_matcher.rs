//! String matchers.
//!
//! Both matchers share the same blank-expectation rules: an unset or empty
//! expectation matches anything (including an absent value), and an absent
//! value fails any other expectation. Negation is applied last.

use super::not::apply_not;
use crate::model::NottableString;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;
use tracing::warn;

/// Exact string equality.
#[derive(Debug, Clone)]
pub struct ExactStringMatcher {
    expected: NottableString,
    ignore_case: bool,
}

impl ExactStringMatcher {
    pub fn new(expected: impl Into<NottableString>) -> Self {
        Self {
            expected: expected.into(),
            ignore_case: false,
        }
    }

    pub fn ignoring_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    pub fn matches(&self, actual: Option<&str>) -> bool {
        let raw = self.expected.is_blank()
            || match (self.expected.value(), actual) {
                (Some(expected), Some(actual)) if self.ignore_case => {
                    expected.eq_ignore_ascii_case(actual)
                }
                (Some(expected), Some(actual)) => expected == actual,
                _ => false,
            };
        apply_not(raw, self.expected.is_not())
    }
}

/// Whole-value regex match.
///
/// The pattern must match the entire value. A value equal to the pattern
/// text always matches, so literal expectations need no escaping. A pattern
/// that does not compile degrades to that literal comparison.
#[derive(Debug, Clone)]
pub struct RegexStringMatcher {
    expected: NottableString,
    regex: Option<Arc<Regex>>,
    ignore_case: bool,
}

impl RegexStringMatcher {
    pub fn new(expected: impl Into<NottableString>) -> Self {
        Self::compile(expected.into(), false)
    }

    pub fn case_insensitive(expected: impl Into<NottableString>) -> Self {
        Self::compile(expected.into(), true)
    }

    fn compile(expected: NottableString, ignore_case: bool) -> Self {
        let regex = match expected.value() {
            Some(pattern) if !pattern.is_empty() => {
                match RegexBuilder::new(&format!("^(?:{pattern})$"))
                    .case_insensitive(ignore_case)
                    .build()
                {
                    Ok(regex) => Some(Arc::new(regex)),
                    Err(e) => {
                        warn!(
                            "Invalid regex pattern '{}', matching it as a literal string: {}",
                            pattern, e
                        );
                        None
                    }
                }
            }
            _ => None,
        };
        Self {
            expected,
            regex,
            ignore_case,
        }
    }

    pub fn matches(&self, actual: Option<&str>) -> bool {
        let raw = self.expected.is_blank()
            || match (self.expected.value(), actual) {
                (Some(expected), Some(actual)) => {
                    let literal = if self.ignore_case {
                        expected.eq_ignore_ascii_case(actual)
                    } else {
                        expected == actual
                    };
                    literal || self.regex.as_ref().is_some_and(|regex| regex.is_match(actual))
                }
                _ => false,
            };
        apply_not(raw, self.expected.is_not())
    }

    pub fn is_not(&self) -> bool {
        self.expected.is_not()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn exact(value: Option<&str>) -> ExactStringMatcher {
        ExactStringMatcher::new(NottableString::from(value.map(str::to_string)))
    }

    #[test]
    fn test_exact_matches_same_value() {
        assert!(ExactStringMatcher::new("some_value").matches(Some("some_value")));
        assert!(!ExactStringMatcher::new("some_value").matches(Some("other")));
        assert!(
            !ExactStringMatcher::new(NottableString::not("some_value")).matches(Some("some_value"))
        );
        assert!(ExactStringMatcher::new(NottableString::not("some_value")).matches(Some("other")));
    }

    #[test]
    fn test_exact_blank_expectation_matches_anything() {
        for expectation in [None, Some("")] {
            assert!(exact(expectation).matches(Some("some_value")));
            assert!(exact(expectation).matches(None));
        }
    }

    #[test]
    fn test_exact_negated_blank_expectation_matches_nothing() {
        let negated = ExactStringMatcher::new(NottableString::not(""));
        assert!(!negated.matches(Some("some_value")));
        assert!(!negated.matches(None));
    }

    #[test]
    fn test_exact_absent_actual() {
        assert!(!ExactStringMatcher::new("some_value").matches(None));
        assert!(ExactStringMatcher::new(NottableString::not("some_value")).matches(None));
        assert!(!ExactStringMatcher::new("some_value").matches(Some("")));
        assert!(ExactStringMatcher::new(NottableString::not("some_value")).matches(Some("")));
    }

    #[test]
    fn test_exact_negation_is_complement() {
        let expectations = ["a", "", "some_value"];
        let actuals = [None, Some(""), Some("a"), Some("some_value")];
        for expectation in expectations {
            for actual in actuals {
                let plain = NottableString::string(expectation);
                assert_eq!(
                    ExactStringMatcher::new(plain.clone()).matches(actual),
                    !ExactStringMatcher::new(plain.negate()).matches(actual),
                    "{expectation:?} vs {actual:?}"
                );
            }
        }
    }

    #[test]
    fn test_exact_ignoring_case() {
        assert!(ExactStringMatcher::new("Host").ignoring_case().matches(Some("HOST")));
    }

    #[test]
    fn test_regex_whole_value() {
        let matcher = RegexStringMatcher::new("/api/.*");
        assert!(matcher.matches(Some("/api/users")));
        assert!(!matcher.matches(Some("/v1/api/users")));
        assert!(!matcher.matches(None));
    }

    #[test]
    fn test_regex_literal_value_always_matches() {
        assert!(RegexStringMatcher::new("/a+b").matches(Some("/a+b")));
    }

    #[test]
    fn test_regex_negated() {
        let matcher = RegexStringMatcher::new(NottableString::not("GET|HEAD"));
        assert!(!matcher.matches(Some("GET")));
        assert!(matcher.matches(Some("POST")));
        assert!(matcher.is_not());
    }

    #[test]
    fn test_regex_case_insensitive() {
        let matcher = RegexStringMatcher::case_insensitive("content-.*");
        assert!(matcher.matches(Some("Content-Type")));
    }

    #[test]
    #[traced_test]
    fn test_invalid_regex_falls_back_to_literal() {
        let matcher = RegexStringMatcher::new("a(b");
        assert!(matcher.matches(Some("a(b")));
        assert!(!matcher.matches(Some("ab")));
        assert!(logs_contain("Invalid regex pattern 'a(b'"));
    }
}
