//! Request matching.
//!
//! Every matcher is compiled once from its expectation (regexes built up
//! front, validators shared) and then evaluated against many requests.
//!
//! - `string_matcher` - exact and whole-value regex string matching
//! - `body_matcher` - one strategy per body variant
//! - `json_matcher` - STRICT / ONLY_MATCHING_FIELDS JSON comparison
//! - `json_schema` - the subset of JSON Schema used for body validation
//! - `validator` - schema, XPath and XML equivalence behind one trait
//! - `request` - the whole-request matcher used by filters and the log

mod body_matcher;
mod json_matcher;
mod json_schema;
mod not;
mod request;
mod string_matcher;
mod validator;

pub use body_matcher::BodyMatcher;
pub use json_matcher::json_matches;
pub use not::apply_not;
pub use request::HttpRequestMatcher;
pub use string_matcher::{ExactStringMatcher, RegexStringMatcher};
pub use validator::{BodyValidator, StandardValidator};
