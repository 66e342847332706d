//! HTTP message model shared by the codec, the matchers and the request log.
//!
//! # Module Structure
//!
//! - `nottable` - strings with a negation flag
//! - `key_values` - headers, parameters and cookies
//! - `body` - the body variants and their wire format
//! - `request` / `response` - HTTP messages
//! - `outbound` - requests addressed to an upstream
//! - `verification` - count and sequence verifications

pub mod body;
pub mod key_values;
pub mod nottable;
pub mod outbound;
pub mod request;
pub mod response;
pub mod verification;

pub use body::{Body, BodyContent, BodyType, MatchType};
pub use key_values::{Cookie, Header, KeyToMultiValue, Parameter};
pub use nottable::NottableString;
pub use outbound::OutboundHttpRequest;
pub use request::HttpRequest;
pub use response::HttpResponse;
pub use verification::{Verification, VerificationSequence, VerificationTimes};
