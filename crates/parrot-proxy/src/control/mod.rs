//! Control surface: `PUT` requests that query and mutate the request log.
//!
//! # Module Structure
//!
//! - `router` - path dispatch and handlers
//! - `types` - response helpers

mod router;
mod types;

pub use router::{handle_control, ControlRoute};
pub use types::{
    build_response, build_response_with_headers, json_response, status_response, text_response,
};
