//! Parrot: an HTTP intercepting proxy with request/response filters, a
//! polymorphic body matcher and a verifiable log of everything proxied.

pub mod codec;
pub mod config;
pub mod control;
pub mod error;
pub mod filters;
pub mod metrics;
pub mod model;
pub mod predicate;
pub mod proxy;
pub mod recording;

pub use error::{ProxyError, Result};
