//! Proxy server module.
//!
//! # Module Structure
//!
//! - `server` - listeners and accept loops
//! - `handler` - one proxy cycle: control dispatch, filters, forwarding, logging
//! - `client` - outbound client trait and the pooled hyper implementation

mod client;
mod handler;
mod server;

pub use client::{create_http_client, HttpClient, HyperOutboundClient, OutboundClient};
pub use handler::ProxyHandler;
pub use server::{MetricsServer, ProxyServer};
