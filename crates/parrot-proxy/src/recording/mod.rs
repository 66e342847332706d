//! Request log and verification.
//!
//! # Module Structure
//!
//! - `log` - the shared, append-only log of proxied exchanges
//! - `dump` - Java and JSON renderers for `/dumpToLog`

mod dump;
mod log;

pub use dump::{render, render_java, render_json, DumpFormat};
pub use log::{LogEntry, RequestLog};
