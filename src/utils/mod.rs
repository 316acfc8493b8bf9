//! Utility modules.
//!
//! - [`HttpClient`]: shared reqwest client with timeouts and a crate user agent

mod http;

pub use http::{HttpClient, DEFAULT_USER_AGENT};
