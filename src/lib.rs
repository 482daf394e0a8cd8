//! Kumo-Robots: a polite robots.txt interpreter
//!
//! This crate parses robots.txt documents and answers whether a given
//! user agent may fetch a given URL path. It implements the de-facto
//! exclusion protocol as deployed in the wild: permissive line parsing,
//! `*` wildcards with a trailing `$` end-anchor, first-match rule
//! precedence, and status-code driven allow-all/deny-all classification
//! when the file itself cannot be retrieved.

pub mod codec;
pub mod engine;
pub mod fetch;
pub mod parser;
pub mod rules;

use thiserror::Error;

/// Main error type for Kumo-Robots operations
#[derive(Debug, Error)]
pub enum RobotsError {
    #[error("Path codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Errors raised by percent-encoding normalization
///
/// These never escape the parser: a directive whose path fails to
/// normalize is dropped and parsing continues.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Malformed percent escape at byte {position}")]
    BadEscape { position: usize },

    #[error("Percent-decoded value is not valid UTF-8")]
    InvalidUtf8,
}

/// Result type alias for Kumo-Robots operations
pub type Result<T> = std::result::Result<T, RobotsError>;

/// Result type alias for codec operations
pub type CodecResult<T> = std::result::Result<T, CodecError>;

// Re-export commonly used types
pub use engine::{Decision, Reason, RobotsFile};
pub use fetch::{build_http_client, fetch_robots, Outcome};
pub use parser::Document;
pub use rules::{Entry, Rule};
