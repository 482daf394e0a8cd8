//! HTTP transport for retrieving robots.txt files
//!
//! This module handles the one network concern of the crate:
//! - Building an HTTP client with a proper user agent string
//! - Fetching robots.txt and classifying the terminal result
//! - Following 301/302 redirects manually, with a bounded hop budget
//!
//! Classification is deliberately lenient: only 401/403 deny crawling;
//! every other failure mode (4xx, 5xx, redirect loops, network errors)
//! fails open, since blocking a crawler indefinitely is worse than
//! permitting one unverified fetch.

use reqwest::{header, redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Maximum number of 301/302 hops followed before failing open
pub const MAX_REDIRECT_HOPS: usize = 5;

/// Terminal result of a robots.txt retrieval
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The file was retrieved; the body awaits parsing
    Content {
        /// Decoded UTF-8 body text
        body: String,
        /// HTTP status code of the final response
        status: u16,
    },

    /// Access to robots.txt itself was denied (401/403): deny all
    DenyAll {
        /// The status code that forced the classification
        status: u16,
    },

    /// robots.txt is unavailable (other 4xx/5xx) or the redirect budget
    /// ran out: allow all
    AllowAll {
        /// The status code that forced the classification
        status: u16,
    },

    /// Network-level failure (DNS, connect, timeout, decode): resolution
    /// fails open
    TransportError {
        /// Error description for diagnostics
        error: String,
    },
}

/// Builds an HTTP client configured for robots.txt retrieval
///
/// Redirects are disabled at the client level because the fetch loop
/// follows them manually to enforce the hop budget.
///
/// # Arguments
///
/// * `user_agent` - User-Agent header value for all requests
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a robots.txt URL and classifies the terminal result
///
/// Follows at most [`MAX_REDIRECT_HOPS`] 301/302 redirects; see
/// [`fetch_robots_with_budget`] for the classification table.
pub async fn fetch_robots(client: &Client, url: &str) -> Outcome {
    fetch_robots_with_budget(client, url, MAX_REDIRECT_HOPS).await
}

/// Fetches a robots.txt URL with an explicit redirect hop budget
///
/// # Classification
///
/// | Response | Outcome |
/// |----------|---------|
/// | 401, 403 | `DenyAll` |
/// | other ≥ 400 | `AllowAll` |
/// | 301, 302 with Location | refetch at target (relative resolved against the current URL) |
/// | 301, 302 without Location, or budget exhausted | `AllowAll` |
/// | anything else | body read as text → `Content` |
/// | network error | `TransportError` |
pub async fn fetch_robots_with_budget(client: &Client, url: &str, max_hops: usize) -> Outcome {
    let mut location = url.to_string();

    for hop in 0..=max_hops {
        let response = match client.get(&location).send().await {
            Ok(response) => response,
            Err(err) => {
                return Outcome::TransportError {
                    error: err.to_string(),
                }
            }
        };
        let status = response.status().as_u16();
        tracing::debug!(url = %location, status, hop, "robots.txt response");

        match status {
            401 | 403 => return Outcome::DenyAll { status },
            s if s >= 400 => return Outcome::AllowAll { status },
            301 | 302 => {
                if hop == max_hops {
                    tracing::debug!(url = %location, "redirect budget exhausted, failing open");
                    return Outcome::AllowAll { status };
                }
                let target = response
                    .headers()
                    .get(header::LOCATION)
                    .and_then(|value| value.to_str().ok());
                let Some(target) = target else {
                    return Outcome::AllowAll { status };
                };
                match resolve_location(&location, target) {
                    Ok(next) => location = next,
                    Err(err) => {
                        return Outcome::TransportError {
                            error: err.to_string(),
                        }
                    }
                }
            }
            _ => {
                return match response.text().await {
                    Ok(body) => Outcome::Content { body, status },
                    Err(err) => Outcome::TransportError {
                        error: err.to_string(),
                    },
                }
            }
        }
    }

    // for 0..=max_hops always returns from within the loop
    Outcome::TransportError {
        error: "redirect loop".to_string(),
    }
}

/// Resolves a Location header value against the URL that produced it,
/// so relative redirects work
fn resolve_location(base: &str, target: &str) -> Result<String, url::ParseError> {
    let base = Url::parse(base)?;
    Ok(base.join(target)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client("TestBot/1.0 (+https://example.com/bot)").is_ok());
    }

    #[test]
    fn test_resolve_absolute_location() {
        let resolved = resolve_location(
            "http://example.com/robots.txt",
            "http://other.example.com/robots.txt",
        )
        .expect("absolute target must resolve");
        assert_eq!(resolved, "http://other.example.com/robots.txt");
    }

    #[test]
    fn test_resolve_relative_location() {
        let resolved = resolve_location("http://example.com/robots.txt", "/redirect.txt")
            .expect("relative target must resolve");
        assert_eq!(resolved, "http://example.com/redirect.txt");
    }

    #[test]
    fn test_resolve_location_with_port() {
        let resolved = resolve_location(
            "http://example.com/robots.txt",
            "http://example.com:8080/redirect.txt",
        )
        .expect("target with port must resolve");
        assert_eq!(resolved, "http://example.com:8080/redirect.txt");
    }

    #[test]
    fn test_resolve_rejects_garbage_base() {
        assert!(resolve_location("not a url", "/x").is_err());
    }

    // Network behavior (status classification, redirect following, the
    // hop budget) is covered with wiremock in tests/fetch_tests.rs.
}
