//! Resolution engine over a parsed robots.txt document
//!
//! [`RobotsFile`] binds a parsed [`Document`] to the outcome of the
//! fetch that produced it. The decision logic itself is a pure,
//! synchronous function over immutable state, so a single `RobotsFile`
//! can be shared and queried concurrently without synchronization; the
//! deferred form merely reschedules that same pure function.

use crate::codec;
use crate::fetch::{self, Outcome};
use crate::parser::Document;
use crate::Result;
use std::fmt;
use std::time::Duration;

/// Why a fetch decision came out the way it did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    /// The decision was forced by the robots.txt fetch status
    /// (401/403 deny everything, other failures allow everything).
    /// `None` means the transport never produced a status.
    Status(Option<u16>),
    /// An agent-specific entry matched; carries its index in
    /// [`Document::entries`] order
    Entry(usize),
    /// No specific entry matched; the `User-agent: *` entry decided
    DefaultEntry,
    /// The document holds no applicable directive at all
    NoRule,
}

/// A fetch-permission decision with its diagnostic reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Whether the fetch is permitted
    pub allowed: bool,
    /// The path the decision was made for (defaulted to `/` when the
    /// caller passed an empty path)
    pub path: String,
    /// Which part of the document (or fetch outcome) decided
    pub reason: Reason,
}

/// A robots.txt file ready to answer fetch-permission queries
#[derive(Debug, Clone, Default)]
pub struct RobotsFile {
    document: Document,
    disallow_all: bool,
    allow_all: bool,
    status: Option<u16>,
}

impl RobotsFile {
    /// Parses robots.txt text into a queryable file
    pub fn parse(text: &str) -> Self {
        Self::from_document(Document::parse(text))
    }

    /// Wraps an already-parsed document
    pub fn from_document(document: Document) -> Self {
        Self {
            document,
            ..Self::default()
        }
    }

    /// Builds a file from a transport outcome
    ///
    /// Status-classified outcomes produce a file that answers every
    /// query the same way: deny-all for 401/403, allow-all for other
    /// failures (including transport errors and exhausted redirect
    /// budgets, which fail open).
    pub fn from_outcome(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Content { body, status } => Self {
                status: Some(status),
                ..Self::parse(&body)
            },
            Outcome::DenyAll { status } => Self {
                disallow_all: true,
                status: Some(status),
                ..Self::default()
            },
            Outcome::AllowAll { status } => Self {
                allow_all: true,
                status: Some(status),
                ..Self::default()
            },
            Outcome::TransportError { error } => {
                tracing::debug!(%error, "transport failed, failing open");
                Self {
                    allow_all: true,
                    ..Self::default()
                }
            }
        }
    }

    /// Fetches, classifies and parses a robots.txt URL
    ///
    /// Transport-level failures never surface here; they fail open into
    /// an allow-all file. The only error is a client that cannot be
    /// built.
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL of the robots.txt file
    /// * `user_agent` - User-Agent header for the fetch
    pub async fn fetch_url(url: &str, user_agent: &str) -> Result<Self> {
        let client = fetch::build_http_client(user_agent)?;
        let outcome = fetch::fetch_robots(&client, url).await;
        Ok(Self::from_outcome(outcome))
    }

    /// Decides whether `user_agent` may fetch `path`
    ///
    /// This is the blocking form; [`RobotsFile::can_fetch_deferred`]
    /// yields the same answer from async callers.
    pub fn can_fetch(&self, user_agent: &str, path: &str) -> bool {
        self.decide(user_agent, path).allowed
    }

    /// Decides whether `user_agent` may fetch `path`, with diagnostics
    ///
    /// Resolution order:
    /// 1. status-forced deny-all / allow-all
    /// 2. agent-specific entries in authoring order, first applicable wins
    /// 3. the `User-agent: *` default entry
    /// 4. no directive at all means access granted
    pub fn decide(&self, user_agent: &str, path: &str) -> Decision {
        let path = if path.is_empty() { "/" } else { path };

        if self.disallow_all {
            return Decision {
                allowed: false,
                path: path.to_string(),
                reason: Reason::Status(self.status),
            };
        }
        if self.allow_all {
            return Decision {
                allowed: true,
                path: path.to_string(),
                reason: Reason::Status(self.status),
            };
        }

        // A candidate path that cannot be decoded is encoded as-is so
        // literal prefixes still compare; resolution never fails.
        let url = codec::normalize(path).unwrap_or_else(|_| codec::quote(path));

        for (index, entry) in self.document.entries().iter().enumerate() {
            if entry.applies_to(user_agent) {
                let allowed = entry.permits(&url);
                tracing::debug!(user_agent, path, allowed, index, "matched entry");
                return Decision {
                    allowed,
                    path: path.to_string(),
                    reason: Reason::Entry(index),
                };
            }
        }

        if let Some(default) = self.document.default_entry() {
            let allowed = default.permits(&url);
            tracing::debug!(user_agent, path, allowed, "matched default entry");
            return Decision {
                allowed,
                path: path.to_string(),
                reason: Reason::DefaultEntry,
            };
        }

        Decision {
            allowed: true,
            path: path.to_string(),
            reason: Reason::NoRule,
        }
    }

    /// Deferred form of [`RobotsFile::can_fetch`]
    ///
    /// Yields to the scheduler once and then runs the same pure decision
    /// function; no network I/O is re-run.
    pub async fn can_fetch_deferred(&self, user_agent: &str, path: &str) -> Decision {
        tokio::task::yield_now().await;
        self.decide(user_agent, path)
    }

    /// Returns the crawl delay declared for `user_agent`
    ///
    /// The first applicable agent-specific entry carrying a delay wins;
    /// the default entry's delay is the fallback.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        for entry in self.document.entries() {
            if entry.applies_to(user_agent) {
                if let Some(delay) = entry.crawl_delay() {
                    return Some(delay);
                }
            }
        }
        self.document.default_entry().and_then(|e| e.crawl_delay())
    }

    /// Sitemap URLs listed in the document
    pub fn sitemaps(&self) -> &[String] {
        self.document.sitemaps()
    }

    /// The parsed document
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The HTTP status of the fetch that produced this file, if any
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Abbreviated one-line description listing the agent tokens the
    /// document addresses
    pub fn summary(&self) -> String {
        let mut agents: Vec<&str> = Vec::new();
        if let Some(default) = self.document.default_entry() {
            agents.extend(default.user_agents().iter().map(String::as_str));
        }
        for entry in self.document.entries() {
            agents.extend(entry.user_agents().iter().map(String::as_str));
        }
        format!("<Robots: listed agents: `{}`>", agents.join("`, `"))
    }
}

impl fmt::Display for RobotsFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<Robots:")?;
        // A transport error leaves no status behind
        let status = self
            .status
            .map_or_else(|| "-".to_string(), |code| code.to_string());
        if self.disallow_all {
            writeln!(f, "  disallow all (status {status})")?;
        }
        if self.allow_all {
            writeln!(f, "  allow all (status {status})")?;
        }
        if let Some(default) = self.document.default_entry() {
            writeln!(f, "  {default}")?;
        }
        for entry in self.document.entries() {
            writeln!(f, "  {entry}")?;
        }
        write!(f, ">")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deny_all_outcome() {
        let robots = RobotsFile::from_outcome(Outcome::DenyAll { status: 403 });
        let decision = robots.decide("anybot", "/any/path");
        assert!(!decision.allowed);
        assert_eq!(decision.reason, Reason::Status(Some(403)));
        assert!(!robots.can_fetch("anybot", "/"));
    }

    #[test]
    fn test_allow_all_outcome() {
        let robots = RobotsFile::from_outcome(Outcome::AllowAll { status: 404 });
        let decision = robots.decide("anybot", "/any/path");
        assert!(decision.allowed);
        assert_eq!(decision.reason, Reason::Status(Some(404)));
    }

    #[test]
    fn test_transport_error_fails_open() {
        let robots = RobotsFile::from_outcome(Outcome::TransportError {
            error: "connection refused".to_string(),
        });
        let decision = robots.decide("anybot", "/admin");
        assert!(decision.allowed);
        assert_eq!(decision.reason, Reason::Status(None));
    }

    #[test]
    fn test_content_outcome_parses() {
        let robots = RobotsFile::from_outcome(Outcome::Content {
            body: "User-agent: *\nDisallow: /private".to_string(),
            status: 200,
        });
        assert_eq!(robots.status(), Some(200));
        assert!(!robots.can_fetch("anybot", "/private/page"));
        assert!(robots.can_fetch("anybot", "/public"));
    }

    #[test]
    fn test_empty_path_defaults_to_root() {
        let robots = RobotsFile::parse("User-agent: *\nDisallow: /");
        let decision = robots.decide("anybot", "");
        assert_eq!(decision.path, "/");
        assert!(!decision.allowed);
    }

    #[test]
    fn test_no_rule_reason() {
        let robots = RobotsFile::parse("");
        let decision = robots.decide("anybot", "/whatever");
        assert!(decision.allowed);
        assert_eq!(decision.reason, Reason::NoRule);
    }

    #[test]
    fn test_entry_and_default_reasons() {
        let robots = RobotsFile::parse(
            "User-agent: special\nDisallow: /x\n\nUser-agent: *\nDisallow: /y",
        );
        assert_eq!(
            robots.decide("special", "/x").reason,
            Reason::Entry(0)
        );
        assert_eq!(
            robots.decide("otherbot", "/y").reason,
            Reason::DefaultEntry
        );
    }

    #[test]
    fn test_specific_entries_scanned_before_default() {
        let robots = RobotsFile::parse(
            "User-agent: *\nDisallow: /\n\nUser-agent: niceBot\nAllow: /",
        );
        assert!(robots.can_fetch("NiceBot/2.0", "/page"));
        assert!(!robots.can_fetch("meanBot", "/page"));
    }

    #[test]
    fn test_undecodable_path_still_resolves() {
        let robots = RobotsFile::parse("User-agent: *\nDisallow: /tmp");
        // "%3M" cannot be percent-decoded; the path is encoded literally
        // and literal prefixes still apply
        assert!(robots.can_fetch("anybot", "/a%3M"));
        assert!(!robots.can_fetch("anybot", "/tmp/a%3M"));
    }

    #[test]
    fn test_crawl_delay_specific_over_default() {
        let robots = RobotsFile::parse(
            "User-agent: testbot\nCrawl-delay: 5\nDisallow: /x\n\nUser-agent: *\nCrawl-delay: 10\nDisallow: /y",
        );
        assert_eq!(robots.crawl_delay("TestBot"), Some(Duration::from_secs(5)));
        assert_eq!(robots.crawl_delay("OtherBot"), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_crawl_delay_absent() {
        let robots = RobotsFile::parse("User-agent: *\nDisallow: /x");
        assert_eq!(robots.crawl_delay("anybot"), None);

        let empty = RobotsFile::parse("");
        assert_eq!(empty.crawl_delay("anybot"), None);
    }

    #[test]
    fn test_crawl_delay_skips_applicable_entry_without_delay() {
        let robots = RobotsFile::parse(
            "User-agent: bot\nDisallow: /x\n\nUser-agent: *\nCrawl-delay: 7\nDisallow: /y",
        );
        assert_eq!(robots.crawl_delay("bot"), Some(Duration::from_secs(7)));
    }

    #[test]
    fn test_sitemaps_exposed() {
        let robots = RobotsFile::parse(
            "Sitemap: https://example.com/a.xml\nSitemap: https://example.com/b.xml",
        );
        assert_eq!(robots.sitemaps().len(), 2);
    }

    #[tokio::test]
    async fn test_deferred_matches_blocking() {
        let robots = RobotsFile::parse("User-agent: *\nDisallow: /private");
        for path in ["/private/x", "/public", ""] {
            let deferred = robots.can_fetch_deferred("anybot", path).await;
            assert_eq!(deferred.allowed, robots.can_fetch("anybot", path));
            assert_eq!(deferred, robots.decide("anybot", path));
        }
    }

    #[tokio::test]
    async fn test_shared_across_tasks() {
        let robots = std::sync::Arc::new(RobotsFile::parse("User-agent: *\nDisallow: /private"));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let robots = std::sync::Arc::clone(&robots);
            handles.push(tokio::spawn(async move {
                robots.can_fetch_deferred("anybot", "/private/x").await.allowed
            }));
        }
        for handle in handles {
            assert!(!handle.await.expect("task must not panic"));
        }
    }

    #[test]
    fn test_display_and_summary() {
        let robots = RobotsFile::parse(
            "User-agent: *\nDisallow: /a\n\nUser-agent: bot\nAllow: /b",
        );
        let full = robots.to_string();
        assert!(full.starts_with("<Robots:"));
        assert!(full.contains("User-agent: *"));
        assert!(full.contains("User-agent: bot"));

        let lite = robots.summary();
        assert!(lite.contains("`*`"));
        assert!(lite.contains("`bot`"));
    }

    #[test]
    fn test_display_status_forced_files() {
        let denied = RobotsFile::from_outcome(Outcome::DenyAll { status: 403 });
        assert!(denied.to_string().contains("disallow all (status 403)"));

        let failed = RobotsFile::from_outcome(Outcome::TransportError {
            error: "timed out".to_string(),
        });
        assert!(failed.to_string().contains("allow all (status -)"));
    }
}
