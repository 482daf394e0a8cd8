//! A robots.txt entry: user-agent tokens plus their rules

use crate::rules::Rule;
use std::fmt;
use std::time::Duration;

/// One robots.txt block: one or more user-agent tokens, an ordered list
/// of rules, and an optional crawl-delay
///
/// Rule order is insertion order and the first matching rule wins; the
/// parser is the only mutator, entries are read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    user_agents: Vec<String>,
    rules: Vec<Rule>,
    crawl_delay: Option<Duration>,
}

impl Entry {
    /// Creates an empty entry
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks if this entry applies to the given user agent
    ///
    /// The candidate is reduced to its name token (everything before the
    /// first `/`) and lowercased; the entry applies when any stored token
    /// is `*` or is a case-insensitive prefix of that name token.
    ///
    /// # Examples
    ///
    /// ```
    /// use kumo_robots::Entry;
    ///
    /// let mut entry = Entry::new();
    /// entry.push_agent("figtree");
    /// assert!(entry.applies_to("FigTree Robot libwww-perl/5.04"));
    /// assert!(!entry.applies_to("OtherBot/1.0"));
    /// ```
    pub fn applies_to(&self, user_agent: &str) -> bool {
        let token = user_agent
            .split('/')
            .next()
            .unwrap_or_default()
            .to_lowercase();

        for agent in &self.user_agents {
            let agent = agent.to_lowercase();
            if agent == "*" || token.starts_with(&agent) {
                tracing::trace!(%agent, %token, "entry applies");
                return true;
            }
        }
        false
    }

    /// Returns the allowance of the first rule matching the path
    ///
    /// The path must already be percent-normalized. When no rule matches,
    /// access defaults to allowed.
    pub fn permits(&self, url: &str) -> bool {
        for rule in &self.rules {
            if rule.matches(url) {
                return rule.allowance();
            }
        }
        true
    }

    /// Appends a user-agent token (parser use)
    pub fn push_agent(&mut self, agent: &str) {
        self.user_agents.push(agent.to_string());
    }

    /// Appends a rule (parser use)
    pub fn push_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Sets the crawl delay (parser use)
    pub fn set_crawl_delay(&mut self, delay: Duration) {
        self.crawl_delay = Some(delay);
    }

    /// Returns the stored user-agent tokens in insertion order
    pub fn user_agents(&self) -> &[String] {
        &self.user_agents
    }

    /// Returns the rules in insertion order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Returns the crawl delay, if one was declared
    pub fn crawl_delay(&self) -> Option<Duration> {
        self.crawl_delay
    }

    /// True if this entry's agent set contains the catch-all token
    pub(crate) fn is_catch_all(&self) -> bool {
        self.user_agents.iter().any(|agent| agent == "*")
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        for agent in &self.user_agents {
            parts.push(format!("User-agent: {agent}"));
        }
        for rule in &self.rules {
            parts.push(rule.to_string());
        }
        if let Some(delay) = self.crawl_delay {
            parts.push(format!("Crawl-delay: {}", delay.as_secs_f64()));
        }
        write!(f, "<Entry: {}>", parts.join(", "))
    }
}
