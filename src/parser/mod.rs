//! Line-oriented robots.txt directive parser
//!
//! The parser is a small state machine over physical lines. It is
//! deliberately permissive: malformed lines, unknown fields and unsafe
//! paths contribute nothing, they never abort parsing. A user-agent line
//! is allowed to appear without preceding blank lines.

use crate::codec;
use crate::rules::{Entry, Rule};
use std::time::Duration;

/// Parser states for the directive state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing pending
    Start,
    /// Saw one or more user-agent lines for the pending entry
    SawAgent,
    /// Saw at least one rule (or crawl-delay) for the pending entry
    SawRule,
}

/// A parsed robots.txt document
///
/// Agent-specific entries keep their authoring order, which is also
/// their precedence order during resolution. The catch-all
/// `User-agent: *` block is held separately as the default entry; only
/// the first such block counts, later ones are silently dropped.
#[derive(Debug, Clone, Default)]
pub struct Document {
    entries: Vec<Entry>,
    default_entry: Option<Entry>,
    sitemaps: Vec<String>,
}

impl Document {
    /// Parses robots.txt text
    ///
    /// `\r\n`, `\r` and `\n` are all treated as line separators, per how
    /// the file is served in the wild.
    pub fn parse(text: &str) -> Self {
        let unified = text.replace("\r\n", "\n").replace('\r', "\n");
        Self::parse_lines(unified.split('\n'))
    }

    /// Parses robots.txt from an iterator of physical lines
    ///
    /// # State machine
    ///
    /// - blank line in `SawAgent`: discard the pending entry (an agent
    ///   block with zero rules contributes nothing)
    /// - blank line in `SawRule`: commit the pending entry
    /// - `user-agent` in `SawRule`: commit, then start a new entry
    /// - `allow`/`disallow`/`crawl-delay` in `Start`: invalid, dropped
    /// - `sitemap`: collected regardless of state
    /// - end of input in `SawRule`: commit the pending entry
    pub fn parse_lines<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut doc = Document::default();
        let mut entry = Entry::new();
        let mut state = State::Start;

        for raw in lines {
            // Only a truly empty line terminates a block; a line of
            // whitespace falls through and is dropped as malformed.
            if raw.is_empty() {
                match state {
                    State::SawAgent => {
                        entry = Entry::new();
                        state = State::Start;
                    }
                    State::SawRule => {
                        doc.add_entry(std::mem::take(&mut entry));
                        state = State::Start;
                    }
                    State::Start => {}
                }
                continue;
            }

            // Strip an inline comment, then surrounding whitespace
            let line = match raw.find('#') {
                Some(at) => &raw[..at],
                None => raw,
            };
            let line = line.trim();

            let Some((field, rest)) = line.split_once(':') else {
                continue;
            };
            let field = field.trim().to_lowercase();

            // Sitemap values are absolute URLs whose scheme separator
            // must not be mistaken for the field separator, so the rest
            // of the line is kept whole. Every other field requires
            // exactly one field:value pair.
            if field == "sitemap" {
                let value = rest.trim();
                if codec::is_safe(value) {
                    doc.sitemaps.push(value.to_string());
                }
                continue;
            }
            if rest.contains(':') {
                continue;
            }
            let value = rest.trim();

            match field.as_str() {
                "user-agent" => {
                    if state == State::SawRule {
                        doc.add_entry(std::mem::take(&mut entry));
                    }
                    entry.push_agent(value);
                    state = State::SawAgent;
                }
                "allow" | "disallow" => {
                    if state != State::Start {
                        match Rule::new(value, field == "allow") {
                            Ok(rule) => {
                                entry.push_rule(rule);
                                state = State::SawRule;
                            }
                            Err(err) => {
                                tracing::trace!(value, %err, "dropping unsafe rule path");
                            }
                        }
                    }
                }
                "crawl-delay" => {
                    if state != State::Start {
                        // try_from_secs_f64 rejects negative, non-finite
                        // and overflowing values in one place
                        match value
                            .parse::<f64>()
                            .ok()
                            .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
                        {
                            Some(delay) => entry.set_crawl_delay(delay),
                            None => tracing::trace!(value, "ignoring bad crawl-delay value"),
                        }
                        state = State::SawRule;
                    }
                }
                _ => {}
            }
        }

        if state == State::SawRule {
            doc.add_entry(entry);
        }

        doc
    }

    /// Files an entry as either the default entry or an agent-specific one
    ///
    /// The first catch-all block wins; a later catch-all block is
    /// dropped, not appended anywhere. That is a precedence rule of the
    /// protocol as deployed, not an accident.
    fn add_entry(&mut self, entry: Entry) {
        if entry.is_catch_all() {
            if self.default_entry.is_none() {
                self.default_entry = Some(entry);
            } else {
                tracing::trace!("dropping repeated catch-all entry");
            }
        } else {
            self.entries.push(entry);
        }
    }

    /// Agent-specific entries in authoring order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// The `User-agent: *` entry, if the document had one
    pub fn default_entry(&self) -> Option<&Entry> {
        self.default_entry.as_ref()
    }

    /// Sitemap URLs in authoring order, as opaque strings
    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }

    /// True if the document holds no entries at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.default_entry.is_none()
    }
}
