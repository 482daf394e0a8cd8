//! A single Allow/Disallow directive and its pattern matching

use crate::codec;
use crate::CodecResult;
use std::borrow::Cow;
use std::fmt;

/// One allow or disallow directive bound to a path pattern
///
/// The pattern is stored percent-normalized, so equivalent encodings of
/// the same path compare equal. Patterns may contain `*` wildcards; a
/// wildcard pattern ending in `$` only matches when the match reaches
/// the end of the candidate path.
///
/// Invariant: an empty Disallow value means "allow everything", so the
/// allowance is inverted at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Normalized pattern; a trailing `$` is the end-anchor marker,
    /// preserved only when the pattern contains a wildcard. A literal
    /// `$` anywhere else round-trips as `%24`, so the marker is
    /// unambiguous post-normalization.
    pattern: String,
    allowance: bool,
}

impl Rule {
    /// Creates a rule from a raw directive value
    ///
    /// # Arguments
    ///
    /// * `path` - The raw path pattern from the directive
    /// * `allowance` - `true` for Allow, `false` for Disallow
    ///
    /// # Returns
    ///
    /// * `Ok(Rule)` - The normalized rule
    /// * `Err(CodecError)` - The pattern contains an unsafe percent
    ///   escape; the parser drops such directives
    pub fn new(path: &str, allowance: bool) -> CodecResult<Self> {
        // An empty Disallow means allow all
        let allowance = if path.is_empty() && !allowance {
            true
        } else {
            allowance
        };

        // The end-anchor only has meaning in wildcard patterns; strip it
        // before normalization (which would encode it) and re-append the
        // literal marker after.
        let pattern = match path.strip_suffix('$') {
            Some(body) if path.contains('*') => format!("{}$", codec::normalize(body)?),
            _ => codec::normalize(path)?,
        };

        Ok(Self { pattern, allowance })
    }

    /// Returns true if this rule permits its matched paths
    pub fn allowance(&self) -> bool {
        self.allowance
    }

    /// Returns the normalized pattern string
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Checks whether this rule's pattern matches a candidate path
    ///
    /// The candidate must already be normalized with [`codec::normalize`]
    /// so that both sides use the same encoding.
    ///
    /// Matching semantics:
    /// - a pattern of exactly `*` matches everything
    /// - a wildcard-free pattern is a literal prefix match
    /// - otherwise the pattern is split on `*` and the pieces must be
    ///   found in the candidate left-to-right, each at or after the end
    ///   of the previous piece's match; an end-anchored pattern extends
    ///   the candidate with the anchor marker so the final piece can
    ///   only match at the very end
    pub fn matches(&self, url: &str) -> bool {
        if self.pattern == "*" || url.starts_with(&self.pattern) {
            return true;
        }
        if !self.pattern.contains('*') {
            return false;
        }

        // Normalized URLs cannot contain a literal '$', so appending the
        // marker cannot collide with candidate text.
        let target: Cow<'_, str> = if self.pattern.ends_with('$') {
            Cow::Owned(format!("{url}$"))
        } else {
            Cow::Borrowed(url)
        };
        let target = target.as_ref();

        let mut pieces = self.pattern.split('*');
        let first = pieces.next().unwrap_or_default();
        if !target.starts_with(first) {
            return false;
        }

        let mut index = first.len();
        for piece in pieces {
            // An empty piece always matches at the current index, which
            // is what makes consecutive or trailing '*' a no-op.
            match target[index..].find(piece) {
                Some(found) => index += found + piece.len(),
                None => return false,
            }
        }
        true
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let directive = if self.allowance { "Allow" } else { "Disallow" };
        write!(f, "{}: {}", directive, self.pattern)
    }
}
