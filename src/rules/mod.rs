//! Rule and entry types for parsed robots.txt documents
//!
//! A [`Rule`] is a single Allow/Disallow directive bound to a path
//! pattern; an [`Entry`] groups one or more user-agent tokens with an
//! ordered list of rules and an optional crawl-delay.

mod entry;
mod rule;

pub use entry::Entry;
pub use rule::Rule;
