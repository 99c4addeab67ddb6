//! Wildcard method-name filters.

use serde::{Deserialize, Serialize};

/// A set of simple glob patterns deciding whether an advisor applies to a
/// method name.
///
/// Each pattern is an exact name optionally carrying a `*` wildcard at
/// either end: `save*`, `*est`, `*quest*`. An empty pattern set matches
/// every name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameFilter {
    patterns: Vec<String>,
}

impl NameFilter {
    /// Create a filter from a set of patterns.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a filter that matches every method name.
    pub fn match_all() -> Self {
        Self::default()
    }

    /// The configured patterns.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether any pattern matches the given method name.
    pub fn matches(&self, name: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|p| simple_match(p, name))
    }
}

fn simple_match(pattern: &str, name: &str) -> bool {
    let leading = pattern.starts_with('*');
    let trailing = pattern.len() > 1 && pattern.ends_with('*');
    match (leading, trailing) {
        (true, true) => name.contains(&pattern[1..pattern.len() - 1]),
        (true, false) => name.ends_with(&pattern[1..]),
        (false, true) => name.starts_with(&pattern[..pattern.len() - 1]),
        (false, false) => name == pattern,
    }
}
