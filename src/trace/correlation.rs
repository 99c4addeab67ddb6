//! Correlation identifiers and nesting depth rendering.

use super::error::{TraceError, TraceResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Continuation marker for one level of nesting in a rendered prefix.
const CONTINUATION: &str = "|   ";

/// Glyph marking the deepest segment of a rendered prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    /// A span is starting.
    Start,
    /// A span completed normally.
    Complete,
    /// A span completed with an error.
    Exception,
}

impl Glyph {
    /// Returns the marker text for this glyph.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "-->",
            Self::Complete => "<--",
            Self::Exception => "<X-",
        }
    }
}

/// Identifier for one logical request, carrying a nesting depth.
///
/// The token is stable for the life of the request; only the level changes,
/// and only by one step at a time through [`next`](Self::next) and
/// [`previous`](Self::previous).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId {
    token: u32,
    level: u32,
}

impl CorrelationId {
    /// Generate a new root-level correlation id.
    pub fn generate() -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;

        let counter = COUNTER.fetch_add(1, Ordering::Relaxed);

        let mut hasher = DefaultHasher::new();
        std::thread::current().id().hash(&mut hasher);
        counter.hash(&mut hasher);
        timestamp.hash(&mut hasher);
        std::process::id().hash(&mut hasher);

        Self {
            token: hasher.finish() as u32,
            level: 0,
        }
    }

    /// Returns a copy one level deeper, with the same token.
    #[must_use]
    pub fn next(self) -> Self {
        Self {
            token: self.token,
            level: self.level + 1,
        }
    }

    /// Returns a copy one level shallower, with the same token.
    ///
    /// Fails with [`TraceError::BelowRoot`] when called at level 0; callers
    /// stepping out of nesting should check [`is_root`](Self::is_root)
    /// first.
    pub fn previous(self) -> TraceResult<Self> {
        if self.is_root() {
            return Err(TraceError::BelowRoot {
                id: self.to_string(),
            });
        }
        Ok(Self {
            token: self.token,
            level: self.level - 1,
        })
    }

    /// Whether this id is at the outermost nesting level.
    pub fn is_root(self) -> bool {
        self.level == 0
    }

    /// The nesting level, 0 at the root.
    pub fn level(self) -> u32 {
        self.level
    }

    /// Renders the indent prefix for this level, ending in the given glyph.
    ///
    /// Level 0 renders as nothing, level 1 as `|-->`, level 2 as
    /// `|   |-->` (for [`Glyph::Start`]).
    pub fn render(self, glyph: Glyph) -> String {
        render_prefix(self.level, glyph)
    }
}

/// Renders the indent prefix for a nesting level, ending in the given glyph.
pub fn render_prefix(level: u32, glyph: Glyph) -> String {
    let mut prefix = String::new();
    for i in 0..level {
        if i == level - 1 {
            prefix.push('|');
            prefix.push_str(glyph.as_str());
        } else {
            prefix.push_str(CONTINUATION);
        }
    }
    prefix
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.token)
    }
}

impl fmt::Debug for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CorrelationId({:08x}, level={})", self.token, self.level)
    }
}
