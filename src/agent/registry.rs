//! Mutable User-Agent pattern registry.
//!
//! Each category is an `ArcSwap<Vec<String>>`. Readers load the current
//! snapshot without locking; writers build a modified copy and swap it in
//! with `rcu`, so concurrent writers never lose each other's updates.

use std::fmt;
use std::str::FromStr;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::agent::patterns;

/// Pattern category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    /// Automation tools, scrapers, scanners.
    Automation,
    /// Legitimate search engine and preview crawlers.
    Crawler,
    /// Browser engine and vendor tokens.
    Browser,
}

impl PatternCategory {
    pub const ALL: [PatternCategory; 3] = [
        PatternCategory::Automation,
        PatternCategory::Crawler,
        PatternCategory::Browser,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternCategory::Automation => "automation",
            PatternCategory::Crawler => "crawler",
            PatternCategory::Browser => "browser",
        }
    }

    fn index(self) -> usize {
        match self {
            PatternCategory::Automation => 0,
            PatternCategory::Crawler => 1,
            PatternCategory::Browser => 2,
        }
    }
}

impl fmt::Display for PatternCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown category name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown pattern category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for PatternCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "automation" => Ok(PatternCategory::Automation),
            "crawler" => Ok(PatternCategory::Crawler),
            "browser" => Ok(PatternCategory::Browser),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

/// Removal token returned by [`PatternRegistry::add`].
///
/// Releasing removes the first exact occurrence of the added pattern, once.
/// Handles cannot be cloned, so one `add` is undone by at most one removal:
///
/// ```compile_fail
/// use client_identity::{PatternCategory, PatternRegistry};
///
/// let registry = PatternRegistry::empty();
/// let handle = registry.add(PatternCategory::Crawler, "examplebot");
/// let _copy = handle.clone();
/// ```
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping the handle keeps the pattern registered"]
pub struct PatternHandle {
    category: PatternCategory,
    pattern: String,
    released: bool,
}

impl PatternHandle {
    pub fn category(&self) -> PatternCategory {
        self.category
    }

    /// The stored (lowercased) pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Remove the pattern from `registry`. Later calls do nothing.
    ///
    /// Returns whether this call removed an entry.
    pub fn release(&mut self, registry: &PatternRegistry) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        registry.remove(self.category, &self.pattern)
    }
}

/// Copy of every pattern list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSnapshot {
    pub automation: Vec<String>,
    pub crawler: Vec<String>,
    pub browser: Vec<String>,
}

/// Shared, runtime-mutable pattern lists.
pub struct PatternRegistry {
    lists: [ArcSwap<Vec<String>>; 3],
}

impl PatternRegistry {
    /// Registry with no patterns at all.
    pub fn empty() -> Self {
        Self {
            lists: [
                ArcSwap::from_pointee(Vec::new()),
                ArcSwap::from_pointee(Vec::new()),
                ArcSwap::from_pointee(Vec::new()),
            ],
        }
    }

    /// Registry seeded with the built-in lists.
    pub fn with_defaults() -> Self {
        let seed = |list: &[&str]| {
            ArcSwap::from_pointee(list.iter().map(|p| p.to_string()).collect::<Vec<String>>())
        };
        Self {
            lists: [
                seed(patterns::AUTOMATION),
                seed(patterns::CRAWLER),
                seed(patterns::BROWSER),
            ],
        }
    }

    fn list(&self, category: PatternCategory) -> &ArcSwap<Vec<String>> {
        &self.lists[category.index()]
    }

    /// True when any pattern of `category` is a substring of `text`.
    ///
    /// `text` is lowercased here; callers may pass it raw.
    pub fn matches(&self, category: PatternCategory, text: &str) -> bool {
        let text = text.to_lowercase();
        self.matches_normalized(category, &text)
    }

    /// Like [`matches`](Self::matches) for text that is already lowercase.
    pub(crate) fn matches_normalized(&self, category: PatternCategory, text: &str) -> bool {
        self.list(category)
            .load()
            .iter()
            .any(|p| text.contains(p.as_str()))
    }

    /// Append a pattern, lowercased, and return a handle that removes it.
    pub fn add(&self, category: PatternCategory, pattern: &str) -> PatternHandle {
        let pattern = pattern.to_lowercase();
        self.list(category).rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(pattern.clone());
            next
        });
        tracing::debug!(category = %category, pattern = %pattern, "Pattern added");

        PatternHandle {
            category,
            pattern,
            released: false,
        }
    }

    /// Remove the first entry equal to `pattern`. Comparison is exact.
    pub fn remove(&self, category: PatternCategory, pattern: &str) -> bool {
        let mut removed = false;
        self.list(category).rcu(|current| {
            let mut next = Vec::clone(current);
            removed = match next.iter().position(|p| p == pattern) {
                Some(i) => {
                    next.remove(i);
                    true
                }
                None => false,
            };
            next
        });
        if removed {
            tracing::debug!(category = %category, pattern = %pattern, "Pattern removed");
        }
        removed
    }

    /// Independent copy of one list.
    pub fn snapshot(&self, category: PatternCategory) -> Vec<String> {
        Vec::clone(&self.list(category).load())
    }

    /// Independent copy of every list.
    pub fn snapshot_all(&self) -> PatternSnapshot {
        PatternSnapshot {
            automation: self.snapshot(PatternCategory::Automation),
            crawler: self.snapshot(PatternCategory::Crawler),
            browser: self.snapshot(PatternCategory::Browser),
        }
    }

    pub fn len(&self, category: PatternCategory) -> usize {
        self.list(category).load().len()
    }

    pub fn is_empty(&self, category: PatternCategory) -> bool {
        self.len(category) == 0
    }
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for PatternRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternRegistry")
            .field("automation", &self.len(PatternCategory::Automation))
            .field("crawler", &self.len(PatternCategory::Crawler))
            .field("browser", &self.len(PatternCategory::Browser))
            .finish()
    }
}
