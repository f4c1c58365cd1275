//! Cache keys for resource rows
//!
//! One row may be cached several times, once per preload set. Every variant
//! shares the `Model:id` prefix so a mutation can drop them all by pattern.

use std::fmt;

/// Cache key for one row, optionally qualified by its preload set
///
/// Formats as `Model:id`, or `Model:id:a-b` where `a-b` is the sorted,
/// deduplicated preload list joined by `-`. Preload order in the request
/// does not matter.
///
/// ```rust
/// use resource_service::cache::CacheKey;
///
/// let key = CacheKey::new("Widget", 7).with_preloads(["parts", "owner"]);
/// assert_eq!(key.to_string(), "Widget:7:owner-parts");
/// assert_eq!(CacheKey::new("Widget", 7).to_string(), "Widget:7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    model: String,
    id: u64,
    preloads: Vec<String>,
}

impl CacheKey {
    pub fn new(model: impl Into<String>, id: u64) -> Self {
        Self {
            model: model.into(),
            id,
            preloads: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_preloads<I, S>(mut self, preloads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.preloads = preloads
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        self.preloads.sort();
        self.preloads.dedup();
        self
    }

    /// Glob patterns covering this row and all of its preload variants
    ///
    /// Two patterns are needed: `Model:id*` would also match `Model:id0`.
    pub fn invalidation_patterns(&self) -> [String; 2] {
        let bare = format!("{}:{}", escape_glob(&self.model), self.id);
        let variants = format!("{bare}:*");
        [bare, variants]
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.model, self.id)?;
        if !self.preloads.is_empty() {
            write!(f, ":{}", self.preloads.join("-"))?;
        }
        Ok(())
    }
}

fn escape_glob(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
