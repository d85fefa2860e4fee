//! Core value types shared by tiles and the theme layer.
//!
//! Cache metadata travels with every render tree so that the page cache can
//! be invalidated by tag and varied by context.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Route name of the site front page.
pub const FRONT_ROUTE: &str = "<front>";

/// How long a render tree may be cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum CacheMaxAge {
    /// Cacheable until one of its tags is invalidated.
    #[default]
    Permanent,
    /// Cacheable for this many seconds (0 = uncacheable).
    Seconds(u32),
}

impl CacheMaxAge {
    /// The more restrictive of two max-ages.
    pub fn min(self, other: Self) -> Self {
        match (self, other) {
            (Self::Permanent, other) => other,
            (this, Self::Permanent) => this,
            (Self::Seconds(a), Self::Seconds(b)) => Self::Seconds(a.min(b)),
        }
    }
}

impl From<i64> for CacheMaxAge {
    fn from(value: i64) -> Self {
        if value < 0 {
            Self::Permanent
        } else {
            Self::Seconds(u32::try_from(value).unwrap_or(u32::MAX))
        }
    }
}

impl From<CacheMaxAge> for i64 {
    fn from(value: CacheMaxAge) -> Self {
        match value {
            CacheMaxAge::Permanent => -1,
            CacheMaxAge::Seconds(s) => i64::from(s),
        }
    }
}

/// Cacheability of a render tree: invalidation tags, variation contexts and
/// a max-age.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub contexts: BTreeSet<String>,
    #[serde(default, rename = "max-age")]
    pub max_age: CacheMaxAge,
}

impl CacheMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.contexts.insert(context.into());
        self
    }

    pub fn with_max_age(mut self, max_age: CacheMaxAge) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn add_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
    }

    pub fn add_contexts<I, S>(&mut self, contexts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contexts.extend(contexts.into_iter().map(Into::into));
    }

    /// Combine with another set of metadata.
    ///
    /// Tags and contexts are unioned; the lower max-age wins.
    pub fn merge(mut self, other: &CacheMetadata) -> Self {
        self.tags.extend(other.tags.iter().cloned());
        self.contexts.extend(other.contexts.iter().cloned());
        self.max_age = self.max_age.min(other.max_age);
        self
    }

    /// Merge in the cacheability of something the output depends on.
    pub fn add_dependency(&mut self, dependency: &dyn Cacheable) {
        let merged = std::mem::take(self).merge(&dependency.cache_metadata());
        *self = merged;
    }
}

/// Anything that contributes cacheability to a render tree.
pub trait Cacheable {
    fn cache_metadata(&self) -> CacheMetadata;
}

impl Cacheable for CacheMetadata {
    fn cache_metadata(&self) -> CacheMetadata {
        self.clone()
    }
}

/// A routed or plain URL.
///
/// `path` always starts with `/`. Routed URLs keep their route name so the
/// theme layer can detect the front page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Url {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_name: Option<String>,
    pub path: String,
}

impl Url {
    /// URL for a named route already resolved to a path.
    pub fn routed(route_name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            route_name: Some(route_name.into()),
            path: normalize_path(path.into()),
        }
    }

    /// URL with no route behind it.
    pub fn unrouted(path: impl Into<String>) -> Self {
        Self {
            route_name: None,
            path: normalize_path(path.into()),
        }
    }

    /// The front page URL.
    pub fn front() -> Self {
        Self::routed(FRONT_ROUTE, "/")
    }

    pub fn route_name(&self) -> Option<&str> {
        self.route_name.as_deref()
    }

    pub fn is_front(&self) -> bool {
        self.route_name() == Some(FRONT_ROUTE)
    }

    /// Path without the leading slash (`node/1/edit`), as used in system path
    /// data attributes.
    pub fn internal_path(&self) -> &str {
        self.path.trim_start_matches('/')
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

fn normalize_path(path: String) -> String {
    if path.starts_with('/') || path.starts_with("http://") || path.starts_with("https://") {
        path
    } else {
        format!("/{path}")
    }
}

/// A link: visible text plus a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub url: Url,
}

impl Link {
    pub fn new(text: impl Into<String>, url: Url) -> Self {
        Self {
            text: text.into(),
            url,
        }
    }
}

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessResult {
    /// Explicitly grant access.
    Allowed,
    /// Explicitly deny access.
    Forbidden,
    /// No opinion; treated as denied when it is the final answer.
    Neutral,
}

impl AccessResult {
    pub fn is_allowed(self) -> bool {
        self == Self::Allowed
    }

    pub fn allowed_if(condition: bool) -> Self {
        if condition { Self::Allowed } else { Self::Neutral }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn max_age_min_prefers_finite() {
        assert_eq!(
            CacheMaxAge::Permanent.min(CacheMaxAge::Seconds(30)),
            CacheMaxAge::Seconds(30)
        );
        assert_eq!(
            CacheMaxAge::Seconds(10).min(CacheMaxAge::Seconds(30)),
            CacheMaxAge::Seconds(10)
        );
        assert_eq!(
            CacheMaxAge::Permanent.min(CacheMaxAge::Permanent),
            CacheMaxAge::Permanent
        );
    }

    #[test]
    fn max_age_serializes_permanent_as_minus_one() {
        let meta = CacheMetadata::new().with_tag("a");
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["max-age"], -1);

        let back: CacheMetadata = serde_json::from_str(r#"{"max-age": 0}"#).unwrap();
        assert_eq!(back.max_age, CacheMaxAge::Seconds(0));
    }

    #[test]
    fn merge_unions_tags_and_contexts() {
        let a = CacheMetadata::new().with_tag("one").with_context("route");
        let b = CacheMetadata::new()
            .with_tag("two")
            .with_context("route")
            .with_max_age(CacheMaxAge::Seconds(60));

        let merged = a.merge(&b);
        assert_eq!(merged.tags.len(), 2);
        assert_eq!(merged.contexts.len(), 1);
        assert_eq!(merged.max_age, CacheMaxAge::Seconds(60));
    }

    #[test]
    fn url_internal_path_and_front() {
        let url = Url::routed("entity.node.edit_form", "node/1/edit");
        assert_eq!(url.path, "/node/1/edit");
        assert_eq!(url.internal_path(), "node/1/edit");
        assert!(!url.is_front());

        let front = Url::front();
        assert!(front.is_front());
        assert_eq!(front.to_string(), "/");
        assert_eq!(front.internal_path(), "");
    }
}
