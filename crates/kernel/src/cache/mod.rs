//! Render cache for tile output, keyed by placement and cache contexts.
//!
//! Entries are invalidated by tag: every tag a tile's output carries is
//! indexed to the keys it was stored under. Fragments with a max-age expire
//! on their own; permanent ones stay until a tag drops them or capacity
//! eviction does. Evicted keys are pruned from the tag index.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use moka::Expiry;
use moka::notification::RemovalCause;
use moka::sync::Cache;
use tracing::debug;

use dom_bootstrap_sdk::types::{CacheMaxAge, CacheMetadata};

/// Maximum number of cached fragments.
const MAX_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    html: String,
    /// `None` for fragments cacheable until a tag is invalidated.
    expires: Option<Instant>,
    tags: Vec<String>,
}

/// Per-entry expiry from the fragment's max-age.
struct FragmentExpiry;

impl Expiry<String, Entry> for FragmentExpiry {
    fn expire_after_create(&self, _key: &String, entry: &Entry, created_at: Instant) -> Option<Duration> {
        entry.expires.map(|at| at.saturating_duration_since(created_at))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        entry.expires.map(|at| at.saturating_duration_since(updated_at))
    }
}

/// In-process cache of rendered tile fragments.
#[derive(Clone)]
pub struct RenderCache {
    inner: Arc<RenderCacheInner>,
}

struct RenderCacheInner {
    fragments: Cache<String, Entry>,

    /// Tag → keys stored with that tag.
    tags: Arc<DashMap<String, BTreeSet<String>>>,

    /// Placement → cache contexts its output varied by when last rendered.
    contexts: DashMap<String, BTreeSet<String>>,
}

impl RenderCache {
    pub fn new() -> Self {
        let tags: Arc<DashMap<String, BTreeSet<String>>> = Arc::new(DashMap::new());
        let index = Arc::clone(&tags);

        let fragments = Cache::builder()
            .max_capacity(MAX_CAPACITY)
            .expire_after(FragmentExpiry)
            .eviction_listener(move |key: Arc<String>, entry: Entry, cause: RemovalCause| {
                // A replaced key is still live under the new entry's tags.
                if matches!(cause, RemovalCause::Replaced) {
                    return;
                }
                for tag in &entry.tags {
                    if let Some(mut keys) = index.get_mut(tag) {
                        keys.remove(key.as_str());
                    }
                    index.remove_if(tag, |_, keys| keys.is_empty());
                }
            })
            .build();

        Self {
            inner: Arc::new(RenderCacheInner {
                fragments,
                tags,
                contexts: DashMap::new(),
            }),
        }
    }

    /// Build a key from a placement id and the resolved values of its
    /// cache contexts.
    pub fn key<'a>(placement: &str, context_values: impl IntoIterator<Item = (&'a str, String)>) -> String {
        let mut key = placement.to_string();
        for (context, value) in context_values {
            key.push('|');
            key.push_str(context);
            key.push('=');
            key.push_str(&value);
        }
        key
    }

    /// Contexts a placement's output is known to vary by.
    ///
    /// Only known after the placement has been rendered once.
    pub fn known_contexts(&self, placement: &str) -> Option<BTreeSet<String>> {
        self.inner.contexts.get(placement).map(|c| c.clone())
    }

    /// Record the contexts a placement's output varied by. Sets only grow.
    pub fn remember_contexts(&self, placement: &str, contexts: &BTreeSet<String>) {
        self.inner
            .contexts
            .entry(placement.to_string())
            .or_default()
            .extend(contexts.iter().cloned());
    }

    /// Look up a fragment. Expired entries are never returned, even before
    /// eviction has reclaimed them.
    pub fn get(&self, key: &str) -> Option<String> {
        let entry = self.inner.fragments.get(key)?;
        if entry.expires.is_some_and(|at| at <= Instant::now()) {
            self.inner.fragments.invalidate(key);
            debug!(key = %key, "render cache entry expired");
            return None;
        }
        debug!(key = %key, "render cache hit");
        Some(entry.html)
    }

    /// Store a fragment. Fragments with max-age 0 are not stored.
    pub fn set(&self, key: &str, html: &str, metadata: &CacheMetadata) {
        let expires = match metadata.max_age {
            CacheMaxAge::Permanent => None,
            CacheMaxAge::Seconds(0) => {
                debug!(key = %key, "fragment is uncacheable");
                return;
            }
            CacheMaxAge::Seconds(secs) => Some(Instant::now() + Duration::from_secs(u64::from(secs))),
        };

        self.inner.fragments.insert(
            key.to_string(),
            Entry {
                html: html.to_string(),
                expires,
                tags: metadata.tags.iter().cloned().collect(),
            },
        );
        for tag in &metadata.tags {
            self.inner
                .tags
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
        debug!(key = %key, tags = ?metadata.tags, "render cache set");
    }

    /// Drop every fragment stored with `tag`.
    pub fn invalidate_tag(&self, tag: &str) -> usize {
        let Some((_, keys)) = self.inner.tags.remove(tag) else {
            return 0;
        };
        for key in &keys {
            self.inner.fragments.invalidate(key);
        }
        debug!(tag = %tag, keys_invalidated = keys.len(), "tag invalidated");
        keys.len()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.fragments.run_pending_tasks();
        CacheStats {
            entry_count: self.inner.fragments.entry_count(),
            tag_count: self.inner.tags.len(),
        }
    }
}

impl Default for RenderCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub entry_count: u64,
    pub tag_count: usize,
}

impl std::fmt::Debug for RenderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderCache").finish()
    }
}
