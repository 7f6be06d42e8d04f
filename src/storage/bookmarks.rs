use std::collections::BTreeSet;
use std::sync::Arc;

use super::kv::KvStore;

/// Key holding the bookmarked article ids as a JSON array.
pub const BOOKMARKS_KEY: &str = "newsdesk.bookmarks";

/// Bookmark set persisted independently of the article cache.
#[derive(Clone)]
pub struct BookmarkStore {
    store: Arc<dyn KvStore>,
}

impl BookmarkStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Stored bookmark ids; empty when absent, unreadable or corrupt.
    pub async fn load(&self) -> BTreeSet<String> {
        let raw = match self.store.get(BOOKMARKS_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return BTreeSet::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read bookmarks");
                return BTreeSet::new();
            }
        };

        serde_json::from_str::<Vec<String>>(&raw)
            .map(|ids| ids.into_iter().filter(|id| !id.is_empty()).collect())
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Stored bookmarks are corrupt, ignoring");
                BTreeSet::new()
            })
    }

    /// Persist the full set. Failures are logged; the in-memory set stays authoritative.
    pub async fn save(&self, bookmarks: &BTreeSet<String>) {
        let ids: Vec<&str> = bookmarks.iter().map(String::as_str).collect();
        let serialized = match serde_json::to_string(&ids) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize bookmarks");
                return;
            }
        };

        match self.store.set(BOOKMARKS_KEY, &serialized).await {
            Ok(()) => tracing::debug!(count = bookmarks.len(), "Bookmarks saved"),
            Err(e) => tracing::warn!(error = %e, count = bookmarks.len(), "Failed to save bookmarks"),
        }
    }
}
