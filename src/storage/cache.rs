use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use super::kv::KvStore;
use crate::model::Article;

/// Key holding the serialized article list.
pub const ARTICLES_KEY: &str = "newsdesk.articles";
/// Key holding the epoch-millisecond time of the last successful save.
pub const CACHE_TIMESTAMP_KEY: &str = "newsdesk.cache_timestamp";
/// Cached data younger than this is considered fresh.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Article list persisted in a [`KvStore`].
///
/// Every operation fails soft: storage and decoding problems are logged and
/// treated as "no cache". Freshness is a hint for callers and never gates
/// [`load`](ArticleCache::load).
#[derive(Clone)]
pub struct ArticleCache {
    store: Arc<dyn KvStore>,
}

impl ArticleCache {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// The cached articles, or an empty list if nothing usable is stored.
    pub async fn load(&self) -> Vec<Article> {
        let raw = match self.store.get(ARTICLES_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read article cache");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Article>>(&raw) {
            Ok(articles) => {
                tracing::debug!(count = articles.len(), "Loaded cached articles");
                articles
            }
            Err(e) => {
                tracing::warn!(error = %e, bytes = raw.len(), "Cached articles are corrupt, ignoring");
                Vec::new()
            }
        }
    }

    /// Persist `articles` and stamp the save time.
    ///
    /// The timestamp is only written after the list itself was stored, so a
    /// rejected write (e.g. quota exceeded) leaves the previous cache and its
    /// freshness intact.
    pub async fn save(&self, articles: &[Article]) {
        self.save_at(articles, Utc::now()).await
    }

    pub(crate) async fn save_at(&self, articles: &[Article], now: DateTime<Utc>) {
        let serialized = match serde_json::to_string(articles) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize articles for cache");
                return;
            }
        };

        if let Err(e) = self.store.set(ARTICLES_KEY, &serialized).await {
            tracing::warn!(error = %e, count = articles.len(), "Failed to write article cache");
            return;
        }

        let stamp = now.timestamp_millis().to_string();
        if let Err(e) = self.store.set(CACHE_TIMESTAMP_KEY, &stamp).await {
            tracing::warn!(error = %e, "Failed to write cache timestamp");
            return;
        }

        tracing::debug!(count = articles.len(), bytes = serialized.len(), "Article cache saved");
    }

    /// When the cache was last saved, if known.
    pub async fn last_saved(&self) -> Option<DateTime<Utc>> {
        let raw = match self.store.get(CACHE_TIMESTAMP_KEY).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read cache timestamp");
                return None;
            }
        };
        raw.trim()
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis)
    }

    /// True if the last save happened less than [`FRESHNESS_WINDOW`] ago.
    pub async fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now()).await
    }

    pub async fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        let Some(saved) = self.last_saved().await else {
            return false;
        };
        let age = now.signed_duration_since(saved);
        match age.to_std() {
            Ok(age) => age < FRESHNESS_WINDOW,
            // Saved "in the future" (clock moved backwards): still fresh
            Err(_) => true,
        }
    }

    /// Drop the cached list and its timestamp.
    pub async fn clear(&self) {
        for key in [ARTICLES_KEY, CACHE_TIMESTAMP_KEY] {
            if let Err(e) = self.store.remove(key).await {
                tracing::warn!(error = %e, key = key, "Failed to clear cache entry");
            }
        }
        tracing::info!("Article cache cleared");
    }
}
