use chrono::Utc;

use super::fetcher::{FetchError, NewsClient};
use super::merge::{merge_articles, normalize_articles, MAX_CACHED_ARTICLES};
use crate::model::Article;
use crate::storage::ArticleCache;

/// Fetch-and-cache pipeline shared by the controller and the CLI.
///
/// Cheap to clone: the HTTP client and the store are reference-counted.
#[derive(Clone)]
pub struct NewsService {
    client: NewsClient,
    cache: ArticleCache,
}

impl NewsService {
    pub fn new(client: NewsClient, cache: ArticleCache) -> Self {
        Self { client, cache }
    }

    pub fn client(&self) -> &NewsClient {
        &self.client
    }

    pub fn cache(&self) -> &ArticleCache {
        &self.cache
    }

    /// Fetch fresh articles, merge them into the cache, and return the merged list.
    ///
    /// Never fails: when the backend is unreachable or answers with an
    /// error, the currently cached articles are returned instead. Callers
    /// that need to see fetch errors use [`try_fetch_and_merge`](Self::try_fetch_and_merge).
    pub async fn fetch_and_merge(&self) -> Vec<Article> {
        match self.try_fetch_and_merge().await {
            Ok(merged) => merged,
            Err(e) => {
                tracing::warn!(error = %e, "Fetch failed, serving cached articles");
                self.cache.load().await
            }
        }
    }

    /// Like [`fetch_and_merge`](Self::fetch_and_merge), but a failed fetch is
    /// returned as an error and the cache is left untouched.
    ///
    /// The cache is read only after the fetch settles, so each merge builds
    /// on everything saved before it.
    pub async fn try_fetch_and_merge(&self) -> Result<Vec<Article>, FetchError> {
        let fetched_at = Utc::now();
        let fetched = self.client.fetch_remote().await?;

        let incoming = normalize_articles(fetched, fetched_at);
        let existing = self.cache.load().await;
        let previous = existing.len();
        let merged = merge_articles(incoming, existing, MAX_CACHED_ARTICLES);

        self.cache.save(&merged).await;

        tracing::info!(
            previous = previous,
            total = merged.len(),
            "Merged fetched articles into cache"
        );
        Ok(merged)
    }
}
