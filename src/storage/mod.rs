//! Local persistence: a string key-value store and the article cache and
//! bookmark set layered on top of it.

mod bookmarks;
mod cache;
mod kv;
mod schema;
mod types;

pub use bookmarks::{BookmarkStore, BOOKMARKS_KEY};
pub use cache::{ArticleCache, ARTICLES_KEY, CACHE_TIMESTAMP_KEY, FRESHNESS_WINDOW};
pub use kv::{KvStore, MemoryStore};
pub use schema::Database;
pub use types::StorageError;
