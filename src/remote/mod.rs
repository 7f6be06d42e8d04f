//! Backend access: fetching the article list and merging it into the cache.
//!
//! - [`fetcher`] - single-request HTTP client for `GET /news`; errors propagate
//! - [`merge`] - pure normalisation and dedup/prepend/cap logic
//! - [`service`] - fetch → normalise → merge → save, degrading to cached data
//!
//! # Example
//!
//! ```ignore
//! use newsdesk::remote::{NewsClient, NewsService};
//!
//! let service = NewsService::new(NewsClient::new(&config)?, cache);
//! let articles = service.fetch_and_merge().await; // never fails
//! ```

mod fetcher;
mod merge;
mod service;

pub use fetcher::{FetchError, NewsClient};
pub use merge::{merge_articles, normalize_articles, MAX_CACHED_ARTICLES};
pub use service::NewsService;
