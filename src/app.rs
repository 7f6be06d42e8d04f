//! Aggregate state controller.
//!
//! [`NewsState`] is an explicit state value updated only through the pure
//! [`reduce`] function. [`NewsController`] owns one state value and performs
//! the effects around it: loading the cache and bookmarks, spawning refresh
//! tasks, persisting bookmark toggles and debouncing search input. Background
//! work reports back as [`NewsEvent`]s over a bounded channel, which the owner
//! feeds into [`NewsController::handle_event`].

use futures::FutureExt;
use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::model::{Article, FilterOptions, FilterUpdate};
use crate::remote::NewsService;
use crate::search;
use crate::storage::BookmarkStore;
use crate::util::Debouncer;

/// Capacity of the controller's event channel.
const EVENT_CHANNEL_CAPACITY: usize = 32;

// ============================================================================
// State
// ============================================================================

/// Snapshot of everything the presentation layer renders.
///
/// `filtered` is derived from `articles`, `search_query` and `filters` and is
/// only ever recomputed, never edited. Article lists are shared behind `Arc`
/// so cloning a state for the next reduction is cheap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsState {
    articles: Arc<Vec<Article>>,
    search_query: String,
    filters: FilterOptions,
    bookmarks: BTreeSet<String>,
    is_loading: bool,
    filtered: Arc<Vec<Article>>,
}

impl NewsState {
    /// The canonical, unfiltered article list.
    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    /// The derived view for the current query and filters.
    pub fn filtered(&self) -> &[Article] {
        &self.filtered
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn filters(&self) -> &FilterOptions {
        &self.filters
    }

    pub fn bookmarks(&self) -> &BTreeSet<String> {
        &self.bookmarks
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    fn recompute(&mut self) {
        self.filtered = Arc::new(search::apply_pipeline(
            &self.articles,
            &self.search_query,
            &self.filters,
        ));
    }
}

/// A single state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Replace the canonical list.
    ArticlesLoaded(Vec<Article>),
    SearchQueryChanged(String),
    /// Merge a partial filter change over the current filters.
    FiltersChanged(FilterUpdate),
    BookmarksLoaded(BTreeSet<String>),
    /// Add the id if absent, remove it otherwise.
    BookmarkToggled(String),
    LoadingChanged(bool),
}

/// Apply `action` to `state`, returning the next state.
pub fn reduce(state: &NewsState, action: Action) -> NewsState {
    let mut next = state.clone();
    let view_changed = match action {
        Action::ArticlesLoaded(articles) => {
            next.articles = Arc::new(articles);
            true
        }
        Action::SearchQueryChanged(query) => {
            next.search_query = query;
            true
        }
        Action::FiltersChanged(update) => {
            next.filters = next.filters.merged(update);
            true
        }
        Action::BookmarksLoaded(bookmarks) => {
            next.bookmarks = bookmarks;
            false
        }
        Action::BookmarkToggled(id) => {
            if !next.bookmarks.remove(&id) {
                next.bookmarks.insert(id);
            }
            false
        }
        Action::LoadingChanged(loading) => {
            next.is_loading = loading;
            false
        }
    };
    if view_changed {
        next.recompute();
    }
    next
}

// ============================================================================
// Events
// ============================================================================

/// Where the articles in a finished refresh came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fetch succeeded and the list is the merge saved to the cache.
    Merged,
    /// The fetch failed and the list is whatever the cache held.
    CachedFallback,
}

/// Results of background work, delivered to the controller's owner.
#[derive(Debug)]
pub enum NewsEvent {
    /// A refresh finished with `articles`, either a fresh merge or the cache.
    ///
    /// `generation` identifies the refresh call in logs.
    RefreshCompleted {
        generation: u64,
        articles: Vec<Article>,
        outcome: RefreshOutcome,
    },
    /// A refresh task panicked before producing a list.
    RefreshAborted { generation: u64, error: String },
    /// The debounced search input settled on this query.
    QueryDebounced(String),
}

// ============================================================================
// Controller
// ============================================================================

/// Owns the [`NewsState`] and performs every operation that changes it.
pub struct NewsController {
    state: NewsState,
    service: NewsService,
    bookmarks: BookmarkStore,
    event_tx: mpsc::Sender<NewsEvent>,
    event_rx: mpsc::Receiver<NewsEvent>,
    debouncer: Debouncer,

    /// Generation assigned to the most recent `refresh()` call.
    refresh_generation: u64,
    /// Set once a successful merge has been applied. Cache fallbacks that
    /// settle afterwards are never newer and get ignored.
    merge_applied: bool,
    /// Refreshes spawned but not yet reported back.
    pending_refreshes: usize,
    initialized: bool,
}

impl NewsController {
    pub fn new(service: NewsService, bookmarks: BookmarkStore, search_debounce: Duration) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: NewsState::default(),
            service,
            bookmarks,
            event_tx,
            event_rx,
            debouncer: Debouncer::new(search_debounce),
            refresh_generation: 0,
            merge_applied: false,
            pending_refreshes: 0,
            initialized: false,
        }
    }

    pub fn state(&self) -> &NewsState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    pub fn pending_refreshes(&self) -> usize {
        self.pending_refreshes
    }

    fn dispatch(&mut self, action: Action) {
        self.state = reduce(&self.state, action);
    }

    /// First activation: show cached data, load bookmarks, start a refresh.
    ///
    /// Later calls do nothing. Returns the generation of the spawned refresh,
    /// or `None` if already initialized.
    pub async fn initialize(&mut self) -> Option<u64> {
        if self.initialized {
            return None;
        }
        self.initialized = true;
        self.load_local().await;
        Some(self.refresh())
    }

    /// Load cached articles and bookmarks without touching the network.
    pub async fn load_local(&mut self) {
        let cached = self.service.cache().load().await;
        tracing::info!(count = cached.len(), "Loaded articles from cache");
        self.dispatch(Action::ArticlesLoaded(cached));

        let bookmarks = self.bookmarks.load().await;
        self.dispatch(Action::BookmarksLoaded(bookmarks));
    }

    /// Start a background fetch-and-merge.
    ///
    /// Each call runs its own fetch; nothing is deduplicated or cancelled.
    /// Returns the generation number carried by the resulting event.
    pub fn refresh(&mut self) -> u64 {
        self.refresh_generation += 1;
        let generation = self.refresh_generation;
        self.pending_refreshes += 1;
        self.dispatch(Action::LoadingChanged(true));

        let service = self.service.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let event = match catch_task_panic(fetch_or_fallback(&service)).await {
                Ok((articles, outcome)) => NewsEvent::RefreshCompleted {
                    generation,
                    articles,
                    outcome,
                },
                Err(panic_msg) => {
                    tracing::error!(task = "refresh", generation, error = %panic_msg, "Background task panicked");
                    NewsEvent::RefreshAborted {
                        generation,
                        error: panic_msg,
                    }
                }
            };
            if let Err(e) = tx.send(event).await {
                tracing::warn!(error = %e, event = "refresh", "Channel send failed (receiver dropped)");
            }
        });

        tracing::debug!(generation, pending = self.pending_refreshes, "Refresh started");
        generation
    }

    /// Apply an event produced by background work.
    ///
    /// Merged results apply in the order they settle: each merge reads the
    /// cache after its own fetch, so the last one to settle holds everything
    /// saved before it. A cache fallback only applies while no merge has.
    pub fn handle_event(&mut self, event: NewsEvent) {
        match event {
            NewsEvent::RefreshCompleted {
                generation,
                articles,
                outcome,
            } => {
                self.pending_refreshes = self.pending_refreshes.saturating_sub(1);
                match outcome {
                    RefreshOutcome::Merged => {
                        self.merge_applied = true;
                        tracing::info!(generation, count = articles.len(), "Refresh applied");
                        self.dispatch(Action::ArticlesLoaded(articles));
                    }
                    RefreshOutcome::CachedFallback if !self.merge_applied => {
                        tracing::info!(generation, count = articles.len(), "Cached articles applied");
                        self.dispatch(Action::ArticlesLoaded(articles));
                    }
                    RefreshOutcome::CachedFallback => {
                        tracing::debug!(generation, "Ignoring cache fallback after a merge");
                    }
                }
                self.finish_refresh();
            }
            NewsEvent::RefreshAborted { generation, error } => {
                self.pending_refreshes = self.pending_refreshes.saturating_sub(1);
                tracing::warn!(generation, error = %error, "Refresh aborted, keeping current articles");
                self.finish_refresh();
            }
            NewsEvent::QueryDebounced(query) => {
                self.dispatch(Action::SearchQueryChanged(query));
            }
        }
    }

    fn finish_refresh(&mut self) {
        if self.pending_refreshes == 0 {
            self.dispatch(Action::LoadingChanged(false));
        }
    }

    /// Wait for the next background event.
    pub async fn next_event(&mut self) -> Option<NewsEvent> {
        self.event_rx.recv().await
    }

    /// Process events until no refresh is outstanding.
    pub async fn settle(&mut self) {
        while self.pending_refreshes > 0 {
            match self.next_event().await {
                Some(event) => self.handle_event(event),
                None => break,
            }
        }
    }

    /// Set the query immediately, dropping any debounced update still waiting.
    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.debouncer.cancel();
        self.dispatch(Action::SearchQueryChanged(query.into()));
    }

    /// Set the query after the input has been quiet for the debounce delay.
    ///
    /// Arrives later as [`NewsEvent::QueryDebounced`]; only the last call in
    /// a quiet window is delivered.
    pub fn set_search_query_debounced(&mut self, query: impl Into<String>) {
        let query = query.into();
        let tx = self.event_tx.clone();
        self.debouncer.call(async move {
            if let Err(e) = tx.send(NewsEvent::QueryDebounced(query)).await {
                tracing::warn!(error = %e, event = "query", "Channel send failed (receiver dropped)");
            }
        });
    }

    pub fn set_filters(&mut self, update: FilterUpdate) {
        self.dispatch(Action::FiltersChanged(update));
    }

    /// Flip bookmark membership for `id` and persist the set.
    ///
    /// Returns whether the article is bookmarked afterwards. A failed write
    /// is logged; the in-memory set still changes.
    pub async fn toggle_bookmark(&mut self, id: &str) -> bool {
        self.dispatch(Action::BookmarkToggled(id.to_string()));
        self.bookmarks.save(&self.state.bookmarks).await;
        self.state.bookmarks.contains(id)
    }

    pub fn is_bookmarked(&self, id: &str) -> bool {
        self.state.bookmarks.contains(id)
    }

    /// Bookmarked articles present in the canonical list, in list order.
    pub fn bookmarked_articles(&self) -> Vec<&Article> {
        self.state
            .articles
            .iter()
            .filter(|article| self.state.bookmarks.contains(&article.id))
            .collect()
    }

    pub fn find_by_slug(&self, slug: &str) -> Option<&Article> {
        search::find_by_slug(&self.state.articles, slug)
    }

    /// Nothing to show and nothing coming: the caller should render an
    /// explicit empty/error state.
    pub fn is_empty_state(&self) -> bool {
        !self.state.is_loading && self.state.articles.is_empty()
    }
}

async fn fetch_or_fallback(service: &NewsService) -> (Vec<Article>, RefreshOutcome) {
    match service.try_fetch_and_merge().await {
        Ok(merged) => (merged, RefreshOutcome::Merged),
        Err(e) => {
            tracing::warn!(error = %e, "Fetch failed, serving cached articles");
            (service.cache().load().await, RefreshOutcome::CachedFallback)
        }
    }
}

/// Run `future`, turning a panic into `Err(message)`.
async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            }
        })
}
