//! Search, filter and sort over article lists.
//!
//! Every function here is pure: it borrows its input and returns a new list.
//! [`apply_pipeline`] chains them in the one order the UI relies on:
//! search → content type → source → topic → sort.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use crate::model::{Agent, Article, ContentType, FilterOptions, SortMode};

/// Case-insensitive substring search over title, description, tags, section
/// headings and paragraphs. A blank query returns the input unchanged.
pub fn search(articles: &[Article], query: &str) -> Vec<Article> {
    if query.trim().is_empty() {
        return articles.to_vec();
    }
    let needle = query.to_lowercase();
    articles
        .iter()
        .filter(|article| matches_query(article, &needle))
        .cloned()
        .collect()
}

fn matches_query(article: &Article, needle: &str) -> bool {
    let contains = |text: &str| text.to_lowercase().contains(needle);

    contains(&article.title)
        || contains(&article.description)
        || article.tags.iter().any(|tag| contains(tag))
        || article.content.iter().any(|section| {
            contains(&section.heading) || section.paragraphs.iter().any(|p| contains(p))
        })
}

/// Keep articles matching at least one selected content type.
pub fn filter_by_content_type(articles: &[Article], types: &BTreeSet<ContentType>) -> Vec<Article> {
    if types.is_empty() {
        return articles.to_vec();
    }
    articles
        .iter()
        .filter(|article| types.iter().any(|t| has_content_type(article, *t)))
        .cloned()
        .collect()
}

fn has_content_type(article: &Article, content_type: ContentType) -> bool {
    match content_type {
        ContentType::Video => article.has_video(),
        ContentType::Article => article.has_content(),
        ContentType::Wikipedia => article.has_source(Agent::Wikipedia.as_str()),
    }
}

/// Keep articles with a source link from one of `sources` (exact name match).
pub fn filter_by_source(articles: &[Article], sources: &BTreeSet<String>) -> Vec<Article> {
    if sources.is_empty() {
        return articles.to_vec();
    }
    articles
        .iter()
        .filter(|article| {
            article
                .source_links
                .iter()
                .any(|link| sources.contains(link.source.as_str()))
        })
        .cloned()
        .collect()
}

/// Keep articles with a tag that contains any of `topics`, ignoring case.
pub fn filter_by_topic(articles: &[Article], topics: &BTreeSet<String>) -> Vec<Article> {
    if topics.is_empty() {
        return articles.to_vec();
    }
    let topics: Vec<String> = topics.iter().map(|t| t.to_lowercase()).collect();
    articles
        .iter()
        .filter(|article| {
            article.tags.iter().any(|tag| {
                let tag = tag.to_lowercase();
                topics.iter().any(|topic| tag.contains(topic.as_str()))
            })
        })
        .cloned()
        .collect()
}

/// Stable sort by `mode`; equal keys keep their input order.
pub fn sort_articles(articles: &[Article], mode: SortMode) -> Vec<Article> {
    let mut sorted = articles.to_vec();
    match mode {
        SortMode::Recent => sorted.sort_by_key(|a| Reverse(a.timestamp_millis())),
        SortMode::Watched => {}
        SortMode::Highlighted => sorted.sort_by_key(|a| !a.has_video()),
    }
    sorted
}

/// Compute the derived view for the given query and filters.
pub fn apply_pipeline(articles: &[Article], query: &str, filters: &FilterOptions) -> Vec<Article> {
    let results = search(articles, query);
    let results = filter_by_content_type(&results, &filters.content_types);
    let results = filter_by_source(&results, &filters.sources);
    let results = filter_by_topic(&results, &filters.topics);
    sort_articles(&results, filters.sort_by)
}

/// Detail lookup by exact slug. Slugs are not guaranteed unique; the first
/// match in list order wins.
pub fn find_by_slug<'a>(articles: &'a [Article], slug: &str) -> Option<&'a Article> {
    articles.iter().find(|article| article.slug == slug)
}
