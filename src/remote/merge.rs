use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::model::{Article, Timestamp};
use crate::util::generate_slug;

/// The cache never holds more articles than this.
pub const MAX_CACHED_ARTICLES: usize = 100;

/// Backfill fields the backend may omit, using the fetch time.
///
/// - empty `id` → `article-{fetch millis}-{position}`
/// - missing (or zero/empty) `timestamp` → fetch time in epoch millis
/// - empty `slug` → slug of the title, or the id if the title has none
pub fn normalize_articles(articles: Vec<Article>, fetched_at: DateTime<Utc>) -> Vec<Article> {
    let millis = fetched_at.timestamp_millis();

    articles
        .into_iter()
        .enumerate()
        .map(|(index, mut article)| {
            if article.id.trim().is_empty() {
                article.id = format!("article-{millis}-{index}");
            }
            if article.timestamp.as_ref().map_or(true, is_unset) {
                article.timestamp = Some(Timestamp::Integer(millis));
            }
            if article.slug.trim().is_empty() {
                let slug = generate_slug(&article.title);
                article.slug = if slug.is_empty() {
                    article.id.clone()
                } else {
                    slug
                };
            }
            article
        })
        .collect()
}

fn is_unset(ts: &Timestamp) -> bool {
    match ts {
        Timestamp::Integer(ms) => *ms == 0,
        Timestamp::Float(ms) => *ms == 0.0 || ms.is_nan(),
        Timestamp::Text(text) => text.is_empty(),
    }
}

/// Prepend genuinely new articles to the existing list and cap the result.
///
/// An incoming article is new if no existing article (and no earlier
/// incoming one) has its id. New articles keep their fetch order and go in
/// front of all existing ones regardless of publish time; anything past
/// `cap` is dropped from the tail, so the oldest merges are evicted first.
pub fn merge_articles(incoming: Vec<Article>, existing: Vec<Article>, cap: usize) -> Vec<Article> {
    let mut seen: HashSet<String> = existing.iter().map(|a| a.id.clone()).collect();

    let mut merged: Vec<Article> = incoming
        .into_iter()
        .filter(|article| seen.insert(article.id.clone()))
        .collect();
    merged.extend(existing);
    merged.truncate(cap);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn article(id: &str, ts: i64) -> Article {
        Article {
            id: id.to_string(),
            title: format!("Title {id}"),
            slug: id.to_string(),
            timestamp: Some(Timestamp::Integer(ts)),
            ..Article::default()
        }
    }

    fn ids(articles: &[Article]) -> Vec<&str> {
        articles.iter().map(|a| a.id.as_str()).collect()
    }

    fn fetch_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_normalize_backfills_missing_fields() {
        let raw = vec![
            Article {
                title: "Gemini Ultra Benchmarks".into(),
                ..Article::default()
            },
            article("keep", 42),
        ];
        let millis = fetch_time().timestamp_millis();

        let normalized = normalize_articles(raw, fetch_time());

        assert_eq!(normalized[0].id, format!("article-{millis}-0"));
        assert_eq!(normalized[0].timestamp, Some(Timestamp::Integer(millis)));
        assert_eq!(normalized[0].slug, "gemini-ultra-benchmarks");
        assert_eq!(normalized[1], article("keep", 42));
    }

    #[test]
    fn test_normalize_treats_zero_timestamp_as_missing() {
        let raw = vec![Article {
            id: "z".into(),
            timestamp: Some(Timestamp::Integer(0)),
            ..Article::default()
        }];
        let normalized = normalize_articles(raw, fetch_time());
        assert_eq!(
            normalized[0].timestamp,
            Some(Timestamp::Integer(fetch_time().timestamp_millis()))
        );
        // No title to slug from
        assert_eq!(normalized[0].slug, "z");
    }

    #[test]
    fn test_merge_prepends_new_and_skips_known() {
        let existing = vec![article("a", 100), article("b", 200)];
        let incoming = vec![article("b", 999), article("c", 300)];

        let merged = merge_articles(incoming, existing, MAX_CACHED_ARTICLES);

        assert_eq!(ids(&merged), vec!["c", "a", "b"]);
        // The cached copy of "b" wins over the refetched one
        assert_eq!(merged[2].timestamp, Some(Timestamp::Integer(200)));
    }

    #[test]
    fn test_merge_dedupes_within_incoming() {
        let incoming = vec![article("x", 1), article("x", 2), article("y", 3)];
        let merged = merge_articles(incoming, Vec::new(), MAX_CACHED_ARTICLES);
        assert_eq!(ids(&merged), vec!["x", "y"]);
        assert_eq!(merged[0].timestamp, Some(Timestamp::Integer(1)));
    }

    #[test]
    fn test_merge_caps_by_dropping_oldest_merged() {
        let existing: Vec<Article> = (0..95).map(|i| article(&format!("old-{i}"), i)).collect();
        let incoming: Vec<Article> = (0..10).map(|i| article(&format!("new-{i}"), 0)).collect();

        let merged = merge_articles(incoming, existing, MAX_CACHED_ARTICLES);

        assert_eq!(merged.len(), 100);
        assert_eq!(merged[0].id, "new-0");
        assert_eq!(merged[9].id, "new-9");
        assert_eq!(merged[99].id, "old-89");
    }

    #[test]
    fn test_merge_with_self_is_identity() {
        let cached: Vec<Article> = (0..5).map(|i| article(&i.to_string(), i)).collect();
        let merged = merge_articles(cached.clone(), cached.clone(), MAX_CACHED_ARTICLES);
        assert_eq!(merged, cached);
    }
}
