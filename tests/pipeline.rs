//! Property tests for the pure merge and search pipeline.

use std::collections::{BTreeSet, HashSet};

use newsdesk::model::{Article, ContentType, FilterOptions, SortMode, Source, SourceLink, Timestamp};
use newsdesk::remote::{merge_articles, MAX_CACHED_ARTICLES};
use newsdesk::search::{apply_pipeline, filter_by_topic, search, sort_articles};
use proptest::prelude::*;

fn article(id: &str, ts: i64) -> Article {
    Article {
        id: id.to_string(),
        slug: id.to_string(),
        timestamp: Some(Timestamp::Integer(ts)),
        ..Article::default()
    }
}

fn ids(articles: &[Article]) -> Vec<&str> {
    articles.iter().map(|a| a.id.as_str()).collect()
}

/// Lists with unique ids, as the cache always holds.
fn arb_cached(max: usize) -> impl Strategy<Value = Vec<Article>> {
    prop::collection::btree_set(0u32..500, 0..max).prop_flat_map(|keys| {
        let n = keys.len();
        (Just(keys), prop::collection::vec(0i64..10_000, n)).prop_map(|(keys, stamps)| {
            keys.into_iter()
                .zip(stamps)
                .map(|(k, ts)| article(&format!("id-{k}"), ts))
                .collect()
        })
    })
}

proptest! {
    #[test]
    fn prop_merge_with_self_is_stable(cached in arb_cached(120)) {
        let mut expected = cached;
        expected.truncate(MAX_CACHED_ARTICLES);

        let merged = merge_articles(expected.clone(), expected.clone(), MAX_CACHED_ARTICLES);
        prop_assert_eq!(&merged, &expected);

        let again = merge_articles(merged.clone(), merged.clone(), MAX_CACHED_ARTICLES);
        prop_assert_eq!(again, merged);
    }

    #[test]
    fn prop_merge_never_duplicates_or_exceeds_cap(
        incoming in arb_cached(80),
        existing in arb_cached(80),
    ) {
        let merged = merge_articles(incoming.clone(), existing.clone(), MAX_CACHED_ARTICLES);
        prop_assert!(merged.len() <= MAX_CACHED_ARTICLES);

        let unique: HashSet<&str> = merged.iter().map(|a| a.id.as_str()).collect();
        prop_assert_eq!(unique.len(), merged.len());

        let known: HashSet<&str> = existing.iter().map(|a| a.id.as_str()).collect();
        let new_count = incoming.iter().filter(|a| !known.contains(a.id.as_str())).count();
        prop_assert_eq!(merged.len(), (new_count + existing.len()).min(MAX_CACHED_ARTICLES));

        // New articles come first, in fetch order
        let leading: Vec<&str> = merged
            .iter()
            .take_while(|a| !known.contains(a.id.as_str()))
            .map(|a| a.id.as_str())
            .collect();
        let expected: Vec<&str> = incoming
            .iter()
            .filter(|a| !known.contains(a.id.as_str()))
            .map(|a| a.id.as_str())
            .take(MAX_CACHED_ARTICLES)
            .collect();
        prop_assert_eq!(leading, expected);
    }

    #[test]
    fn prop_empty_search_then_recent_sort_is_descending(cached in arb_cached(50)) {
        let view = apply_pipeline(&cached, "", &FilterOptions::default());
        prop_assert_eq!(view.len(), cached.len());
        for pair in view.windows(2) {
            prop_assert!(pair[0].timestamp_millis() >= pair[1].timestamp_millis());
        }
    }
}

#[test]
fn test_merge_scenario_then_sort() {
    let existing = vec![article("a", 100), article("b", 200)];
    let incoming = vec![article("b", 200), article("c", 300)];

    let merged = merge_articles(incoming, existing, MAX_CACHED_ARTICLES);
    assert_eq!(ids(&merged), vec!["c", "a", "b"]);

    let sorted = sort_articles(&merged, SortMode::Recent);
    assert_eq!(ids(&sorted), vec!["c", "b", "a"]);
}

#[test]
fn test_topic_filter_matches_substring_case_insensitively() {
    let mut gpt = article("gpt", 1);
    gpt.tags = vec!["GPT-4".into()];
    let mut llm = article("llm", 2);
    llm.tags = vec!["LLM".into()];

    let topics = BTreeSet::from(["gpt".to_string()]);
    assert_eq!(ids(&filter_by_topic(&[gpt, llm], &topics)), vec!["gpt"]);
}

#[test]
fn test_wikipedia_type_requires_wikipedia_source() {
    let wiki_link = SourceLink {
        title: "Entry".into(),
        url: "https://en.wikipedia.org/wiki/Transformer".into(),
        source: Source::from("Wikipedia"),
    };
    let mut sourced = article("sourced", 1);
    sourced.title = "Transformers on Wikipedia".into();
    sourced.source_links.push(wiki_link);
    let mut mentioned = article("mentioned", 2);
    mentioned.title = "Why Wikipedia matters for training data".into();

    let filters = FilterOptions {
        content_types: BTreeSet::from([ContentType::Wikipedia]),
        ..FilterOptions::default()
    };
    let view = apply_pipeline(&[sourced, mentioned], "wikipedia", &filters);
    assert_eq!(ids(&view), vec!["sourced"]);
}

#[test]
fn test_search_reaches_paragraph_text() {
    let mut deep = article("deep", 1);
    deep.content.push(newsdesk::model::ContentSection {
        heading: "Details".into(),
        paragraphs: vec!["The model was trained on synthetic proofs.".into()],
    });
    let shallow = article("shallow", 2);

    assert_eq!(ids(&search(&[deep, shallow], "SYNTHETIC PROOFS")), vec!["deep"]);
}
