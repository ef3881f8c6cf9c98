use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use crate::constants::limits;
use crate::models::post::Post;
use crate::models::session::{SearchParams, SortMode};

/// Groups posts by URI, keeping the first-seen post as the canonical record
/// and merging every duplicate's matched terms into it. Output order is the
/// first-seen order of unique URIs.
#[must_use]
pub fn deduplicate_posts(posts: Vec<Post>) -> Vec<Post> {
    let mut order = Vec::new();
    let mut by_uri: HashMap<String, Post> = HashMap::new();

    for post in posts {
        if let Some(canonical) = by_uri.get_mut(&post.uri) {
            canonical.matched_terms.merge_from(&post.matched_terms);
        } else {
            order.push(post.uri.clone());
            by_uri.insert(post.uri.clone(), post);
        }
    }

    order.into_iter().filter_map(|uri| by_uri.remove(&uri)).collect()
}

/// Keeps posts whose derived timestamp falls within `[now - hours, now]`.
/// Non-positive or non-finite hours fall back to 24.
#[must_use]
pub fn filter_by_date(posts: Vec<Post>, hours: f64) -> Vec<Post> {
    filter_by_date_at(posts, hours, Utc::now())
}

#[must_use]
pub fn filter_by_date_at(posts: Vec<Post>, hours: f64, now: DateTime<Utc>) -> Vec<Post> {
    let hours = if hours.is_finite() && hours > 0.0 {
        hours
    } else {
        limits::DEFAULT_HOURS_WINDOW
    };

    #[allow(clippy::cast_possible_truncation)]
    let cutoff = now - Duration::milliseconds((hours * 3_600_000.0) as i64);

    posts
        .into_iter()
        .filter(|post| {
            let ts = post.derived_timestamp();
            ts >= cutoff && ts <= now
        })
        .collect()
}

/// Keeps posts with a like count at or above the threshold; absent counts
/// already deserialize to 0.
#[must_use]
pub fn filter_by_likes(posts: Vec<Post>, min_likes: u64) -> Vec<Post> {
    posts
        .into_iter()
        .filter(|post| post.like_count >= min_likes)
        .collect()
}

/// Non-mutating stable sort: `latest` by derived timestamp descending,
/// anything else by like count descending. Ties keep their incoming order.
#[must_use]
pub fn sort_posts(posts: &[Post], sort: SortMode) -> Vec<Post> {
    let mut sorted = posts.to_vec();
    match sort {
        SortMode::Latest => {
            sorted.sort_by_key(|post| std::cmp::Reverse(post.derived_timestamp()));
        }
        SortMode::Top => {
            sorted.sort_by_key(|post| std::cmp::Reverse(post.like_count));
        }
    }
    sorted
}

/// The canonical pipeline composition: dedup, date filter, likes filter,
/// sort. Idempotent, so live filter changes can re-run it over already
/// processed data.
#[must_use]
pub fn process_posts(posts: Vec<Post>, params: &SearchParams, now: DateTime<Utc>) -> Vec<Post> {
    let posts = deduplicate_posts(posts);
    let posts = filter_by_date_at(posts, params.hours, now);
    let posts = filter_by_likes(posts, params.min_likes);
    sort_posts(&posts, params.sort)
}

/// Persistent identifier-keyed store for progressive multi-term ingestion.
///
/// Each fetched batch is folded in as it arrives (new URI inserts, known URI
/// merges matched terms), and the visible list is derived by running
/// filter and sort over the full store only when a render is due. This keeps
/// per-post merge cost O(1) amortized instead of re-deduplicating the whole
/// accumulated set on every term completion.
#[derive(Debug, Default)]
pub struct IngestStore {
    order: Vec<String>,
    posts: HashMap<String, Post>,
}

impl IngestStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a batch into the store, returning how many posts were new.
    pub fn fold(&mut self, incoming: Vec<Post>) -> usize {
        let mut added = 0;
        for post in incoming {
            if let Some(existing) = self.posts.get_mut(&post.uri) {
                existing.matched_terms.merge_from(&post.matched_terms);
            } else {
                self.order.push(post.uri.clone());
                self.posts.insert(post.uri.clone(), post);
                added += 1;
            }
        }
        added
    }

    #[must_use]
    pub fn contains(&self, uri: &str) -> bool {
        self.posts.contains_key(uri)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.posts.clear();
    }

    /// Drains all posts in first-seen order.
    pub fn take_posts(&mut self) -> Vec<Post> {
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .filter_map(|uri| self.posts.remove(&uri))
            .collect()
    }

    #[must_use]
    pub fn posts_in_order(&self) -> Vec<Post> {
        self.order
            .iter()
            .filter_map(|uri| self.posts.get(uri).cloned())
            .collect()
    }

    /// Derives the presentable list: the store is already deduplicated, so
    /// this is filter-by-date, filter-by-likes, sort.
    #[must_use]
    pub fn derive(&self, params: &SearchParams, now: DateTime<Utc>) -> Vec<Post> {
        let posts = filter_by_date_at(self.posts_in_order(), params.hours, now);
        let posts = filter_by_likes(posts, params.min_likes);
        sort_posts(&posts, params.sort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::post::{Author, MatchedTerms, PostRecord};

    fn post(uri: &str, likes: u64, term: &str, created_at: DateTime<Utc>) -> Post {
        let mut matched_terms = MatchedTerms::default();
        matched_terms.add(term);
        Post {
            uri: uri.to_string(),
            author: Author {
                handle: "alice.example".to_string(),
                display_name: None,
                avatar: None,
            },
            record: PostRecord {
                text: format!("about {term}"),
                created_at: Some(created_at.to_rfc3339()),
            },
            like_count: likes,
            repost_count: 0,
            reply_count: 0,
            quote_count: 0,
            indexed_at: None,
            embed: None,
            matched_terms,
        }
    }

    fn now() -> DateTime<Utc> {
        "2026-08-23T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_dedup_unique_uris_first_seen_order() {
        let t = now();
        let posts = vec![
            post("at://1", 50, "react", t),
            post("at://2", 5, "react", t),
            post("at://1", 50, "javascript", t),
        ];

        let out = deduplicate_posts(posts);
        let uris: Vec<_> = out.iter().map(|p| p.uri.as_str()).collect();
        assert_eq!(uris, vec!["at://1", "at://2"]);
        assert_eq!(out[0].matched_terms.as_slice(), &["react", "javascript"]);
    }

    #[test]
    fn test_dedup_merges_terms_case_insensitive() {
        let t = now();
        let posts = vec![
            post("at://1", 1, "Rust", t),
            post("at://1", 1, "rust", t),
            post("at://1", 1, "tokio", t),
        ];

        let out = deduplicate_posts(posts);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].matched_terms.as_slice(), &["Rust", "tokio"]);
    }

    #[test]
    fn test_filter_by_date_window() {
        let t = now();
        let posts = vec![
            post("at://fresh", 1, "a", t - Duration::hours(1)),
            post("at://stale", 1, "a", t - Duration::hours(30)),
            post("at://future", 1, "a", t + Duration::hours(1)),
        ];

        let out = filter_by_date_at(posts, 24.0, t);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].uri, "at://fresh");
    }

    #[test]
    fn test_filter_by_date_invalid_hours_defaults_to_24() {
        let t = now();
        let posts = vec![
            post("at://fresh", 1, "a", t - Duration::hours(1)),
            post("at://old", 1, "a", t - Duration::hours(25)),
        ];

        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let out = filter_by_date_at(posts.clone(), bad, t);
            assert_eq!(out.len(), 1, "hours = {bad}");
        }
    }

    #[test]
    fn test_filter_by_likes_zero_keeps_all() {
        let t = now();
        let posts = vec![post("at://1", 0, "a", t), post("at://2", 10, "a", t)];

        assert_eq!(filter_by_likes(posts.clone(), 0).len(), 2);
        let filtered = filter_by_likes(posts, 5);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].uri, "at://2");
    }

    #[test]
    fn test_sort_posts_top_and_latest() {
        let t = now();
        let posts = vec![
            post("at://a", 5, "x", t - Duration::hours(3)),
            post("at://b", 100, "x", t - Duration::hours(2)),
            post("at://c", 25, "x", t - Duration::hours(1)),
        ];

        let top = sort_posts(&posts, SortMode::Top);
        let top_uris: Vec<_> = top.iter().map(|p| p.uri.as_str()).collect();
        assert_eq!(top_uris, vec!["at://b", "at://c", "at://a"]);

        let latest = sort_posts(&posts, SortMode::Latest);
        let latest_uris: Vec<_> = latest.iter().map(|p| p.uri.as_str()).collect();
        assert_eq!(latest_uris, vec!["at://c", "at://b", "at://a"]);

        // Input order untouched.
        assert_eq!(posts[0].uri, "at://a");
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let t = now();
        let posts = vec![
            post("at://first", 10, "x", t),
            post("at://second", 10, "x", t),
        ];

        let sorted = sort_posts(&posts, SortMode::Top);
        assert_eq!(sorted[0].uri, "at://first");
        assert_eq!(sorted[1].uri, "at://second");
    }

    #[test]
    fn test_pipeline_idempotent() {
        let t = now();
        let params = SearchParams {
            min_likes: 10,
            ..Default::default()
        };
        let posts = vec![
            post("at://1", 50, "react", t - Duration::hours(1)),
            post("at://1", 50, "javascript", t - Duration::hours(1)),
            post("at://2", 5, "react", t - Duration::hours(2)),
            post("at://3", 25, "javascript", t - Duration::hours(3)),
        ];

        let once = process_posts(posts, &params, t);
        let twice = process_posts(once.clone(), &params, t);

        let once_uris: Vec<_> = once.iter().map(|p| p.uri.as_str()).collect();
        let twice_uris: Vec<_> = twice.iter().map(|p| p.uri.as_str()).collect();
        assert_eq!(once_uris, twice_uris);
        assert_eq!(once.len(), twice.len());
    }

    #[test]
    fn test_ingest_store_fold_and_derive() {
        let t = now();
        let mut store = IngestStore::new();

        assert_eq!(store.fold(vec![post("at://1", 50, "react", t)]), 1);
        assert_eq!(
            store.fold(vec![
                post("at://1", 50, "javascript", t),
                post("at://2", 5, "javascript", t),
            ]),
            1
        );

        assert_eq!(store.len(), 2);
        assert!(store.contains("at://1"));

        let merged = &store.posts_in_order()[0];
        assert_eq!(merged.matched_terms.as_slice(), &["react", "javascript"]);

        let derived = store.derive(
            &SearchParams {
                min_likes: 10,
                ..Default::default()
            },
            t,
        );
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].uri, "at://1");
    }

    #[test]
    fn test_ingest_store_take_posts_preserves_order() {
        let t = now();
        let mut store = IngestStore::new();
        store.fold(vec![post("at://b", 1, "x", t), post("at://a", 2, "x", t)]);

        let drained = store.take_posts();
        let uris: Vec<_> = drained.iter().map(|p| p.uri.as_str()).collect();
        assert_eq!(uris, vec!["at://b", "at://a"]);
        assert!(store.is_empty());
    }
}
