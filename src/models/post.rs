use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordered set of search terms that produced a post. Insertion order is
/// preserved and uniqueness is case-insensitive, so a post discovered under
/// "React" and later "react" carries the term once, spelled the first way it
/// was seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchedTerms {
    terms: Vec<String>,
}

impl MatchedTerms {
    pub fn add(&mut self, term: &str) {
        if !self.contains(term) {
            self.terms.push(term.to_string());
        }
    }

    #[must_use]
    pub fn contains(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.terms.iter().any(|t| t.to_lowercase() == needle)
    }

    pub fn merge_from(&mut self, other: &Self) {
        for term in &other.terms {
            self.add(term);
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.terms
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub handle: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    #[serde(default)]
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<EmbedImage>,
}

/// A post as returned by the upstream index. Immutable as received, except
/// for the `matched_terms` annotation attached by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Globally unique identifier.
    pub uri: String,

    pub author: Author,

    #[serde(default)]
    pub record: PostRecord,

    #[serde(default)]
    pub like_count: u64,

    #[serde(default)]
    pub repost_count: u64,

    #[serde(default)]
    pub reply_count: u64,

    #[serde(default)]
    pub quote_count: u64,

    /// Fallback time source when the record carries no creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed: Option<Embed>,

    #[serde(skip)]
    pub matched_terms: MatchedTerms,
}

impl Post {
    /// Derives the timestamp used for filtering and `latest` sorting:
    /// creation time when parseable, indexing time as fallback, epoch 0 when
    /// neither parses (sorts oldest, dropped by any reasonable window).
    #[must_use]
    pub fn derived_timestamp(&self) -> DateTime<Utc> {
        self.record
            .created_at
            .as_deref()
            .and_then(parse_rfc3339)
            .or_else(|| self.indexed_at.as_deref().and_then(parse_rfc3339))
            .unwrap_or(DateTime::UNIX_EPOCH)
    }
}

fn parse_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_post(uri: &str) -> Post {
        Post {
            uri: uri.to_string(),
            author: Author {
                handle: "alice.example".to_string(),
                display_name: None,
                avatar: None,
            },
            record: PostRecord::default(),
            like_count: 0,
            repost_count: 0,
            reply_count: 0,
            quote_count: 0,
            indexed_at: None,
            embed: None,
            matched_terms: MatchedTerms::default(),
        }
    }

    #[test]
    fn test_matched_terms_case_insensitive_order_preserving() {
        let mut terms = MatchedTerms::default();
        terms.add("React");
        terms.add("javascript");
        terms.add("REACT");

        assert_eq!(terms.as_slice(), &["React", "javascript"]);
        assert!(terms.contains("react"));
    }

    #[test]
    fn test_derived_timestamp_prefers_created_at() {
        let mut post = bare_post("at://1");
        post.record.created_at = Some("2026-08-20T10:00:00Z".to_string());
        post.indexed_at = Some("2026-08-21T10:00:00Z".to_string());

        assert_eq!(
            post.derived_timestamp().to_rfc3339(),
            "2026-08-20T10:00:00+00:00"
        );
    }

    #[test]
    fn test_derived_timestamp_falls_back_to_indexed_at() {
        let mut post = bare_post("at://1");
        post.indexed_at = Some("2026-08-21T10:00:00Z".to_string());

        assert_eq!(
            post.derived_timestamp().to_rfc3339(),
            "2026-08-21T10:00:00+00:00"
        );
    }

    #[test]
    fn test_unparseable_timestamp_resolves_to_epoch() {
        let mut post = bare_post("at://1");
        post.record.created_at = Some("yesterday-ish".to_string());

        assert_eq!(post.derived_timestamp(), DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_counters_default_when_absent() {
        let post: Post = serde_json::from_str(
            r#"{"uri": "at://1", "author": {"handle": "a.example"}}"#,
        )
        .unwrap();

        assert_eq!(post.like_count, 0);
        assert_eq!(post.repost_count, 0);
        assert!(post.matched_terms.is_empty());
    }
}
