use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::constants::limits;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Like-count descending.
    #[default]
    Top,
    /// Derived timestamp descending.
    Latest,
}

impl SortMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Latest => "latest",
        }
    }

    /// Anything unrecognized falls back to `top`, mirroring the sort's own
    /// default branch.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "latest" => Self::Latest,
            _ => Self::Top,
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-chosen parameters of one search: what to look for and how to slice
/// the result set. Encoded into a shareable query string with defaults
/// omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    /// Normalized input terms, before expansion.
    pub raw_terms: Vec<String>,

    pub expand: bool,

    pub sort: SortMode,

    pub min_likes: u64,

    /// Recency window in hours.
    pub hours: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            raw_terms: Vec::new(),
            expand: false,
            sort: SortMode::Top,
            min_likes: 0,
            hours: limits::DEFAULT_HOURS_WINDOW,
        }
    }
}

impl SearchParams {
    /// Encodes the search as a query string. Absent/default values are
    /// omitted rather than written out, keeping shared URLs short.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut parts = Vec::new();

        if !self.raw_terms.is_empty() {
            parts.push(format!(
                "q={}",
                urlencoding::encode(&self.raw_terms.join(","))
            ));
        }
        if self.min_likes > 0 {
            parts.push(format!("likes={}", self.min_likes));
        }
        if (self.hours - limits::DEFAULT_HOURS_WINDOW).abs() > f64::EPSILON {
            parts.push(format!("hours={}", self.hours));
        }
        if self.sort != SortMode::Top {
            parts.push(format!("sort={}", self.sort));
        }
        if self.expand {
            parts.push("expand=1".to_string());
        }

        parts.join("&")
    }

    /// Decodes a query string produced by `to_query_string`. Unknown keys and
    /// unparseable values fall back to defaults.
    #[must_use]
    pub fn from_query_string(query: &str) -> Self {
        let mut params = Self::default();

        for pair in query.trim_start_matches('?').split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let value = urlencoding::decode(value)
                .map(std::borrow::Cow::into_owned)
                .unwrap_or_default();

            match key {
                "q" => {
                    params.raw_terms = value
                        .split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(ToString::to_string)
                        .collect();
                }
                "likes" => params.min_likes = value.parse().unwrap_or(0),
                "hours" => {
                    params.hours = value.parse().unwrap_or(limits::DEFAULT_HOURS_WINDOW);
                }
                "sort" => params.sort = SortMode::parse(&value),
                "expand" => params.expand = value == "1" || value == "true",
                _ => {}
            }
        }

        params
    }
}

/// Ephemeral state scoped to one user-initiated search. Superseded, not
/// destroyed, when a newer generation starts mid-flight.
#[derive(Debug, Clone)]
pub struct SearchSession {
    pub params: SearchParams,

    /// Expanded term set; determines the fetch fan-out.
    pub terms: Vec<String>,

    pub generation: u64,

    /// Per-term resumption point for load-more. `None` means exhausted.
    pub cursors: HashMap<String, Option<String>>,
}

impl SearchSession {
    #[must_use]
    pub fn new(params: SearchParams, terms: Vec<String>, generation: u64) -> Self {
        Self {
            params,
            terms,
            generation,
            cursors: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string_omits_defaults() {
        let params = SearchParams {
            raw_terms: vec!["rust".to_string()],
            ..Default::default()
        };
        assert_eq!(params.to_query_string(), "q=rust");
    }

    #[test]
    fn test_query_string_round_trip() {
        let params = SearchParams {
            raw_terms: vec!["machine learning".to_string(), "rust".to_string()],
            expand: true,
            sort: SortMode::Latest,
            min_likes: 10,
            hours: 48.0,
        };

        let encoded = params.to_query_string();
        let decoded = SearchParams::from_query_string(&encoded);
        assert_eq!(decoded, params);
    }

    #[test]
    fn test_from_query_string_tolerates_junk() {
        let params = SearchParams::from_query_string("?q=rust&likes=abc&bogus&sort=sideways");
        assert_eq!(params.raw_terms, vec!["rust"]);
        assert_eq!(params.min_likes, 0);
        assert_eq!(params.sort, SortMode::Top);
    }

    #[test]
    fn test_sort_mode_parse_defaults_to_top() {
        assert_eq!(SortMode::parse("latest"), SortMode::Latest);
        assert_eq!(SortMode::parse("anything"), SortMode::Top);
    }
}
