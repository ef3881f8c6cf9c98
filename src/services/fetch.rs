use tracing::debug;

use crate::clients::proxy::PostSource;
use crate::error::FetchError;
use crate::models::post::Post;
use crate::models::session::SortMode;

/// Everything one term's fetch produced: tagged posts plus the resumption
/// cursor (`None` once the upstream is exhausted).
#[derive(Debug)]
pub struct TermFetch {
    pub term: String,
    pub posts: Vec<Post>,
    pub cursor: Option<String>,
}

/// Follows cursors for one term until exhaustion or the page budget runs
/// out. Every post is tagged with the originating term before accumulation.
pub async fn fetch_all_for_term(
    source: &dyn PostSource,
    term: &str,
    sort: SortMode,
    max_pages: u32,
    resume_cursor: Option<String>,
) -> Result<TermFetch, FetchError> {
    let mut posts = Vec::new();
    let mut cursor = resume_cursor;

    for page_index in 0..max_pages {
        let page = source.fetch_page(term, cursor.as_deref(), sort).await?;
        debug!(
            "Fetched page {} for '{}': {} posts",
            page_index + 1,
            term,
            page.posts.len()
        );

        for mut post in page.posts {
            post.matched_terms.add(term);
            posts.push(post);
        }

        cursor = page.cursor.filter(|c| !c.is_empty());
        if cursor.is_none() {
            break;
        }
    }

    Ok(TermFetch {
        term: term.to_string(),
        posts,
        cursor,
    })
}

/// Single-page variant used by auto-refresh to sample the newest state
/// cheaply. Never advances the stored cursor.
pub async fn fetch_latest_for_term(
    source: &dyn PostSource,
    term: &str,
    sort: SortMode,
) -> Result<TermFetch, FetchError> {
    let page = source.fetch_page(term, None, sort).await?;

    let posts = page
        .posts
        .into_iter()
        .map(|mut post| {
            post.matched_terms.add(term);
            post
        })
        .collect();

    Ok(TermFetch {
        term: term.to_string(),
        posts,
        cursor: None,
    })
}
