use chrono::{DateTime, Utc};

use crate::models::post::Post;

/// A post ready for presentation, keyed by its URI.
#[derive(Debug, Clone)]
pub struct PostView {
    pub post: Post,

    /// Set while the post is freshly surfaced by auto-refresh.
    pub highlighted: bool,
}

/// Read-only snapshot handed across the render boundary. Visible posts are
/// already filtered, sorted, and truncated to the render limit; pending posts
/// are re-filtered against the current thresholds. How a sink diffs or
/// patches its output is its own concern; only the order contract matters.
#[derive(Debug, Clone, Default)]
pub struct SearchView {
    pub posts: Vec<PostView>,

    /// How many posts survive the filters in total, before the render limit.
    pub total_available: usize,

    pub pending: Vec<PostView>,

    pub completed_terms: usize,

    pub total_terms: usize,

    pub loading: bool,

    /// Short user-facing status line; never a raw error object.
    pub status: Option<String>,

    pub last_refreshed: Option<DateTime<Utc>>,

    /// Shareable query-string encoding of the active search.
    pub share_query: String,
}

impl SearchView {
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.posts.len() < self.total_available
    }
}

/// Presentation boundary. The orchestrator pushes view snapshots; sinks
/// must treat post URIs as stable keys for incremental update.
pub trait RenderSink: Send + Sync {
    fn render(&self, view: &SearchView);
}

/// Sink that renders nothing; used where the caller prints the final view
/// itself.
#[derive(Debug, Default)]
pub struct NullRender;

impl RenderSink for NullRender {
    fn render(&self, _view: &SearchView) {}
}

/// Console progress sink for the CLI: progress while loading, a pending
/// notice when auto-refresh surfaces new posts.
#[derive(Debug, Default)]
pub struct ConsoleRender;

impl RenderSink for ConsoleRender {
    fn render(&self, view: &SearchView) {
        if view.loading {
            println!(
                "  ... {}/{} terms, {} posts so far",
                view.completed_terms, view.total_terms, view.total_available
            );
        } else if !view.pending.is_empty() {
            println!(
                "  {} new post(s) pending ('m' to merge, 'd' to dismiss)",
                view.pending.len()
            );
        }
    }
}

/// Prints the visible result list for the CLI commands.
pub fn print_results(view: &SearchView) {
    if let Some(status) = &view.status {
        println!("⚠ {status}");
    }

    if view.posts.is_empty() {
        println!("No posts matched.");
        return;
    }

    println!();
    println!(
        "Results ({} shown of {}):",
        view.posts.len(),
        view.total_available
    );
    println!("{:-<70}", "");

    for entry in &view.posts {
        let post = &entry.post;
        let marker = if entry.highlighted { "★" } else { "•" };
        let name = post
            .author
            .display_name
            .as_deref()
            .unwrap_or(&post.author.handle);

        println!("{} {} (@{})", marker, name, post.author.handle);

        let text: String = post.record.text.chars().take(120).collect();
        println!("  {text}");
        println!(
            "  ♥ {} | ↻ {} | 💬 {} | terms: {}",
            post.like_count,
            post.repost_count,
            post.reply_count,
            post.matched_terms.as_slice().join(", ")
        );
        println!("  {}", post.uri);
        println!();
    }

    if view.has_more() {
        println!(
            "... and {} more (show more to extend)",
            view.total_available - view.posts.len()
        );
    }
}
