use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clients::proxy::PostSource;
use crate::config::Config;
use crate::constants::intervals;
use crate::error::{FetchError, SearchError};
use crate::models::session::{SearchParams, SearchSession, SortMode};
use crate::render::{PostView, RenderSink, SearchView};
use crate::services::fetch::{fetch_all_for_term, fetch_latest_for_term};
use crate::services::pipeline::IngestStore;
use crate::services::terms::expand_search_terms;
use crate::services::timer::CancellableTimer;

/// Knobs the orchestrator needs from config, collapsed into one plain
/// struct so tests can construct it without a full `Config`.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub max_pages: u32,
    pub load_more_pages: u32,
    pub initial_render_limit: usize,
    pub render_limit_step: usize,
    pub highlight: Duration,
    pub render_coalesce: Duration,
}

impl SearchSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_pages: config.search.max_pages,
            load_more_pages: config.search.load_more_pages,
            initial_render_limit: config.search.initial_render_limit,
            render_limit_step: config.search.render_limit_step,
            highlight: Duration::from_secs(config.refresh.highlight_seconds),
            render_coalesce: intervals::RENDER_COALESCE,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// How one search run ended, for the still-current generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Every term settled successfully.
    Complete { total: usize },
    /// Some terms failed; successful results are kept.
    Partial { failed: usize, total: usize },
    /// Every term failed; the message comes from the first failure.
    Failed { total: usize, message: String },
    /// A newer search superseded this one; nothing was committed.
    Superseded,
    /// A search was already loading; this request took the single pending
    /// slot and will run when the in-flight one settles.
    Queued,
}

struct OrchestratorState {
    session: Option<SearchSession>,
    store: IngestStore,
    pending: IngestStore,
    highlight_until: HashMap<String, DateTime<Utc>>,
    render_limit: usize,
    completed_terms: usize,
    total_terms: usize,
    failures: Vec<FetchError>,
    loading: bool,
    refreshing: bool,
    queued: Option<SearchParams>,
    status: Option<String>,
    last_refreshed: Option<DateTime<Utc>>,
    share_query: String,
}

/// Owns the lifecycle of search requests: generation counting, progressive
/// per-term ingestion, partial-failure aggregation, auto-refresh staging,
/// and render scheduling. All shared state sits behind one async mutex;
/// every await-resume point re-checks the generation token before
/// committing, so superseded work is discarded instead of corrupting the
/// visible state.
pub struct SearchOrchestrator {
    source: Arc<dyn PostSource>,
    sink: Arc<dyn RenderSink>,
    settings: SearchSettings,
    generation: AtomicU64,
    state: Mutex<OrchestratorState>,
    render_timer: CancellableTimer,
    highlight_timer: CancellableTimer,
}

impl SearchOrchestrator {
    #[must_use]
    pub fn new(
        source: Arc<dyn PostSource>,
        sink: Arc<dyn RenderSink>,
        settings: SearchSettings,
    ) -> Self {
        let initial_render_limit = settings.initial_render_limit;
        Self {
            source,
            sink,
            settings,
            generation: AtomicU64::new(0),
            state: Mutex::new(OrchestratorState {
                session: None,
                store: IngestStore::new(),
                pending: IngestStore::new(),
                highlight_until: HashMap::new(),
                render_limit: initial_render_limit,
                completed_terms: 0,
                total_terms: 0,
                failures: Vec::new(),
                loading: false,
                refreshing: false,
                queued: None,
                status: None,
                last_refreshed: None,
                share_query: String::new(),
            }),
            render_timer: CancellableTimer::new(),
            highlight_timer: CancellableTimer::new(),
        }
    }

    #[must_use]
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Runs a search to completion, including any search queued behind it.
    /// Blank input is a validation error and changes nothing.
    pub async fn perform_search(
        self: &Arc<Self>,
        params: SearchParams,
    ) -> Result<SearchOutcome, SearchError> {
        let mut params = params;
        let mut terms = expand_search_terms(&params.raw_terms, params.expand);
        if terms.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let mut outcome;
        loop {
            outcome = self.run_search(&params, &terms).await;

            // A superseded run owns nothing anymore: the loading flag and
            // the queued slot belong to the newer search's loop.
            if outcome == SearchOutcome::Superseded {
                break;
            }

            let next = self.state.lock().await.queued.take();
            match next {
                Some(queued) => {
                    terms = expand_search_terms(&queued.raw_terms, queued.expand);
                    if terms.is_empty() {
                        return Err(SearchError::EmptyQuery);
                    }
                    params = queued;
                }
                None => break,
            }
        }

        Ok(outcome)
    }

    /// Defers a search behind the in-flight one instead of superseding it.
    /// Only the most recent request survives; this is a single slot, not a queue.
    pub async fn queue_search(
        self: &Arc<Self>,
        params: SearchParams,
    ) -> Result<SearchOutcome, SearchError> {
        {
            let mut state = self.state.lock().await;
            if state.loading {
                state.queued = Some(params);
                return Ok(SearchOutcome::Queued);
            }
        }
        self.perform_search(params).await
    }

    async fn run_search(self: &Arc<Self>, params: &SearchParams, terms: &[String]) -> SearchOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let total = terms.len();

        info!(
            "Searching {} term(s) (generation {}): {:?}",
            total, generation, terms
        );

        {
            let mut state = self.state.lock().await;
            state.store.clear();
            state.pending.clear();
            state.highlight_until.clear();
            state.completed_terms = 0;
            state.total_terms = total;
            state.failures.clear();
            state.status = None;
            state.loading = true;
            state.render_limit = self.settings.initial_render_limit;
            state.share_query = params.to_query_string();
            state.session = Some(SearchSession::new(params.clone(), terms.to_vec(), generation));
        }

        let mut tasks = FuturesUnordered::new();
        for term in terms {
            let source = Arc::clone(&self.source);
            let term = term.clone();
            let sort = params.sort;
            let max_pages = self.settings.max_pages;
            tasks.push(async move {
                let result = fetch_all_for_term(&*source, &term, sort, max_pages, None).await;
                (term, result)
            });
        }

        // All-settled join: siblings keep running no matter how one term
        // ends, and each settlement is committed only if still current.
        while let Some((term, result)) = tasks.next().await {
            if self.current_generation() != generation {
                debug!("Discarding stale result for '{}'", term);
                continue;
            }

            {
                let mut state = self.state.lock().await;
                state.completed_terms += 1;

                match result {
                    Ok(fetch) => {
                        let added = state.store.fold(fetch.posts);
                        debug!("Term '{}' settled: {} new post(s)", term, added);
                        if let Some(session) = state.session.as_mut() {
                            session.cursors.insert(term, fetch.cursor);
                        }
                    }
                    Err(error) => {
                        warn!("Term '{}' failed: {}", term, error);
                        state.failures.push(error);
                    }
                }
            }

            self.schedule_render(generation).await;
        }

        if self.current_generation() != generation {
            return SearchOutcome::Superseded;
        }

        let outcome = {
            let mut state = self.state.lock().await;
            let failed = state.failures.len();

            let outcome = if failed == 0 {
                SearchOutcome::Complete { total }
            } else if failed == total {
                let message = state
                    .failures
                    .first()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                SearchOutcome::Failed { total, message }
            } else {
                SearchOutcome::Partial { failed, total }
            };

            state.status = match &outcome {
                SearchOutcome::Complete { .. } => None,
                SearchOutcome::Partial { failed, total } => {
                    Some(format!("{failed}/{total} terms failed"))
                }
                SearchOutcome::Failed { message, .. } => Some(format!("Search failed: {message}")),
                SearchOutcome::Superseded | SearchOutcome::Queued => None,
            };
            state.loading = false;
            state.last_refreshed = Some(Utc::now());

            outcome
        };

        self.render_timer.cancel().await;
        self.render_now().await;

        outcome
    }

    /// Resumes pagination from each term's stored cursor. Exhausted terms
    /// (null cursor) contribute nothing and are not an error.
    pub async fn load_more(self: &Arc<Self>) -> usize {
        let generation = self.current_generation();

        let (resumable, sort) = {
            let state = self.state.lock().await;
            let Some(session) = &state.session else {
                return 0;
            };
            if state.loading {
                return 0;
            }
            let resumable: Vec<(String, String)> = session
                .cursors
                .iter()
                .filter_map(|(term, cursor)| {
                    cursor.as_ref().map(|c| (term.clone(), c.clone()))
                })
                .collect();
            (resumable, session.params.sort)
        };

        if resumable.is_empty() {
            return 0;
        }

        let pages = self.settings.load_more_pages;
        let fetches = resumable.into_iter().map(|(term, cursor)| {
            let source = Arc::clone(&self.source);
            async move {
                let result =
                    fetch_all_for_term(&*source, &term, sort, pages, Some(cursor)).await;
                (term, result)
            }
        });
        let results = join_all(fetches).await;

        if self.current_generation() != generation {
            return 0;
        }

        let added = {
            let mut state = self.state.lock().await;
            let mut added = 0;
            for (term, result) in results {
                match result {
                    Ok(fetch) => {
                        added += state.store.fold(fetch.posts);
                        if let Some(session) = state.session.as_mut() {
                            session.cursors.insert(term, fetch.cursor);
                        }
                    }
                    Err(error) => warn!("Load more for '{}' failed: {}", term, error),
                }
            }
            state.render_limit += self.settings.render_limit_step;
            added
        };

        self.render_now().await;
        added
    }

    /// One auto-refresh cycle: sample the latest page per term and stash
    /// genuinely new posts into the pending set. Never touches the visible
    /// list; merging is an explicit user action.
    pub async fn refresh_tick(self: &Arc<Self>) -> usize {
        let generation = self.current_generation();

        let (terms, sort) = {
            let mut state = self.state.lock().await;
            if state.loading || state.refreshing {
                return 0;
            }
            let Some(session) = &state.session else {
                return 0;
            };
            let terms = session.terms.clone();
            let sort = session.params.sort;
            state.refreshing = true;
            (terms, sort)
        };

        let fetches = terms.into_iter().map(|term| {
            let source = Arc::clone(&self.source);
            async move { fetch_latest_for_term(&*source, &term, sort).await }
        });
        let results = join_all(fetches).await;

        let added = {
            let mut state = self.state.lock().await;
            state.refreshing = false;

            if self.current_generation() != generation {
                return 0;
            }

            let mut added = 0;
            let highlight_until = Utc::now()
                + ChronoDuration::milliseconds(
                    i64::try_from(self.settings.highlight.as_millis()).unwrap_or(8_000),
                );

            for result in results {
                match result {
                    Ok(fetch) => {
                        for post in fetch.posts {
                            if state.store.contains(&post.uri) {
                                continue;
                            }
                            if !state.pending.contains(&post.uri) {
                                state.highlight_until.insert(post.uri.clone(), highlight_until);
                            }
                            added += state.pending.fold(vec![post]);
                        }
                    }
                    Err(error) => warn!("Refresh fetch failed: {}", error),
                }
            }
            added
        };

        if added > 0 {
            info!("Auto-refresh surfaced {} new post(s)", added);
            self.render_now().await;
            self.schedule_highlight_expiry(generation).await;
        }

        added
    }

    /// Folds pending posts into the main set and clears the staging area.
    pub async fn merge_pending(self: &Arc<Self>) -> usize {
        let merged = {
            let mut state = self.state.lock().await;
            let pending = state.pending.take_posts();
            state.store.fold(pending)
        };

        if merged > 0 {
            self.schedule_highlight_expiry(self.current_generation()).await;
        }
        self.render_now().await;
        merged
    }

    /// Discards the pending set without touching the visible list.
    pub async fn dismiss_pending(self: &Arc<Self>) {
        {
            let mut state = self.state.lock().await;
            state.pending.clear();
            state.highlight_until.clear();
        }
        self.render_now().await;
    }

    /// Extends the visible-row cap by one step, clamped to what the filters
    /// currently let through.
    pub async fn show_more(self: &Arc<Self>) {
        {
            let mut state = self.state.lock().await;
            let available = match &state.session {
                Some(session) => state.store.derive(&session.params, Utc::now()).len(),
                None => 0,
            };
            state.render_limit = (state.render_limit + self.settings.render_limit_step)
                .min(available.max(self.settings.initial_render_limit));
        }
        self.render_now().await;
    }

    /// Applies live filter-control changes: no refetch, just a full derive
    /// over already-ingested data.
    pub async fn set_filters(
        self: &Arc<Self>,
        sort: SortMode,
        min_likes: u64,
        hours: f64,
    ) {
        {
            let mut state = self.state.lock().await;
            if let Some(session) = state.session.as_mut() {
                session.params.sort = sort;
                session.params.min_likes = min_likes;
                session.params.hours = hours;
            }
            let query = state.session.as_ref().map(|s| s.params.to_query_string());
            if let Some(query) = query {
                state.share_query = query;
            }
        }
        self.render_now().await;
    }

    /// Snapshot of the current view, independent of the sink.
    pub async fn current_view(&self) -> SearchView {
        let mut state = self.state.lock().await;
        Self::build_view(&mut state, Utc::now())
    }

    async fn schedule_render(self: &Arc<Self>, generation: u64) {
        let this = Arc::clone(self);
        self.render_timer
            .schedule(self.settings.render_coalesce, async move {
                if this.current_generation() == generation {
                    this.render_now().await;
                }
            })
            .await;
    }

    /// Re-renders shortly after the highlight window closes so sinks drop
    /// the markers even when nothing else changes.
    async fn schedule_highlight_expiry(self: &Arc<Self>, generation: u64) {
        let this = Arc::clone(self);
        self.highlight_timer
            .schedule(
                self.settings.highlight + Duration::from_millis(100),
                async move {
                    if this.current_generation() == generation {
                        this.render_now().await;
                    }
                },
            )
            .await;
    }

    async fn render_now(&self) {
        let view = {
            let mut state = self.state.lock().await;
            Self::build_view(&mut state, Utc::now())
        };
        self.sink.render(&view);
    }

    fn build_view(state: &mut OrchestratorState, now: DateTime<Utc>) -> SearchView {
        state.highlight_until.retain(|_, until| *until > now);

        let Some(session) = &state.session else {
            return SearchView::default();
        };

        let derived = state.store.derive(&session.params, now);
        let total_available = derived.len();

        let posts = derived
            .into_iter()
            .take(state.render_limit)
            .map(|post| PostView {
                highlighted: state.highlight_until.contains_key(&post.uri),
                post,
            })
            .collect();

        let pending = state
            .pending
            .derive(&session.params, now)
            .into_iter()
            .map(|post| PostView {
                highlighted: state.highlight_until.contains_key(&post.uri),
                post,
            })
            .collect();

        SearchView {
            posts,
            total_available,
            pending,
            completed_terms: state.completed_terms,
            total_terms: state.total_terms,
            loading: state.loading,
            status: state.status.clone(),
            last_refreshed: state.last_refreshed,
            share_query: state.share_query.clone(),
        }
    }
}
