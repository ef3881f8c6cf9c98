use std::sync::Arc;

use crate::clients::proxy::ProxyClient;
use crate::config::Config;
use crate::models::session::{SearchParams, SortMode};
use crate::render::{NullRender, print_results};
use crate::services::orchestrator::{SearchOrchestrator, SearchOutcome, SearchSettings};
use crate::services::terms::parse_term_input;

/// Merges CLI flags over the config defaults into one parameter set.
#[must_use]
pub fn build_params(
    config: &Config,
    query: &[String],
    sort: Option<&str>,
    min_likes: Option<u64>,
    hours: Option<f64>,
    expand: bool,
) -> SearchParams {
    let raw_terms = parse_term_input(&query.join(" "));

    SearchParams {
        raw_terms,
        expand: expand || config.search.expand_terms,
        sort: SortMode::parse(sort.unwrap_or(&config.search.default_sort)),
        min_likes: min_likes.unwrap_or(config.search.default_min_likes),
        hours: hours.unwrap_or(config.search.default_hours_window),
    }
}

pub async fn cmd_search(
    config: &Config,
    query: &[String],
    sort: Option<&str>,
    min_likes: Option<u64>,
    hours: Option<f64>,
    expand: bool,
    more: u32,
) -> anyhow::Result<()> {
    let params = build_params(config, query, sort, min_likes, hours, expand);
    println!("Searching for: {}", params.raw_terms.join(", "));

    let source = Arc::new(ProxyClient::new(&config.proxy, &config.cache)?);
    let orchestrator = Arc::new(SearchOrchestrator::new(
        source,
        Arc::new(NullRender),
        SearchSettings::from_config(config),
    ));

    let outcome = orchestrator.perform_search(params).await?;

    if let SearchOutcome::Failed { message, .. } = &outcome {
        anyhow::bail!("Search failed: {message}");
    }

    for _ in 0..more {
        let added = orchestrator.load_more().await;
        if added == 0 {
            break;
        }
    }

    let view = orchestrator.current_view().await;
    print_results(&view);

    if !view.share_query.is_empty() {
        println!("Share: ?{}", view.share_query);
    }

    Ok(())
}
