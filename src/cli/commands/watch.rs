use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::clients::proxy::ProxyClient;
use crate::config::Config;
use crate::render::{ConsoleRender, print_results};
use crate::services::orchestrator::{SearchOrchestrator, SearchSettings};

use super::search::build_params;

/// Interactive watch loop: run the search, then keep refreshing on an
/// interval. New posts land in a pending set and are only merged when the
/// user asks, so the visible list never reshuffles underneath them.
pub async fn cmd_watch(
    config: &Config,
    query: &[String],
    sort: Option<&str>,
    min_likes: Option<u64>,
    hours: Option<f64>,
    expand: bool,
    interval: Option<u64>,
) -> anyhow::Result<()> {
    let params = build_params(config, query, sort, min_likes, hours, expand);
    println!("Watching: {}", params.raw_terms.join(", "));

    let source = Arc::new(ProxyClient::new(&config.proxy, &config.cache)?);
    let orchestrator = Arc::new(SearchOrchestrator::new(
        source,
        Arc::new(ConsoleRender),
        SearchSettings::from_config(config),
    ));

    orchestrator.perform_search(params).await?;
    print_results(&orchestrator.current_view().await);

    let interval_seconds = interval.unwrap_or(config.refresh.interval_seconds).max(1);
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    ticker.tick().await;

    println!();
    println!("Commands: m = merge new, d = dismiss new, more = load more, show = print, q = quit");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let added = orchestrator.refresh_tick().await;
                if added > 0 {
                    println!("{added} new post(s) pending (m to merge, d to dismiss)");
                }
            }

            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match line.trim() {
                    "m" | "merge" => {
                        let merged = orchestrator.merge_pending().await;
                        println!("Merged {merged} post(s)");
                        print_results(&orchestrator.current_view().await);
                    }
                    "d" | "dismiss" => {
                        orchestrator.dismiss_pending().await;
                        println!("Dismissed pending posts");
                    }
                    "more" => {
                        let added = orchestrator.load_more().await;
                        println!("Loaded {added} more post(s)");
                        print_results(&orchestrator.current_view().await);
                    }
                    "show" | "s" => {
                        orchestrator.show_more().await;
                        print_results(&orchestrator.current_view().await);
                    }
                    "q" | "quit" | "exit" => break,
                    "" => {}
                    other => println!("Unknown command: {other}"),
                }
            }

            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    info!("Watch loop stopped");
    Ok(())
}
