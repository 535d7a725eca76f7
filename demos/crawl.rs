//! # Example: crawl
//!
//! Breadth-first walk of a small in-memory link graph using [`Expand`].
//!
//! Demonstrates how to:
//! - Build the root lazily with [`Defer`] (one "fetch" per consumption).
//! - Expand each page into its outgoing links with an async, cancellable selector.
//! - Stop early by cancelling the consumption token.
//! - Watch the combinators' `tracing` output (`RUST_LOG=seqflow=debug`).
//!
//! ## Flow
//! ```text
//! Defer(root) ──► Expand(selector = links of page)
//!     queue: [root] ─► [a, b] ─► [b, c, d] ─► ...
//!     values come out level by level
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=seqflow=debug cargo run --example crawl
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use seqflow::{Defer, Expand, SequenceError, SequenceExt, SequenceRef, from_iter};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

type Graph = HashMap<&'static str, Vec<&'static str>>;

fn site() -> Graph {
    HashMap::from([
        ("/", vec!["/docs", "/blog"]),
        ("/docs", vec!["/docs/intro", "/docs/api", "/"]),
        ("/blog", vec!["/blog/2024", "/docs"]),
        ("/docs/intro", vec!["/docs/api"]),
        ("/docs/api", vec!["/docs/api/cursor", "/docs/api/producer"]),
        ("/blog/2024", vec!["/blog/2024/release"]),
    ])
}

/// Children of `page` not seen before in this crawl.
fn links(graph: &Graph, seen: &Mutex<HashSet<&'static str>>, page: &str) -> Vec<&'static str> {
    let mut seen = seen.lock().unwrap_or_else(|e| e.into_inner());
    graph
        .get(page)
        .into_iter()
        .flatten()
        .copied()
        .filter(|link| seen.insert(*link))
        .collect()
}

fn crawler(graph: Arc<Graph>, seen: Arc<Mutex<HashSet<&'static str>>>) -> Expand<&'static str> {
    let root = Defer::new(|_ctx: CancellationToken| async {
        tracing::info!("fetching root");
        Ok::<_, SequenceError>(from_iter(["/"]).shared())
    });

    Expand::new(root.shared(), move |page: &'static str, ctx: CancellationToken| {
        let graph = Arc::clone(&graph);
        let seen = Arc::clone(&seen);
        async move {
            // Simulated network latency; cancellation aborts the wait.
            let cancelled = tokio::select! {
                _ = ctx.cancelled() => true,
                _ = tokio::time::sleep(Duration::from_millis(20)) => false,
            };
            let next = if cancelled { Vec::new() } else { links(&graph, &seen, page) };
            Ok::<SequenceRef<&'static str>, SequenceError>(from_iter(next).shared())
        }
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let graph = Arc::new(site());

    // 1. Full crawl
    let seen = Arc::new(Mutex::new(HashSet::from(["/"])));
    let pages = crawler(Arc::clone(&graph), seen)
        .collect(CancellationToken::new())
        .await?;
    println!("[crawl] full: {pages:?}");

    // 2. Stop after three pages
    let seen = Arc::new(Mutex::new(HashSet::from(["/"])));
    let ctx = CancellationToken::new();
    let mut visited = Vec::new();
    crawler(graph, seen)
        .for_each(ctx.clone(), |page| {
            visited.push(page);
            if visited.len() == 3 {
                ctx.cancel();
            }
            async {}
        })
        .await?;
    println!("[crawl] first three: {visited:?}");

    Ok(())
}
