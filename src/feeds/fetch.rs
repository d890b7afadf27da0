//! Concurrent fetch of every configured source.
//!
//! All sources are requested at once and the batch waits until each one has
//! either produced items or failed. A failure (bad status, transport error,
//! timeout, or an unusable document) is attributed to its source by name and
//! never affects the other sources.

use futures::stream::{self, StreamExt};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::error::FetchError;
use crate::feeds::parser;
use crate::feeds::transport::FeedTransport;
use crate::models::{FetchOutcome, NewsItem, Source};
use crate::normalize::normalize;

/// Fetch and parse one source, bounded by `max_wait`.
#[instrument(level = "info", skip_all, fields(source = %source.name))]
pub async fn fetch_source<T: FeedTransport>(
    transport: &T,
    source: &Source,
    max_wait: Duration,
) -> Result<Vec<NewsItem>, FetchError> {
    let t0 = Instant::now();
    let body = timeout(max_wait, transport.get_text(&source.endpoint))
        .await
        .map_err(|_| FetchError::Timeout(max_wait))??;

    let parsed = parser::parse(&body, &source.name);
    if parsed.is_unusable() {
        return Err(FetchError::Malformed(parsed.error.unwrap_or_default()));
    }

    let items: Vec<NewsItem> = parsed
        .items
        .into_iter()
        .map(|raw| normalize(raw, &source.name))
        .collect();
    debug!(
        count = items.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Fetched source"
    );
    Ok(items)
}

/// Fetch every source concurrently and merge the results.
///
/// Items are flattened in configuration order; within a source they keep
/// document order. Failed sources are listed by name in configuration order.
#[instrument(level = "info", skip_all, fields(sources = sources.len()))]
pub async fn fetch_all<T: FeedTransport>(
    transport: &T,
    sources: &[Source],
    max_wait: Duration,
) -> FetchOutcome {
    let results: Vec<(&Source, Result<Vec<NewsItem>, FetchError>)> = stream::iter(sources)
        .map(|source| async move { (source, fetch_source(transport, source, max_wait).await) })
        .buffered(sources.len().max(1))
        .collect()
        .await;

    let mut outcome = FetchOutcome::default();
    for (source, result) in results {
        match result {
            Ok(mut items) => outcome.items.append(&mut items),
            Err(e) => {
                warn!(source = %source.name, error = %e, "Source fetch failed");
                outcome.failed_sources.push(source.name.clone());
            }
        }
    }

    info!(
        items = outcome.items.len(),
        failed = outcome.failed_sources.len(),
        "Fetch cycle complete"
    );
    outcome
}
