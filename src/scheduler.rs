// src/scheduler.rs
//
// The refresh loop and the latest-good-document store. One background task
// walks every registered source in order each tick; a failing source keeps
// its previous document and never blocks the others. Request handlers only
// ever read the cache, except on a cold-start miss where they run the same
// per-source refresh synchronously.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::AppState;
use crate::assemble::assemble;
use crate::error::FeedError;
use crate::fetch::FetchGateway;
use crate::types::SourceExtractor;

/// Process-wide map from serving path to the latest rendered document.
/// Starts empty; slots are only ever overwritten whole.
#[derive(Default)]
pub struct FeedCache {
    inner: RwLock<HashMap<&'static str, String>>,
}

impl FeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.inner
            .read()
            .expect("rwlock poisoned")
            .get(path)
            .cloned()
    }

    pub fn put(&self, path: &'static str, document: String) {
        self.inner
            .write()
            .expect("rwlock poisoned")
            .insert(path, document);
    }
}

/// One full fetch-extract-assemble pass for a single source, storing the
/// result on success. Shared by the scheduler tick and the cold-start
/// request path.
pub async fn refresh_source(
    gateway: &FetchGateway,
    extractor: &dyn SourceExtractor,
    cache: &FeedCache,
) -> Result<(), FeedError> {
    let source = extractor.source();

    let raw = gateway.fetch(source).await?;

    let t0 = std::time::Instant::now();
    let records = extractor.extract(gateway, &raw).await?;
    histogram!("extract_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    counter!("extract_items_total").increment(records.len() as u64);

    let document = assemble(source, records);
    cache.put(source.path, document);
    Ok(())
}

/// Spawn the background refresh loop. The shutdown receiver is checked at
/// the top of every iteration, so a flip lands between passes; in-flight
/// fetches are bounded by their own timeouts.
pub fn spawn_refresh_loop(
    state: AppState,
    interval_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    crate::metrics::describe_metrics();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("refresh loop stopping");
                    break;
                }
                _ = ticker.tick() => {}
            }

            for extractor in state.feeds.iter() {
                let source = extractor.source();
                match refresh_source(&state.gateway, extractor.as_ref(), &state.cache).await {
                    Ok(()) => {
                        tracing::info!(source = source.path, "feed refreshed");
                    }
                    Err(e) => {
                        // Per-source isolation: the previous document stays.
                        tracing::warn!(
                            source = source.path,
                            error = %e,
                            "refresh failed, keeping previous document"
                        );
                        counter!("refresh_source_errors_total").increment(1);
                    }
                }
            }

            counter!("refresh_runs_total").increment(1);
            gauge!("refresh_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_starts_empty_and_overwrites_whole_documents() {
        let cache = FeedCache::new();
        assert!(cache.get("/a.rss").is_none());

        cache.put("/a.rss", "<rss>v1</rss>".to_string());
        assert_eq!(cache.get("/a.rss").as_deref(), Some("<rss>v1</rss>"));

        cache.put("/a.rss", "<rss>v2</rss>".to_string());
        assert_eq!(cache.get("/a.rss").as_deref(), Some("<rss>v2</rss>"));
        assert!(cache.get("/b.rss").is_none());
    }
}
