// src/types.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::FeedError;
use crate::fetch::FetchGateway;

/// The canonical unit flowing through the pipeline. Every record that leaves
/// an extractor has a non-empty title, an absolute link and a publish time;
/// candidates missing any of those are dropped, never padded out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    pub title: String,
    /// Absolute URL, unique within a feed. Doubles as the item GUID.
    pub link: String,
    pub published_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    pub summary: Option<String>,
    /// Rendered HTML body content.
    pub body: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Plain HTTP GET against the fetch URL.
    Direct,
    /// Routed through the anti-bot relay, which solves the page in a real
    /// browser and hands back the body.
    Proxied,
}

/// Static per-source descriptor. Defined once in the registry, never mutated.
#[derive(Debug, Clone)]
pub struct FeedSource {
    /// Serving route, e.g. "/hackernews-highlights.rss".
    pub path: &'static str,
    pub title: &'static str,
    /// Human-facing site URL, used as the channel link.
    pub link: &'static str,
    pub description: &'static str,
    pub fetch_url: &'static str,
    pub access: AccessMode,
}

/// One implementation per source. `extract` owns all source-specific
/// fragility handling: a malformed candidate item is logged and skipped,
/// only a whole-payload structural failure is an error.
///
/// The gateway is passed in for the sources that need secondary per-article
/// fetches; most implementations ignore it.
#[async_trait]
pub trait SourceExtractor: Send + Sync {
    fn source(&self) -> &'static FeedSource;

    async fn extract(
        &self,
        gateway: &FetchGateway,
        raw: &str,
    ) -> Result<Vec<ArticleRecord>, FeedError>;
}
