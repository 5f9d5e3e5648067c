// src/enrich.rs
//
// Detail lookups for sources whose listing pages are too thin to build a
// feed item from. The cache tracks "currently relevant" detail only: after
// every cycle it is pruned against the live listing, so it stays bounded by
// the listing size rather than by time or count.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

/// Everything a secondary article fetch contributes to a record. A detail is
/// only stored once it is complete enough to emit (title + publish time);
/// incomplete pages are retried on the next cycle instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDetail {
    pub title: String,
    pub summary: Option<String>,
    pub body: Option<String>,
    pub published_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct EnrichmentCache {
    entries: Mutex<HashMap<String, ArticleDetail>>,
}

impl EnrichmentCache {
    pub fn get(&self, link: &str) -> Option<ArticleDetail> {
        self.entries
            .lock()
            .expect("mutex poisoned")
            .get(link)
            .cloned()
    }

    pub fn insert(&self, link: String, detail: ArticleDetail) {
        self.entries
            .lock()
            .expect("mutex poisoned")
            .insert(link, detail);
    }

    /// Drop every entry whose link is absent from the current listing.
    pub fn retain_links<'a, I>(&self, live: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let live: std::collections::HashSet<&str> = live.into_iter().collect();
        self.entries
            .lock()
            .expect("mutex poisoned")
            .retain(|link, _| live.contains(link.as_str()));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
