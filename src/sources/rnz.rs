// src/sources/rnz.rs
//
// Author archive. The listing only carries a headline link per story, so
// each article needs a secondary fetch for its title, summary, body and
// publish date. Fetched detail is held in the enrichment cache keyed by
// link and pruned against the live listing after every cycle.

use async_trait::async_trait;
use metrics::counter;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use super::{element_text, non_empty};
use crate::dates;
use crate::enrich::{ArticleDetail, EnrichmentCache};
use crate::error::FeedError;
use crate::fetch::FetchGateway;
use crate::types::{AccessMode, ArticleRecord, FeedSource, SourceExtractor};

static SOURCE: FeedSource = FeedSource {
    path: "/rnz-phil-pennington.rss",
    title: "RNZ - Phil Pennington",
    link: "https://www.rnz.co.nz/authors/phil-pennington",
    description: "Articles from Phil Pennington",
    fetch_url: "https://www.rnz.co.nz/authors/phil-pennington",
    access: AccessMode::Direct,
};

const BASE: &str = "https://www.rnz.co.nz";

static DIGEST: Lazy<Selector> = Lazy::new(|| Selector::parse("div.o-digest--news").unwrap());
static HEADLINE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h3.o-digest__headline a[href]").unwrap());

static META_OG_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());
static META_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());
static META_OG_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:description"]"#).unwrap());
static META_PUBLISHED: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="article:published_time"]"#).unwrap());
static TITLE_EL: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static ARTICLE_EL: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());

pub struct RnzAuthorArchive {
    cache: EnrichmentCache,
}

impl RnzAuthorArchive {
    pub fn new() -> Self {
        Self {
            cache: EnrichmentCache::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn cache(&self) -> &EnrichmentCache {
        &self.cache
    }
}

impl Default for RnzAuthorArchive {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceExtractor for RnzAuthorArchive {
    fn source(&self) -> &'static FeedSource {
        &SOURCE
    }

    async fn extract(
        &self,
        gateway: &FetchGateway,
        raw: &str,
    ) -> Result<Vec<ArticleRecord>, FeedError> {
        let links = listing_links(raw);

        let mut out = Vec::with_capacity(links.len());
        let mut skipped = 0usize;
        for link in &links {
            let detail = match self.cache.get(link) {
                Some(detail) => detail,
                None => match fetch_detail(gateway, link).await {
                    Some(detail) => {
                        self.cache.insert(link.clone(), detail.clone());
                        detail
                    }
                    None => {
                        tracing::warn!(source = SOURCE.path, link = %link, "article detail unusable, skipping");
                        skipped += 1;
                        continue;
                    }
                },
            };
            out.push(ArticleRecord {
                title: detail.title,
                link: link.clone(),
                published_at: detail.published_at,
                modified_at: None,
                summary: detail.summary,
                body: detail.body,
            });
        }

        // Stale-result pruning: detail for links that dropped off the
        // listing is no longer relevant.
        self.cache.retain_links(links.iter().map(String::as_str));

        if skipped > 0 {
            counter!("extract_skipped_total").increment(skipped as u64);
        }
        Ok(out)
    }
}

fn listing_links(raw: &str) -> Vec<String> {
    let doc = Html::parse_document(raw);
    let Ok(base) = Url::parse(BASE) else {
        return Vec::new();
    };
    doc.select(&DIGEST)
        .filter_map(|digest| {
            let href = digest.select(&HEADLINE_LINK).next()?.value().attr("href")?;
            base.join(href).ok().map(|u| u.to_string())
        })
        .collect()
}

async fn fetch_detail(gateway: &FetchGateway, link: &str) -> Option<ArticleDetail> {
    let html = match gateway.fetch_url(link).await {
        Ok(html) => html,
        Err(e) => {
            tracing::warn!(source = SOURCE.path, link = %link, error = %e, "detail fetch failed");
            return None;
        }
    };
    parse_detail(&html)
}

/// Generic article-page extraction: og/meta tags first, document fallbacks
/// second. A page that yields no title or no parseable publish date gives
/// no detail at all.
fn parse_detail(html: &str) -> Option<ArticleDetail> {
    let doc = Html::parse_document(html);

    let title = meta_content(&doc, &META_OG_TITLE)
        .or_else(|| doc.select(&TITLE_EL).next().map(element_text))
        .and_then(non_empty)?;

    let published_at = meta_content(&doc, &META_PUBLISHED)
        .as_deref()
        .and_then(dates::parse_iso)?;

    let summary = meta_content(&doc, &META_DESCRIPTION)
        .or_else(|| meta_content(&doc, &META_OG_DESCRIPTION))
        .and_then(non_empty);

    let body = doc
        .select(&ARTICLE_EL)
        .next()
        .map(|el| el.inner_html())
        .and_then(non_empty);

    Some(ArticleDetail {
        title,
        summary,
        body,
        published_at,
    })
}

fn meta_content(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()?
        .value()
        .attr("content")
        .map(str::to_string)
}
