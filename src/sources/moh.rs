// src/sources/moh.rs
//
// Ministry of Health news listing. Drupal field classes all the way down;
// the issue date usually carries a machine-readable datetime attribute,
// with the display text ("15 June 2025") as fallback. Title and date are
// required, the body field is optional.

use async_trait::async_trait;
use chrono_tz::Tz;
use metrics::counter;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{element_text, non_empty};
use crate::dates;
use crate::error::FeedError;
use crate::fetch::FetchGateway;
use crate::types::{AccessMode, ArticleRecord, FeedSource, SourceExtractor};

static SOURCE: FeedSource = FeedSource {
    path: "/moh-news.rss",
    title: "Ministry of Health News",
    link: "https://www.health.govt.nz/news-media/news-items",
    description: "News and media releases from the NZ Ministry of Health",
    fetch_url: "https://www.health.govt.nz/news-media/news-items",
    access: AccessMode::Proxied,
};

const BASE: &str = "https://www.health.govt.nz";
const SOURCE_TZ: Tz = chrono_tz::Pacific::Auckland;

static BLOCK: Lazy<Selector> = Lazy::new(|| Selector::parse("article.sector-news").unwrap());
static TITLE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".field--name-field-display-title h2 a[href]").unwrap());
static ISSUE_TIME: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".field--name-field-issue-date time").unwrap());
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse(".field--name-field-body").unwrap());

pub struct MohNews;

#[async_trait]
impl SourceExtractor for MohNews {
    fn source(&self) -> &'static FeedSource {
        &SOURCE
    }

    async fn extract(
        &self,
        _gateway: &FetchGateway,
        raw: &str,
    ) -> Result<Vec<ArticleRecord>, FeedError> {
        let doc = Html::parse_document(raw);
        let base = Url::parse(BASE)
            .map_err(|e| FeedError::MalformedPayload(format!("bad base url: {e}")))?;

        let mut out = Vec::new();
        let mut skipped = 0usize;
        for block in doc.select(&BLOCK) {
            match parse_block(&base, block) {
                Some(record) => out.push(record),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::debug!(source = SOURCE.path, skipped, "dropped incomplete news blocks");
            counter!("extract_skipped_total").increment(skipped as u64);
        }
        Ok(out)
    }
}

fn parse_block(base: &Url, block: ElementRef<'_>) -> Option<ArticleRecord> {
    let anchor = block.select(&TITLE_LINK).next()?;
    let title = non_empty(element_text(anchor))?;
    let link = base.join(anchor.value().attr("href")?).ok()?.to_string();

    let time_el = block.select(&ISSUE_TIME).next()?;
    let published_at = time_el
        .value()
        .attr("datetime")
        .and_then(dates::parse_iso)
        .or_else(|| dates::parse_freeform(&element_text(time_el), SOURCE_TZ))?;

    let body = block
        .select(&BODY)
        .next()
        .map(|el| el.inner_html())
        .and_then(non_empty);

    Some(ArticleRecord {
        title,
        link,
        published_at,
        modified_at: None,
        summary: None,
        body,
    })
}
