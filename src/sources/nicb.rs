// src/sources/nicb.rs
//
// News-release listing behind the anti-bot wall. The same article container
// carries nav and careers links, so a block only counts as an article when
// its link matches the news-release path prefix. The only date signal is
// display text, parsed permissively.

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
    path: "/nicb-news-releases.rss",
    title: "NICB News Releases",
    link: "https://www.nicb.org/news/news-releases",
    description: "News releases from the National Insurance Crime Bureau",
    fetch_url: "https://www.nicb.org/news/news-releases",
    access: AccessMode::Proxied,
};

const BASE: &str = "https://www.nicb.org";
const ARTICLE_PATH_PREFIX: &str = "/news/news-releases";
const SOURCE_TZ: Tz = chrono_tz::America::Chicago;

static BLOCK: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static LINKS: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h2, h3").unwrap());
static DATE: Lazy<Selector> = Lazy::new(|| Selector::parse(".date").unwrap());

pub struct NicbNewsReleases;

#[async_trait]
impl SourceExtractor for NicbNewsReleases {
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
            tracing::debug!(source = SOURCE.path, skipped, "dropped non-article or incomplete blocks");
            counter!("extract_skipped_total").increment(skipped as u64);
        }
        Ok(out)
    }
}

fn parse_block(base: &Url, block: ElementRef<'_>) -> Option<ArticleRecord> {
    // Nav and about links share the container; the path prefix is the
    // article test.
    let anchor = block.select(&LINKS).find(|a| {
        a.value()
            .attr("href")
            .is_some_and(|href| href.starts_with(ARTICLE_PATH_PREFIX))
    })?;
    let href = anchor.value().attr("href")?;
    let link = base.join(href).ok()?.to_string();

    let title = non_empty(element_text(anchor.select(&HEADING).next()?))?;

    let date_text = element_text(block.select(&DATE).next()?);
    let published_at = dates::parse_freeform(&date_text, SOURCE_TZ)?;

    Some(ArticleRecord {
        title,
        link,
        published_at,
        modified_at: None,
        summary: None,
        body: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = include_str!("../../tests/fixtures/nicb_news_releases.html");

    #[tokio::test]
    async fn only_complete_news_release_blocks_survive() {
        let gateway = FetchGateway::new("http://127.0.0.1:1/v1");
        let records = NicbNewsReleases.extract(&gateway, PAGE).await.unwrap();

        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(records.len(), 2, "{titles:?}");
        assert!(titles.contains(&"NICB Warns About Fraud"));
        assert!(titles.contains(&"New Report Released"));
        // Careers link, heading-less block and date-less block all dropped.
        assert!(!titles.contains(&"Join Our Team"));
        assert!(!titles.contains(&"Article Without Date"));
    }

    #[tokio::test]
    async fn links_are_absolute() {
        let gateway = FetchGateway::new("http://127.0.0.1:1/v1");
        let records = NicbNewsReleases.extract(&gateway, PAGE).await.unwrap();
        assert!(records
            .iter()
            .all(|r| r.link.starts_with("https://www.nicb.org/news/news-releases/")));
    }
}
