// src/sources/hackernews.rs
//
// Comment highlights. Each `tr.athing` row is a comment; a row only becomes
// a feed item if the author, comment body, machine-readable timestamp and
// parent-story title are all present. The "N hours ago" text is display
// only — the timestamp comes from the age element's title attribute.

use async_trait::async_trait;
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
    path: "/hackernews-highlights.rss",
    title: "Hacker News Highlights",
    link: "https://news.ycombinator.com/highlights",
    description: "Interesting comments",
    fetch_url: "https://news.ycombinator.com/highlights",
    access: AccessMode::Direct,
};

const BASE: &str = "https://news.ycombinator.com/";

static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr.athing").unwrap());
static AUTHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a.hnuser").unwrap());
static COMMENT: Lazy<Selector> = Lazy::new(|| Selector::parse("div.commtext").unwrap());
static AGE: Lazy<Selector> = Lazy::new(|| Selector::parse("span.age").unwrap());
static AGE_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("span.age a[href]").unwrap());
static STORY_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("span.onstory a").unwrap());

pub struct HackerNewsHighlights;

#[async_trait]
impl SourceExtractor for HackerNewsHighlights {
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
        for row in doc.select(&ROW) {
            match parse_row(&base, row) {
                Some(record) => out.push(record),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::debug!(source = SOURCE.path, skipped, "dropped incomplete comment rows");
            counter!("extract_skipped_total").increment(skipped as u64);
        }
        Ok(out)
    }
}

fn parse_row(base: &Url, row: ElementRef<'_>) -> Option<ArticleRecord> {
    let author = non_empty(element_text(row.select(&AUTHOR).next()?))?;
    let body = non_empty(row.select(&COMMENT).next()?.inner_html())?;

    let age = row.select(&AGE).next()?;
    let published_at = dates::parse_stamped(age.value().attr("title")?)?;

    let fragment = row.select(&AGE_LINK).next()?.value().attr("href")?;
    let link = base.join(fragment).ok()?.to_string();

    let story = non_empty(element_text(row.select(&STORY_LINK).next()?))?;

    Some(ArticleRecord {
        title: format!("{author} on {story}"),
        link,
        published_at,
        modified_at: None,
        summary: None,
        body: Some(body),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = include_str!("../../tests/fixtures/hackernews_highlights.html");

    #[tokio::test]
    async fn complete_rows_become_records_and_partial_rows_are_dropped() {
        let gateway = FetchGateway::new("http://127.0.0.1:1/v1");
        let records = HackerNewsHighlights
            .extract(&gateway, PAGE)
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert!(titles.contains(&"alice on Why Rust is Great"));
        assert!(titles.contains(&"bob on Database Design Tips"));
    }

    #[tokio::test]
    async fn link_is_joined_onto_the_site_base() {
        let gateway = FetchGateway::new("http://127.0.0.1:1/v1");
        let records = HackerNewsHighlights
            .extract(&gateway, PAGE)
            .await
            .unwrap();
        assert!(records
            .iter()
            .any(|r| r.link == "https://news.ycombinator.com/item?id=12345"));
    }

    #[tokio::test]
    async fn timestamp_comes_from_the_title_attribute() {
        let gateway = FetchGateway::new("http://127.0.0.1:1/v1");
        let records = HackerNewsHighlights
            .extract(&gateway, PAGE)
            .await
            .unwrap();
        let alice = records
            .iter()
            .find(|r| r.title.starts_with("alice"))
            .unwrap();
        assert_eq!(
            alice.published_at,
            dates::parse_iso("2025-06-10T14:30:00Z").unwrap()
        );
    }
}
