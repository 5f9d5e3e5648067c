// src/sources/lawfare.rs
//
// "The Situation" column. The upstream is an internal JSON API, but the
// relay hands its body back as HTML, entity-escaped and wrapped in markup,
// so the payload has to go through a repair pass before it parses. Records
// live in a nested `value` array; the Summary field is itself HTML and is
// stripped to plain text.

use async_trait::async_trait;
use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::{html_to_text, non_empty};
use crate::dates;
use crate::error::FeedError;
use crate::fetch::FetchGateway;
use crate::types::{AccessMode, ArticleRecord, FeedSource, SourceExtractor};

static SOURCE: FeedSource = FeedSource {
    path: "/the-situation.rss",
    title: "Lawfare - The Situation",
    link: "https://www.lawfaremedia.org/topics/the-situation",
    description: "The Situation column from Lawfare",
    fetch_url:
        "https://www.lawfaremedia.org/api/content?type=article&topic=the-situation&limit=25",
    access: AccessMode::Proxied,
};

const ARTICLE_BASE: &str = "https://www.lawfaremedia.org/article/";

#[derive(Debug, Deserialize)]
struct Envelope {
    value: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "Summary")]
    summary: Option<String>,
    #[serde(rename = "PublicationDate")]
    publication_date: Option<String>,
    #[serde(rename = "UrlName")]
    url_name: Option<String>,
}

pub struct TheSituation;

#[async_trait]
impl SourceExtractor for TheSituation {
    fn source(&self) -> &'static FeedSource {
        &SOURCE
    }

    async fn extract(
        &self,
        _gateway: &FetchGateway,
        raw: &str,
    ) -> Result<Vec<ArticleRecord>, FeedError> {
        let repaired = repair_json(raw).ok_or_else(|| {
            FeedError::MalformedPayload("no JSON payload in relay body".to_string())
        })?;
        let envelope: Envelope = serde_json::from_str(&repaired)
            .map_err(|e| FeedError::MalformedPayload(format!("situation payload: {e}")))?;

        let mut out = Vec::with_capacity(envelope.value.len());
        let mut skipped = 0usize;
        for value in envelope.value {
            match serde_json::from_value::<Entry>(value)
                .ok()
                .and_then(parse_entry)
            {
                Some(record) => out.push(record),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::debug!(source = SOURCE.path, skipped, "dropped incomplete entries");
            counter!("extract_skipped_total").increment(skipped as u64);
        }
        Ok(out)
    }
}

fn parse_entry(entry: Entry) -> Option<ArticleRecord> {
    let title = entry.title.and_then(non_empty)?;
    let url_name = entry.url_name.and_then(non_empty)?;
    let published_at = entry
        .publication_date
        .as_deref()
        .and_then(dates::parse_iso)?;
    let summary = entry
        .summary
        .map(|html| html_to_text(&html))
        .and_then(non_empty);

    Some(ArticleRecord {
        title,
        link: format!("{ARTICLE_BASE}{url_name}"),
        published_at,
        modified_at: None,
        summary,
        body: None,
    })
}

/// Make the relay's "HTML" parse as JSON again: slice to the outermost
/// JSON brackets, decode HTML entities, drop trailing commas.
pub(crate) fn repair_json(raw: &str) -> Option<String> {
    let start = raw.find(['{', '['])?;
    let end = raw.rfind(['}', ']'])?;
    if end < start {
        return None;
    }

    let decoded = html_escape::decode_html_entities(&raw[start..=end]).to_string();

    static RE_TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*([\]}])").unwrap());
    Some(RE_TRAILING_COMMA.replace_all(&decoded, "$1").into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GARBLED: &str = include_str!("../../tests/fixtures/the_situation_garbled.html");

    #[test]
    fn repair_unwraps_markup_and_entities() {
        let raw = r#"<html><body><pre>{&quot;value&quot;: [1, 2,]}</pre></body></html>"#;
        let repaired = repair_json(raw).unwrap();
        let v: Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(v["value"][0], 1);
    }

    #[test]
    fn repair_rejects_bodies_with_no_json_at_all() {
        assert!(repair_json("<html><body>blocked</body></html>").is_none());
    }

    #[tokio::test]
    async fn garbled_payload_is_repaired_and_extracted() {
        let gateway = FetchGateway::new("http://127.0.0.1:1/v1");
        let records = TheSituation.extract(&gateway, GARBLED).await.unwrap();
        assert_eq!(records.len(), 2);

        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert!(titles.contains(&"The Situation: January Edition"));
        assert!(titles.contains(&"The Situation: December Edition"));

        let january = records
            .iter()
            .find(|r| r.title.ends_with("January Edition"))
            .unwrap();
        assert_eq!(
            january.link,
            "https://www.lawfaremedia.org/article/the-situation-january-2025"
        );
        // Summary HTML is stripped to text.
        assert_eq!(
            january.summary.as_deref(),
            Some("Summary of the January situation report.")
        );
    }

    #[tokio::test]
    async fn entry_missing_its_publication_date_is_dropped() {
        let gateway = FetchGateway::new("http://127.0.0.1:1/v1");
        let payload = r#"{"value": [
            {"Title": "Ok", "Summary": "s", "PublicationDate": "2025-01-20T14:00:00Z", "UrlName": "ok"},
            {"Title": "No date", "Summary": "s", "UrlName": "no-date"}
        ]}"#;
        let records = TheSituation.extract(&gateway, payload).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Ok");
    }
}
