// src/sources/uber.rs
//
// WordPress REST API source. Per-post metadata lives in the yoast head
// blob, with three-way fallback chains for title and description. The
// rendered body HTML is parsed and re-serialized rather than passed
// through raw.

use async_trait::async_trait;
use metrics::counter;
use scraper::Html;
use serde::Deserialize;

use super::non_empty;
use crate::dates;
use crate::error::FeedError;
use crate::fetch::FetchGateway;
use crate::types::{AccessMode, ArticleRecord, FeedSource, SourceExtractor};

static SOURCE: FeedSource = FeedSource {
    path: "/uber-engineering.rss",
    title: "Uber Engineering",
    link: "https://www.uber.com/blog/engineering/",
    description: "Articles from Uber Engineering",
    fetch_url:
        "https://blogapi.uber.com/wp-json/wp/v2/posts?languages=2257&categories=221148&page=1&per_page=25",
    access: AccessMode::Direct,
};

#[derive(Debug, Deserialize)]
struct Post {
    content: Option<Rendered>,
    link: Option<String>,
    #[serde(rename = "yoast_head_json")]
    yoast: Option<Yoast>,
}

#[derive(Debug, Deserialize)]
struct Rendered {
    rendered: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Yoast {
    title: Option<String>,
    og_title: Option<String>,
    twitter_title: Option<String>,
    description: Option<String>,
    og_description: Option<String>,
    twitter_description: Option<String>,
    article_published_time: Option<String>,
    article_modified_time: Option<String>,
}

pub struct UberEngineering;

#[async_trait]
impl SourceExtractor for UberEngineering {
    fn source(&self) -> &'static FeedSource {
        &SOURCE
    }

    async fn extract(
        &self,
        _gateway: &FetchGateway,
        raw: &str,
    ) -> Result<Vec<ArticleRecord>, FeedError> {
        // A non-array body here means the API answered with an error object.
        let posts: Vec<serde_json::Value> = serde_json::from_str(raw)
            .map_err(|e| FeedError::MalformedPayload(format!("posts listing: {e}")))?;

        let mut out = Vec::with_capacity(posts.len());
        let mut skipped = 0usize;
        for value in posts {
            match serde_json::from_value::<Post>(value)
                .ok()
                .and_then(parse_post)
            {
                Some(record) => out.push(record),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::debug!(source = SOURCE.path, skipped, "dropped incomplete posts");
            counter!("extract_skipped_total").increment(skipped as u64);
        }
        Ok(out)
    }
}

fn parse_post(post: Post) -> Option<ArticleRecord> {
    let link = post.link.and_then(non_empty)?;
    let yoast = post.yoast.unwrap_or_default();

    // First non-null wins, top to bottom.
    let title = yoast
        .title
        .or(yoast.og_title)
        .or(yoast.twitter_title)
        .and_then(non_empty)?;

    let summary = yoast
        .description
        .or(yoast.og_description)
        .or(yoast.twitter_description)
        .and_then(non_empty);

    let published_at = yoast
        .article_published_time
        .as_deref()
        .and_then(dates::parse_iso)?;

    // Some older posts never got a modified time; publish time stands in.
    let modified_at = yoast
        .article_modified_time
        .as_deref()
        .and_then(dates::parse_iso)
        .unwrap_or(published_at);

    let body = post
        .content
        .and_then(|c| c.rendered)
        .map(|html| tidy_html(&html))
        .and_then(non_empty);

    Some(ArticleRecord {
        title,
        link,
        published_at,
        modified_at: Some(modified_at),
        summary,
        body,
    })
}

/// Parse and re-serialize embedded HTML so whatever the CMS emitted goes
/// out balanced and trimmed.
fn tidy_html(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    fragment.root_element().inner_html().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = include_str!("../../tests/fixtures/uber_posts.json");

    #[tokio::test]
    async fn posts_with_full_metadata_are_extracted() {
        let gateway = FetchGateway::new("http://127.0.0.1:1/v1");
        let records = UberEngineering.extract(&gateway, LISTING).await.unwrap();
        assert_eq!(records.len(), 2);

        let cool = records
            .iter()
            .find(|r| r.title == "Cool Engineering Post")
            .unwrap();
        assert_eq!(cool.link, "https://www.uber.com/blog/cool-post");
        assert_eq!(
            cool.summary.as_deref(),
            Some("A deep dive into engineering.")
        );
        assert_eq!(
            cool.published_at,
            dates::parse_iso("2025-06-01T12:00:00+00:00").unwrap()
        );
        assert_eq!(
            cool.modified_at,
            Some(dates::parse_iso("2025-06-02T12:00:00+00:00").unwrap())
        );
        assert!(cool.body.as_deref().unwrap().contains("Full blog post"));
    }

    #[tokio::test]
    async fn title_falls_back_down_the_chain() {
        let gateway = FetchGateway::new("http://127.0.0.1:1/v1");
        let records = UberEngineering.extract(&gateway, LISTING).await.unwrap();
        let fallback = records
            .iter()
            .find(|r| r.title == "Fallback OG Title")
            .unwrap();
        assert_eq!(
            fallback.summary.as_deref(),
            Some("Fallback OG description.")
        );
        // No modified time upstream: publish time stands in.
        assert_eq!(fallback.modified_at, Some(fallback.published_at));
    }

    #[tokio::test]
    async fn post_with_no_title_anywhere_is_dropped() {
        let gateway = FetchGateway::new("http://127.0.0.1:1/v1");
        let payload = r#"[{
            "content": {"rendered": "<p>text</p>"},
            "link": "https://www.uber.com/blog/untitled",
            "yoast_head_json": {"article_published_time": "2025-05-01T00:00:00+00:00"}
        }]"#;
        let records = UberEngineering.extract(&gateway, payload).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn error_object_payload_is_a_malformed_payload() {
        let gateway = FetchGateway::new("http://127.0.0.1:1/v1");
        let payload = r#"{"code": "rest_post_invalid_page_number"}"#;
        let err = UberEngineering.extract(&gateway, payload).await.unwrap_err();
        assert!(matches!(err, FeedError::MalformedPayload(_)));
    }
}
