// src/assemble.rs
//
// Renders normalized records into an RSS document. Records are sorted
// ascending by publish time and emitted in reverse, so the document reads
// newest-first top-to-bottom — the order feed readers expect.

use std::collections::BTreeMap;

use rss::extension::dublincore::DublinCoreExtension;
use rss::{ChannelBuilder, Guid, Item, ItemBuilder};

use crate::types::{ArticleRecord, FeedSource};

const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";

pub fn assemble(source: &FeedSource, mut records: Vec<ArticleRecord>) -> String {
    records.sort_by_key(|r| r.published_at);

    let items: Vec<Item> = records.iter().rev().map(to_item).collect();

    let mut namespaces = BTreeMap::new();
    namespaces.insert("dc".to_string(), DC_NAMESPACE.to_string());

    ChannelBuilder::default()
        .title(source.title.to_string())
        .link(source.link.to_string())
        .description(source.description.to_string())
        .namespaces(namespaces)
        .items(items)
        .build()
        .to_string()
}

fn to_item(record: &ArticleRecord) -> Item {
    let guid = Guid {
        value: record.link.clone(),
        permalink: true,
    };

    let mut builder = ItemBuilder::default();
    builder
        .title(Some(record.title.clone()))
        .link(Some(record.link.clone()))
        .guid(Some(guid))
        .pub_date(Some(record.published_at.to_rfc2822()));

    if let Some(summary) = &record.summary {
        builder.description(Some(summary.clone()));
    }
    if let Some(body) = &record.body {
        builder.content(Some(body.clone()));
    }
    // RSS 2.0 items have no updated element; modification time goes out as
    // a Dublin Core date.
    if let Some(modified) = record.modified_at {
        let mut dc = DublinCoreExtension::default();
        dc.set_dates(vec![modified.to_rfc3339()]);
        builder.dublin_core_ext(Some(dc));
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccessMode;
    use chrono::{TimeZone, Utc};

    static FEED: FeedSource = FeedSource {
        path: "/test.rss",
        title: "Test Feed",
        link: "https://example.test",
        description: "A test feed",
        fetch_url: "https://example.test/listing",
        access: AccessMode::Direct,
    };

    fn record(title: &str, link: &str, ymd: (i32, u32, u32)) -> ArticleRecord {
        ArticleRecord {
            title: title.to_string(),
            link: link.to_string(),
            published_at: Utc.with_ymd_and_hms(ymd.0, ymd.1, ymd.2, 0, 0, 0).unwrap(),
            modified_at: None,
            summary: None,
            body: None,
        }
    }

    #[test]
    fn empty_input_is_a_valid_empty_channel() {
        let xml = assemble(&FEED, vec![]);
        assert!(xml.contains("<title>Test Feed</title>"));
        assert!(xml.contains("<description>A test feed</description>"));
        assert!(!xml.contains("<item>"));
    }

    #[test]
    fn items_read_newest_first_regardless_of_input_order() {
        let records = vec![
            record("Oldest", "https://example.test/1", (2025, 1, 10)),
            record("Newest", "https://example.test/3", (2025, 1, 30)),
            record("Middle", "https://example.test/2", (2025, 1, 20)),
        ];
        let xml = assemble(&FEED, records);
        let newest = xml.find("Newest").unwrap();
        let middle = xml.find("Middle").unwrap();
        let oldest = xml.find("Oldest").unwrap();
        assert!(newest < middle && middle < oldest, "expected newest-first");
    }

    #[test]
    fn optional_fields_emitted_only_when_present() {
        let mut full = record("Full", "https://example.test/full", (2025, 1, 15));
        full.summary = Some("A brief summary".to_string());
        full.body = Some("<p>Full text</p>".to_string());
        full.modified_at = Some(Utc.with_ymd_and_hms(2025, 1, 16, 10, 0, 0).unwrap());
        let minimal = record("Minimal", "https://example.test/min", (2025, 1, 14));

        let xml = assemble(&FEED, vec![full, minimal]);
        assert!(xml.contains("A brief summary"));
        assert!(xml.contains("Full text"));
        assert!(xml.contains("<dc:date>"));

        // The minimal item carries none of the optional elements.
        let minimal_at = xml.find("Minimal").unwrap();
        let tail = &xml[minimal_at..];
        assert!(!tail.contains("<description>"));
        assert!(!tail.contains("<dc:date>"));
    }

    #[test]
    fn item_identity_is_the_permalink_guid() {
        let xml = assemble(
            &FEED,
            vec![record("One", "https://example.test/one", (2025, 2, 1))],
        );
        assert!(xml.contains(r#"<guid>https://example.test/one</guid>"#)
            || xml.contains(r#"<guid isPermaLink="true">https://example.test/one</guid>"#));
        assert!(xml.contains("<pubDate>"));
    }
}
