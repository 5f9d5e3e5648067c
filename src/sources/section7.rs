// src/sources/section7.rs
//
// Section 7 compliance-report listing: a plain document table of PDF links.
// Link text carries a bracketed format/size suffix that is not part of the
// title. The publish date hides in an 8-digit token in the file path; rows
// without one fall back to January 1st of the year column, and rows with
// neither are dropped.

use async_trait::async_trait;
use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{element_text, non_empty};
use crate::dates;
use crate::error::FeedError;
use crate::fetch::FetchGateway;
use crate::types::{AccessMode, ArticleRecord, FeedSource, SourceExtractor};

static SOURCE: FeedSource = FeedSource {
    path: "/section7-reports.rss",
    title: "Section 7 Reports",
    link: "https://www.justice.govt.nz/justice-sector-policy/constitutional-issues-and-human-rights/human-rights/bill-of-rights-compliance-reports/",
    description: "Bill of Rights section 7 compliance reports",
    fetch_url: "https://www.justice.govt.nz/justice-sector-policy/constitutional-issues-and-human-rights/human-rights/bill-of-rights-compliance-reports/",
    access: AccessMode::Direct,
};

const BASE: &str = "https://www.justice.govt.nz";
const MIN_CELLS: usize = 3;

static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("table tr").unwrap());
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

// "Report title [PDF, 1.2 MB]" -> "Report title"
static RE_FILE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\[[^\]]*\]\s*$").unwrap());
static RE_DATE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{8}").unwrap());

pub struct Section7Reports;

#[async_trait]
impl SourceExtractor for Section7Reports {
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
            let cells: Vec<ElementRef<'_>> = row.select(&CELL).collect();
            // Header rows and layout filler never reach the cell minimum.
            if cells.len() < MIN_CELLS {
                continue;
            }
            match parse_row(&base, &cells) {
                Some(record) => out.push(record),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::debug!(source = SOURCE.path, skipped, "dropped undateable report rows");
            counter!("extract_skipped_total").increment(skipped as u64);
        }
        Ok(out)
    }
}

fn parse_row(base: &Url, cells: &[ElementRef<'_>]) -> Option<ArticleRecord> {
    let anchor = cells[0].select(&LINK).next()?;
    let href = anchor.value().attr("href")?;
    let link = base.join(href).ok()?.to_string();

    let title = non_empty(
        RE_FILE_SUFFIX
            .replace(&element_text(anchor), "")
            .into_owned(),
    )?;

    let published_at = date_from_path(href)
        .or_else(|| year_fallback(cells[1]))
        .and_then(dates::date_to_utc)?;

    Some(ArticleRecord {
        title,
        link,
        published_at,
        modified_at: None,
        summary: None,
        body: None,
    })
}

fn date_from_path(href: &str) -> Option<chrono::NaiveDate> {
    RE_DATE_TOKEN
        .find_iter(href)
        .find_map(|token| dates::parse_compact(token.as_str()))
}

fn year_fallback(cell: ElementRef<'_>) -> Option<chrono::NaiveDate> {
    let year: i32 = element_text(cell).parse().ok()?;
    chrono::NaiveDate::from_ymd_opt(year, 1, 1)
}
