// src/sources/mod.rs
pub mod hackernews;
pub mod lawfare;
pub mod moh;
pub mod nicb;
pub mod rnz;
pub mod section7;
pub mod uber;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

use crate::types::SourceExtractor;

/// All registered sources, in serving order. Built once at startup so
/// extractor-held state (the rnz enrichment cache) lives for the process.
pub fn registry() -> Vec<Box<dyn SourceExtractor>> {
    vec![
        Box::new(hackernews::HackerNewsHighlights),
        Box::new(rnz::RnzAuthorArchive::new()),
        Box::new(uber::UberEngineering),
        Box::new(nicb::NicbNewsReleases),
        Box::new(lawfare::TheSituation),
        Box::new(moh::MohNews),
        Box::new(section7::Section7Reports),
    ]
}

/// Reduce an HTML fragment to plain text: decode entities, strip tags,
/// collapse whitespace.
pub fn html_to_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    let stripped = RE_TAGS.replace_all(&decoded, "");

    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
    RE_WS.replace_all(&stripped, " ").trim().to_string()
}

/// Concatenated, trimmed text content of an element.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// None for empty-after-trim strings; extractors use this to enforce the
/// "no placeholder fields" invariant.
pub(crate) fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_to_text_strips_tags_and_entities() {
        let s = "<p>Summary of the <b>January</b>&nbsp;situation&nbsp;report.</p>";
        assert_eq!(html_to_text(s), "Summary of the January situation report.");
    }

    #[test]
    fn html_to_text_collapses_whitespace() {
        assert_eq!(html_to_text("  a \n\t b  "), "a b");
    }

    #[test]
    fn non_empty_rejects_blank() {
        assert_eq!(non_empty("  ".to_string()), None);
        assert_eq!(non_empty(" x ".to_string()), Some("x".to_string()));
    }
}
