//! Link extraction as an injected capability.
//!
//! The crawler does not parse HTML itself; it hands every fetched body to a
//! [`LinkExtractor`] and works with whatever hrefs come back. The default
//! implementation uses a full HTML parser; tests and embedders can substitute
//! anything that honors the contract.

use scraper::{Html, Selector};

/// Extracts raw anchor hrefs from a document body.
///
/// Implementations return href attribute values exactly as written in the
/// document; resolving them against the page URL and filtering unusable ones
/// is the request pipeline's job.
pub trait LinkExtractor: Send + Sync {
    /// Returns every href found on an anchor element, in document order.
    fn extract_anchors(&self, body: &str) -> Vec<String>;
}

/// The default extractor, backed by a full HTML5 parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlAnchorExtractor;

impl LinkExtractor for HtmlAnchorExtractor {
    fn extract_anchors(&self, body: &str) -> Vec<String> {
        let document = Html::parse_document(body);
        let anchors = Selector::parse("a[href]").expect("static selector is valid");
        document
            .select(&anchors)
            .filter_map(|element| element.value().attr("href"))
            .map(str::to_string)
            .collect()
    }
}
