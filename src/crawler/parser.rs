//! HTML parser for extracting links
//!
//! This module turns a fetched [`Document`] into the in-scope URLs it links
//! to. Deciding which links are in scope is left to a [`LinkFilter`].

use crate::crawler::fetcher::Document;
use crate::url::LinkFilter;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts candidate links from a document
pub trait LinkExtractor: Send + Sync {
    /// Returns the distinct links in `document` that survive `filter`, in
    /// the order they first appear
    fn extract_links(&self, filter: &dyn LinkFilter, document: &Document) -> Vec<Url>;
}

/// [`LinkExtractor`] for HTML pages
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">`
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - Anything the filter rejects (other schemes, other sites, bare domains)
///
/// **Note:** `rel="nofollow"` links are followed
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkExtractor;

impl LinkExtractor for HtmlLinkExtractor {
    fn extract_links(&self, filter: &dyn LinkFilter, document: &Document) -> Vec<Url> {
        let html = Html::parse_document(&document.body);
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for href in raw_links(&html) {
            if let Some(url) = filter.filter(href) {
                if seen.insert(url.clone()) {
                    links.push(url);
                }
            }
        }

        links
    }
}

/// All candidate `href` values in document order, anchors before canonical links
fn raw_links(html: &Html) -> Vec<&str> {
    let mut hrefs = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in html.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                hrefs.push(href);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        hrefs.extend(
            html.select(&canonical_selector)
                .filter_map(|element| element.value().attr("href")),
        );
    }

    hrefs
}
