// src/extractor/pattern.rs - regex fallback strategy, always available
use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use super::{page_text, ContactExtractor, ContactSet};
use crate::models::{PageSnapshot, Result};

pub struct PatternExtractor {
    email_regex: Regex,
    phone_regex: Regex,
    anchor_selector: Selector,
}

impl PatternExtractor {
    pub fn new() -> Self {
        Self {
            email_regex: Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
                .unwrap(),
            // international form only: "+" then country code and separators
            phone_regex: Regex::new(r"\+[1-9][0-9]{0,3}[0-9 ()./-]{5,20}[0-9]").unwrap(),
            anchor_selector: Selector::parse("a[href]").unwrap(),
        }
    }

    fn scan_text(&self, text: &str, out: &mut ContactSet) {
        for m in self.email_regex.find_iter(text) {
            out.add_email(m.as_str());
        }
        for m in self.phone_regex.find_iter(text) {
            out.add_phone(m.as_str());
        }
    }

    /// `mailto:` and `tel:` anchors carry contacts that never appear as
    /// visible text.
    fn scan_anchors(&self, html: &str, out: &mut ContactSet) {
        let document = Html::parse_document(html);
        for element in document.select(&self.anchor_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if let Some(payload) = href.strip_prefix("mailto:") {
                out.add_email(strip_query(payload));
            } else if let Some(payload) = href.strip_prefix("tel:") {
                out.add_phone(strip_query(payload));
            }
        }
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_query(payload: &str) -> &str {
    payload.split(['?', '#']).next().unwrap_or(payload)
}

#[async_trait]
impl ContactExtractor for PatternExtractor {
    fn name(&self) -> &'static str {
        "pattern"
    }

    async fn extract(&self, page: &PageSnapshot) -> Result<ContactSet> {
        let mut out = ContactSet::default();
        let text = page_text(&page.html, usize::MAX);
        self.scan_text(&text, &mut out);
        self.scan_anchors(&page.html, &mut out);
        debug!(
            "pattern extractor: {} emails, {} phones on {}",
            out.email_count(),
            out.phone_count(),
            page.url
        );
        Ok(out)
    }
}
