pub mod gemini;
pub mod pattern;

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use regex::Regex;
use scraper::Html;

use crate::models::{PageSnapshot, Result};

pub use gemini::GeminiExtractor;
pub use pattern::PatternExtractor;

/// Accept phones with this many digits; shorter matches are noise, longer
/// ones are usually concatenated numbers.
const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

/// One extraction strategy. The processing loop tries strategies in order
/// and falls back to the next on any error.
#[async_trait]
pub trait ContactExtractor: Send + Sync {
    fn name(&self) -> &'static str;
    async fn extract(&self, page: &PageSnapshot) -> Result<ContactSet>;
}

/// Deduplicated emails and phones, merged across page visits.
/// Iteration order is sorted so saved output is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactSet {
    emails: BTreeSet<String>,
    // digit-string key -> display form, so "+1 (202) 555-0170" and
    // "+1 202 555 0170" collapse into one entry
    phones: BTreeMap<String, String>,
}

impl ContactSet {
    pub fn add_email(&mut self, raw: &str) {
        let email = raw.trim().trim_end_matches('.').to_lowercase();
        if !email.is_empty() && email.contains('@') {
            self.emails.insert(email);
        }
    }

    pub fn add_phone(&mut self, raw: &str) {
        let display = normalize_phone(raw);
        let digits: String = display.chars().filter(|c| c.is_ascii_digit()).collect();
        if (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
            self.phones.entry(digits).or_insert(display);
        }
    }

    pub fn merge(&mut self, other: ContactSet) {
        self.emails.extend(other.emails);
        for (key, display) in other.phones {
            self.phones.entry(key).or_insert(display);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty() && self.phones.is_empty()
    }

    pub fn has_emails(&self) -> bool {
        !self.emails.is_empty()
    }

    pub fn has_phones(&self) -> bool {
        !self.phones.is_empty()
    }

    pub fn emails(&self) -> impl Iterator<Item = &str> {
        self.emails.iter().map(String::as_str)
    }

    pub fn phones(&self) -> impl Iterator<Item = &str> {
        self.phones.values().map(String::as_str)
    }

    pub fn emails_joined(&self) -> String {
        self.emails().collect::<Vec<_>>().join(", ")
    }

    pub fn phones_joined(&self) -> String {
        self.phones().collect::<Vec<_>>().join(", ")
    }

    pub fn email_count(&self) -> usize {
        self.emails.len()
    }

    pub fn phone_count(&self) -> usize {
        self.phones.len()
    }
}

/// Collapse whitespace runs so the same number renders one way everywhere.
fn normalize_phone(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible page text: script/style/noscript stripped, whitespace collapsed,
/// truncated to `limit` characters.
pub fn page_text(html: &str, limit: usize) -> String {
    // The regex crate has no backreferences; one alternation per tag.
    let stripped = Regex::new(r"(?is)<script[^>]*>.*?</script>|<style[^>]*>.*?</style>|<noscript[^>]*>.*?</noscript>")
        .unwrap()
        .replace_all(html, " ");

    let document = Html::parse_document(&stripped);
    let text = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");

    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(limit)
        .collect()
}
