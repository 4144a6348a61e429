// src/extractor/gemini.rs - AI-assisted strategy over the Gemini REST API
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::{page_text, ContactExtractor, ContactSet};
use crate::config::GeminiConfig;
use crate::models::{PageSnapshot, Result};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// The model occasionally invents extra entries; keep only the first few.
const MAX_RESULTS_PER_KIND: usize = 5;

pub struct GeminiExtractor {
    client: Client,
    api_key: String,
    model: String,
    max_prompt_chars: usize,
}

impl GeminiExtractor {
    /// `None` when no usable `GEMINI_API_KEY` is present; the caller then
    /// runs pattern extraction only.
    pub fn from_env(config: &GeminiConfig) -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok()?;
        let api_key = api_key.trim().to_string();
        if api_key.is_empty() {
            return None;
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .ok()?;
        info!("🤖 Gemini extractor enabled (model: {})", config.model);
        Some(Self {
            client,
            api_key,
            model: config.model.clone(),
            max_prompt_chars: config.max_prompt_chars,
        })
    }

    fn prompt(&self, url: &str, text: &str) -> String {
        format!(
            "You are an expert at extracting contact information from website content.\n\n\
             Website URL: {url}\n\n\
             Website Content:\n{text}\n\n\
             Task: Extract ALL email addresses and phone numbers from this content.\n\n\
             Requirements:\n\
             1. Extract ONLY valid email addresses (format: user@domain.com)\n\
             2. Extract ONLY valid phone numbers (international format preferred, e.g., +370 123 45678)\n\
             3. Return results in JSON format ONLY\n\
             4. Do not include any explanations, just the JSON\n\n\
             Expected JSON format:\n\
             {{\"emails\": [\"email1@example.com\"], \"phones\": [\"+370 123 45678\"]}}\n\n\
             If no emails or phones found, return empty arrays."
        )
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ReplyContacts {
    #[serde(default)]
    emails: Vec<String>,
    #[serde(default)]
    phones: Vec<String>,
}

/// Models wrap JSON in markdown fences despite instructions not to.
fn strip_code_fences(reply: &str) -> &str {
    let reply = reply.trim();
    let Some(start) = reply.find("```") else {
        return reply;
    };
    let body = &reply[start + 3..];
    let body = body.strip_prefix("json").unwrap_or(body);
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

fn parse_reply(reply: &str) -> Result<ContactSet> {
    let contacts: ReplyContacts = serde_json::from_str(strip_code_fences(reply))
        .map_err(|e| format!("unparseable Gemini reply: {}", e))?;
    let mut set = ContactSet::default();
    for email in contacts.emails.iter().take(MAX_RESULTS_PER_KIND) {
        set.add_email(email);
    }
    for phone in contacts.phones.iter().take(MAX_RESULTS_PER_KIND) {
        set.add_phone(phone);
    }
    Ok(set)
}

#[async_trait]
impl ContactExtractor for GeminiExtractor {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn extract(&self, page: &PageSnapshot) -> Result<ContactSet> {
        let text = page_text(&page.html, self.max_prompt_chars);
        let body = json!({
            "contents": [{ "parts": [{ "text": self.prompt(page.url.as_str(), &text) }] }]
        });
        let endpoint = format!(
            "{}/{}:generateContent?key={}",
            API_BASE, self.model, self.api_key
        );

        let response = self.client.post(&endpoint).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(format!("Gemini API error: HTTP {}", response.status()).into());
        }

        let parsed: GenerateResponse = response.json().await?;
        let reply = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or("empty Gemini response")?;

        let set = parse_reply(reply)?;
        debug!(
            "gemini extractor: {} emails, {} phones on {}",
            set.email_count(),
            set.phone_count(),
            page.url
        );
        Ok(set)
    }
}
