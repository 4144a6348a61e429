// src/pipeline.rs - sequential row loop: navigate, score, extract, persist
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::browser::{ensure_scheme, Browser};
use crate::config::Config;
use crate::extractor::{ContactExtractor, ContactSet};
use crate::models::{PageSnapshot, RunStats, DUPLICATE, ERROR, NOT_FOUND};
use crate::scorer;
use crate::sheet::Sheet;

/// Terminal outcome of one row, carrying the extracted contacts when found.
#[derive(Debug)]
pub enum RowOutcome {
    Found(ContactSet),
    NotFound,
    Error,
    Duplicate,
}

pub struct Pipeline<B: Browser> {
    browser: B,
    extractors: Vec<Box<dyn ContactExtractor>>,
    config: Config,
    seen_urls: HashSet<String>,
}

impl<B: Browser> Pipeline<B> {
    pub fn new(browser: B, extractors: Vec<Box<dyn ContactExtractor>>, config: Config) -> Self {
        Self {
            browser,
            extractors,
            config,
            seen_urls: HashSet::new(),
        }
    }

    /// Process up to `limit` pending rows, saving the whole sheet after each
    /// one. The browser session is closed on every exit path.
    pub async fn run(mut self, sheet: &mut Sheet, out_path: &Path, limit: usize) -> RunStats {
        let rows = sheet.pending_rows(limit);
        info!("🔍 Found {} rows to process", rows.len());

        let mut stats = RunStats::default();
        let mut save_pending = false;

        for (i, (idx, url)) in rows.iter().enumerate() {
            info!("📈 Progress: {}/{}: {}", i + 1, rows.len(), url);

            let outcome = self.process_row(url).await;
            self.record(sheet, *idx, &outcome, &mut stats);

            match sheet.save(out_path) {
                Ok(()) => {
                    if save_pending {
                        info!("💾 Recovered previously failed save");
                    }
                    save_pending = false;
                    debug!("Progress saved to {}", out_path.display());
                }
                Err(e) => {
                    // Data stays in memory; the next row's save retries.
                    warn!("Failed to save {}: {} (will retry)", out_path.display(), e);
                    save_pending = true;
                }
            }

            if i + 1 < rows.len() {
                tokio::time::sleep(Duration::from_millis(
                    self.config.scraping.inter_row_delay_ms,
                ))
                .await;
            }
        }

        if save_pending {
            if let Err(e) = sheet.save(out_path) {
                error!("Final save failed: {}", e);
            }
        }

        self.browser.close().await;
        stats
    }

    fn record(&self, sheet: &mut Sheet, idx: usize, outcome: &RowOutcome, stats: &mut RunStats) {
        stats.processed += 1;
        match outcome {
            RowOutcome::Found(contacts) => {
                stats.found += 1;
                let email_cell = if contacts.has_emails() {
                    info!("✅ Found emails: {}", contacts.emails_joined());
                    contacts.emails_joined()
                } else {
                    NOT_FOUND.to_string()
                };
                let phone_cell = if contacts.has_phones() {
                    info!("✅ Found phones: {}", contacts.phones_joined());
                    contacts.phones_joined()
                } else {
                    NOT_FOUND.to_string()
                };
                sheet.set_result(idx, email_cell, phone_cell);
            }
            RowOutcome::NotFound => {
                stats.not_found += 1;
                info!("❌ No contacts found");
                sheet.set_result(idx, NOT_FOUND.to_string(), NOT_FOUND.to_string());
            }
            RowOutcome::Error => {
                stats.errors += 1;
                sheet.set_result(idx, ERROR.to_string(), ERROR.to_string());
            }
            RowOutcome::Duplicate => {
                stats.duplicates += 1;
                info!("⏭️  Duplicate URL, skipping");
                sheet.set_result(idx, DUPLICATE.to_string(), DUPLICATE.to_string());
            }
        }
    }

    async fn process_row(&mut self, raw_url: &str) -> RowOutcome {
        let url = ensure_scheme(raw_url);
        let dedupe_key = url.trim_end_matches('/').to_lowercase();
        if !self.seen_urls.insert(dedupe_key) {
            return RowOutcome::Duplicate;
        }

        // Homepage visit; navigation failure ends the row, no retry.
        if let Err(e) = self.browser.open(&url).await {
            error!("❌ Navigation failed for {}: {}", url, e);
            return RowOutcome::Error;
        }
        self.browser.dismiss_cookie_banner().await;
        self.browser.scroll_to_bottom().await;

        let page = match self.browser.snapshot().await {
            Ok(page) => page,
            Err(e) => {
                error!("❌ Could not read page source for {}: {}", url, e);
                return RowOutcome::Error;
            }
        };

        let mut contacts = self.extract_page(&page).await;

        let keywords = &self.config.scraping.contact_keywords;
        if let Some(link) = scorer::best_contact_link(&page.html, &page.url, keywords) {
            info!("➡️  Following contact link: {}", link);
            match self.browser.open(link.as_str()).await {
                Ok(()) => {
                    self.browser.scroll_to_bottom().await;
                    match self.browser.snapshot().await {
                        // Homepage and contact-page results are unioned.
                        Ok(contact_page) => contacts.merge(self.extract_page(&contact_page).await),
                        Err(e) => warn!("Could not read contact page {}: {}", link, e),
                    }
                }
                // Homepage results survive a dead contact link.
                Err(e) => warn!("Could not open contact page {}: {}", link, e),
            }
        }

        if contacts.is_empty() {
            RowOutcome::NotFound
        } else {
            RowOutcome::Found(contacts)
        }
    }

    /// First strategy that succeeds wins; errors fall through to the next.
    async fn extract_page(&self, page: &PageSnapshot) -> ContactSet {
        for extractor in &self.extractors {
            match extractor.extract(page).await {
                Ok(set) => {
                    debug!(
                        "{} extractor: {} emails, {} phones",
                        extractor.name(),
                        set.email_count(),
                        set.phone_count()
                    );
                    return set;
                }
                Err(e) => warn!("{} extractor failed on {}: {}", extractor.name(), page.url, e),
            }
        }
        ContactSet::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::PatternExtractor;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use url::Url;

    /// Serves canned HTML for known URLs, errors for everything else.
    struct CannedBrowser {
        pages: HashMap<String, String>,
        current: Option<String>,
    }

    impl CannedBrowser {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(u, h)| (u.to_string(), h.to_string()))
                    .collect(),
                current: None,
            }
        }
    }

    #[async_trait]
    impl Browser for CannedBrowser {
        async fn open(&mut self, url: &str) -> crate::models::Result<()> {
            if self.pages.contains_key(url) {
                self.current = Some(url.to_string());
                Ok(())
            } else {
                Err(format!("net::ERR_NAME_NOT_RESOLVED for {}", url).into())
            }
        }

        async fn dismiss_cookie_banner(&mut self) -> bool {
            false
        }

        async fn scroll_to_bottom(&mut self) {}

        async fn snapshot(&mut self) -> crate::models::Result<PageSnapshot> {
            let url = self.current.as_deref().ok_or("no page loaded")?;
            Ok(PageSnapshot {
                url: Url::parse(url)?,
                html: self.pages[url].clone(),
            })
        }

        async fn close(self) {}
    }

    struct FailingExtractor;

    #[async_trait]
    impl ContactExtractor for FailingExtractor {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn extract(&self, _page: &PageSnapshot) -> crate::models::Result<ContactSet> {
            Err("simulated API outage".into())
        }
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.scraping.inter_row_delay_ms = 0;
        config
    }

    fn pattern_only() -> Vec<Box<dyn ContactExtractor>> {
        vec![Box::new(PatternExtractor::new())]
    }

    fn test_sheet(csv: &str) -> Sheet {
        Sheet::from_reader(csv.as_bytes(), "Email", "Phone number").unwrap()
    }

    fn temp_output(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("contact_scraper_{}_{}.csv", tag, std::process::id()))
    }

    #[tokio::test]
    async fn homepage_and_contact_page_results_are_merged() {
        let browser = CannedBrowser::new(&[
            (
                "https://one.com",
                r#"<p>office@one.com</p><a href="/contact">Contact</a>"#,
            ),
            ("https://one.com/contact", "<p>+1 202 555 0170</p>"),
        ]);
        let mut pipeline = Pipeline::new(browser, pattern_only(), test_config());

        match pipeline.process_row("one.com").await {
            RowOutcome::Found(contacts) => {
                assert_eq!(contacts.emails_joined(), "office@one.com");
                assert_eq!(contacts.phones_joined(), "+1 202 555 0170");
            }
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unreachable_site_is_an_error_not_a_crash() {
        let browser = CannedBrowser::new(&[]);
        let mut pipeline = Pipeline::new(browser, pattern_only(), test_config());
        assert!(matches!(
            pipeline.process_row("down.example").await,
            RowOutcome::Error
        ));
    }

    #[tokio::test]
    async fn dead_contact_link_keeps_homepage_results() {
        let browser = CannedBrowser::new(&[(
            "https://one.com",
            r#"<p>office@one.com</p><a href="/contact">Contact</a>"#,
        )]);
        let mut pipeline = Pipeline::new(browser, pattern_only(), test_config());

        match pipeline.process_row("one.com").await {
            RowOutcome::Found(contacts) => {
                assert_eq!(contacts.emails_joined(), "office@one.com")
            }
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn repeated_url_is_a_duplicate() {
        let browser = CannedBrowser::new(&[("https://one.com", "<p>office@one.com</p>")]);
        let mut pipeline = Pipeline::new(browser, pattern_only(), test_config());

        assert!(matches!(
            pipeline.process_row("one.com").await,
            RowOutcome::Found(_)
        ));
        assert!(matches!(
            pipeline.process_row("https://ONE.com/").await,
            RowOutcome::Duplicate
        ));
    }

    #[tokio::test]
    async fn failed_extractor_falls_back_to_pattern() {
        let browser = CannedBrowser::new(&[("https://one.com", "<p>office@one.com</p>")]);
        let extractors: Vec<Box<dyn ContactExtractor>> = vec![
            Box::new(FailingExtractor),
            Box::new(PatternExtractor::new()),
        ];
        let mut pipeline = Pipeline::new(browser, extractors, test_config());

        match pipeline.process_row("one.com").await {
            RowOutcome::Found(contacts) => {
                assert_eq!(contacts.emails_joined(), "office@one.com")
            }
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn three_row_run_isolates_the_failing_row() {
        let browser = CannedBrowser::new(&[
            ("https://one.com", "<p>office@one.com</p>"),
            ("https://three.com", "<p>Nothing to see here</p>"),
        ]);
        let mut sheet = test_sheet("Site\none.com\ntwo.com\nthree.com\n");
        let out = temp_output("three_rows");

        let pipeline = Pipeline::new(browser, pattern_only(), test_config());
        let stats = pipeline.run(&mut sheet, &out, 10).await;

        assert_eq!(stats.processed, 3);
        assert_eq!(stats.found, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.not_found, 1);

        let saved = test_sheet(&std::fs::read_to_string(&out).unwrap());
        assert_eq!(saved.len(), 3);
        assert_eq!(saved.pending_count(), 0);
        std::fs::remove_file(&out).ok();
    }

    #[tokio::test]
    async fn resumed_run_never_touches_terminal_rows() {
        let mut sheet = test_sheet(
            "Site,Email,Phone number\n\
             one.com,kept@one.com,Not found\n\
             two.com,Error,Error\n",
        );
        let out = temp_output("resume");

        let pipeline = Pipeline::new(CannedBrowser::new(&[]), pattern_only(), test_config());
        let stats = pipeline.run(&mut sheet, &out, 10).await;

        assert_eq!(stats.processed, 0);
        let mut first = Vec::new();
        sheet.write_to(&mut first).unwrap();

        // Second pass over the same terminal sheet changes nothing.
        let pipeline = Pipeline::new(CannedBrowser::new(&[]), pattern_only(), test_config());
        pipeline.run(&mut sheet, &out, 10).await;
        let mut second = Vec::new();
        sheet.write_to(&mut second).unwrap();
        assert_eq!(first, second);
        std::fs::remove_file(&out).ok();
    }
}
