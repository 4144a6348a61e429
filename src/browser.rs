// src/browser.rs - WebDriver session handling behind a testable seam
use std::time::Duration;

use async_trait::async_trait;
use fantoccini::wd::{Capabilities, TimeoutConfiguration};
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::BrowserConfig;
use crate::models::{PageSnapshot, Result};

/// Accept buttons tried in order when a consent dialog covers the page.
const COOKIE_BUTTONS: &[Locator<'static>] = &[
    Locator::Css("#accept-cookies"),
    Locator::Css(".cookie-accept"),
    Locator::Css("button[id*='accept'], button[class*='accept']"),
    Locator::XPath("//button[contains(translate(., 'ACCEPT', 'accept'), 'accept')]"),
    Locator::XPath("//button[contains(translate(., 'AGREE', 'agree'), 'agree')]"),
    Locator::XPath("//a[contains(translate(., 'ACCEPT', 'accept'), 'accept')]"),
];

/// The page-level operations the processing loop needs. Production drives a
/// real WebDriver endpoint; tests substitute a canned implementation.
#[async_trait]
pub trait Browser: Send {
    async fn open(&mut self, url: &str) -> Result<()>;
    async fn dismiss_cookie_banner(&mut self) -> bool;
    async fn scroll_to_bottom(&mut self);
    async fn snapshot(&mut self) -> Result<PageSnapshot>;
    async fn close(self);
}

pub struct WebDriverBrowser {
    client: Client,
}

impl WebDriverBrowser {
    pub async fn connect(config: &BrowserConfig) -> Result<Self> {
        let mut caps = Capabilities::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": [
                    "--headless=new",
                    "--disable-gpu",
                    "--no-sandbox",
                    "--disable-dev-shm-usage",
                    "--window-size=1400,1000",
                ]
            }),
        );

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&config.webdriver_url)
            .await
            .map_err(|e| format!("cannot reach WebDriver at {}: {}", config.webdriver_url, e))?;

        client
            .update_timeouts(TimeoutConfiguration::new(
                None,
                Some(Duration::from_secs(config.page_load_timeout_secs)),
                Some(Duration::from_secs(config.implicit_wait_secs)),
            ))
            .await?;

        info!("🌐 Browser session established ({})", config.webdriver_url);
        Ok(Self { client })
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn open(&mut self, url: &str) -> Result<()> {
        self.client.goto(url).await?;
        // Let late JS (menus, footers) settle before reading anything.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        Ok(())
    }

    async fn dismiss_cookie_banner(&mut self) -> bool {
        for locator in COOKIE_BUTTONS {
            if let Ok(button) = self.client.find(*locator).await {
                if button.click().await.is_ok() {
                    debug!("Dismissed cookie consent dialog");
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    return true;
                }
            }
        }
        false
    }

    async fn scroll_to_bottom(&mut self) {
        let script = "window.scrollTo(0, document.body.scrollHeight);";
        if let Err(e) = self.client.execute(script, vec![]).await {
            debug!("Scroll failed: {}", e);
        }
        tokio::time::sleep(Duration::from_millis(400)).await;
    }

    async fn snapshot(&mut self) -> Result<PageSnapshot> {
        let url = self.client.current_url().await?;
        let html = self.client.source().await?;
        Ok(PageSnapshot { url, html })
    }

    async fn close(self) {
        match self.client.close().await {
            Ok(()) => info!("🌐 Browser closed"),
            Err(e) => warn!("Browser session did not close cleanly: {}", e),
        }
    }
}

/// Spreadsheets routinely hold bare domains like `acme.lt`.
pub fn ensure_scheme(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}
