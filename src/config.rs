use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub sheet: SheetConfig,
    pub browser: BrowserConfig,
    pub scraping: ScrapingConfig,
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SheetConfig {
    pub input_file: String,
    /// Appended to the input file stem to form the output filename.
    pub output_suffix: String,
    pub email_column: String,
    pub phone_column: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub page_load_timeout_secs: u64,
    pub implicit_wait_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScrapingConfig {
    pub inter_row_delay_ms: u64,
    /// Anchor text / URL path keywords that mark a likely contact page.
    pub contact_keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeminiConfig {
    pub model: String,
    pub max_prompt_chars: usize,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sheet: SheetConfig {
                input_file: "leads.csv".to_string(),
                output_suffix: "_contacts".to_string(),
                email_column: "Email".to_string(),
                phone_column: "Phone number".to_string(),
            },
            browser: BrowserConfig {
                webdriver_url: "http://localhost:9515".to_string(),
                page_load_timeout_secs: 30,
                implicit_wait_secs: 5,
            },
            scraping: ScrapingConfig {
                inter_row_delay_ms: 3000,
                contact_keywords: [
                    "contact",
                    "kontakt",
                    "kontaktai",
                    "contacto",
                    "contatti",
                    "contato",
                    "impressum",
                    "about",
                    "uber-uns",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            },
            gemini: GeminiConfig {
                model: "gemini-2.5-flash".to_string(),
                max_prompt_chars: 8000,
                request_timeout_secs: 30,
            },
        }
    }
}

pub async fn load_config(
    path: &str,
) -> std::result::Result<Config, Box<dyn std::error::Error + Send + Sync>> {
    let content = tokio::fs::read_to_string(path).await?;
    let config: Config = serde_yaml::from_str(&content)?;
    Ok(config)
}
