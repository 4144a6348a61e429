use std::path::Path;

use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use tracing::info;

use crate::browser::WebDriverBrowser;
use crate::extractor::{ContactExtractor, GeminiExtractor, PatternExtractor};
use crate::models::{App, Result};
use crate::pipeline::Pipeline;
use crate::sheet::Sheet;

impl App {
    pub async fn run(&self) -> Result<()> {
        println!("\n════════════════════════════════════════════════════");
        println!("           COMPANY CONTACT SCRAPER");
        println!("════════════════════════════════════════════════════");

        let input = Path::new(&self.config.sheet.input_file);
        let out_path = Sheet::output_path(input, &self.config.sheet.output_suffix);

        // Resume from previous output when it exists; terminal rows in it
        // are skipped, so interrupted runs pick up where they left off.
        let load_path = if out_path.exists() {
            info!("📂 Resuming from existing output {}", out_path.display());
            out_path.as_path()
        } else {
            input
        };

        let mut sheet = Sheet::load(
            load_path,
            &self.config.sheet.email_column,
            &self.config.sheet.phone_column,
        )?;
        info!("✅ Loaded {} rows", sheet.len());
        self.show_progress(&sheet);

        let pending = sheet.pending_count();
        if pending == 0 {
            println!("\n🎉 All rows already have contact information!");
            return Ok(());
        }

        let count: usize = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("👉 How many websites would you like to process?")
            .default(pending.min(10))
            .interact_text()?;
        if count == 0 {
            println!("❌ Nothing to do");
            return Ok(());
        }

        if !Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Process up to {} of {} pending rows?",
                count.min(pending),
                pending
            ))
            .default(true)
            .interact()?
        {
            println!("❌ Scrape cancelled");
            return Ok(());
        }

        if out_path.exists() {
            let backup = Sheet::output_path(&out_path, "_backup");
            std::fs::copy(&out_path, &backup)?;
            info!("💾 Created backup {}", backup.display());
        }

        let mut extractors: Vec<Box<dyn ContactExtractor>> = Vec::new();
        match GeminiExtractor::from_env(&self.config.gemini) {
            Some(gemini) => extractors.push(Box::new(gemini)),
            None => info!("GEMINI_API_KEY not set, using pattern extraction only"),
        }
        extractors.push(Box::new(PatternExtractor::new()));

        let browser = WebDriverBrowser::connect(&self.config.browser).await?;
        let pipeline = Pipeline::new(browser, extractors, self.config.clone());

        let started = std::time::Instant::now();
        let stats = pipeline.run(&mut sheet, &out_path, count).await;

        println!("\n════════════════════════════════════════════════════");
        println!("                     SUMMARY");
        println!("════════════════════════════════════════════════════");
        println!("✅ Processed: {} websites", stats.processed);
        println!("📧 With contacts: {}", stats.found);
        println!("🔍 Without contacts: {}", stats.not_found);
        println!("❌ Errors: {}", stats.errors);
        if stats.duplicates > 0 {
            println!("⏭️  Duplicates: {}", stats.duplicates);
        }
        println!("⏱️  Elapsed: {:.1}s", started.elapsed().as_secs_f64());
        println!(
            "💾 Data saved to: {} (finished {})",
            out_path.display(),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        println!("📋 Check scraper.log for detailed logs");

        self.show_progress(&sheet);
        Ok(())
    }

    fn show_progress(&self, sheet: &Sheet) {
        let stats = sheet.stats();
        println!("\n📊 Current Progress:");
        println!("   • Total rows: {}", stats.total);
        println!("   • Emails found: {}", stats.emails_found);
        println!("   • Phones found: {}", stats.phones_found);
        println!("   • Completion: {:.1}%", stats.completion_pct());
    }
}
