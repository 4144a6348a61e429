// src/sheet.rs - CSV load/save with URL column detection and resume support
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::models::{Result, RowStatus};

/// Substrings that mark a cell value as a website URL.
const WEBSITE_MARKERS: &[&str] = &[
    ".com", ".net", ".org", ".io", ".co", ".eu", ".lt", ".de", ".fr", ".uk", "http", "www.",
];

pub struct Sheet {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    url_col: usize,
    email_col: usize,
    phone_col: usize,
}

impl Sheet {
    pub fn load(path: &Path, email_column: &str, phone_column: &str) -> Result<Self> {
        info!("📖 Reading spreadsheet {}", path.display());
        let file = std::fs::File::open(path)
            .map_err(|e| format!("cannot open '{}': {}", path.display(), e))?;
        Self::from_reader(file, email_column, phone_column)
    }

    pub fn from_reader<R: Read>(reader: R, email_column: &str, phone_column: &str) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        let url_col = detect_url_column(&headers, &rows)
            .ok_or("could not detect a URL column in the spreadsheet")?;
        info!("🔍 Using column '{}' for website URLs", headers[url_col]);

        let mut sheet = Self {
            headers,
            rows,
            url_col,
            email_col: 0,
            phone_col: 0,
        };
        sheet.email_col = sheet.ensure_column(email_column);
        sheet.phone_col = sheet.ensure_column(phone_column);

        // Pivot-table exports carry header/total rows with no URL; drop them.
        let before = sheet.rows.len();
        let url_col = sheet.url_col;
        sheet.rows.retain(|row| looks_like_website(&row[url_col]));
        if sheet.rows.len() < before {
            info!(
                "🧹 Cleaned data: {} → {} rows",
                before,
                sheet.rows.len()
            );
        }

        Ok(sheet)
    }

    /// Column index for `name`, appending an empty column when missing.
    fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(i) = self.headers.iter().position(|h| h == name) {
            return i;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn url(&self, idx: usize) -> &str {
        self.rows[idx][self.url_col].trim()
    }

    /// A row is pending only while both result cells are empty; any value or
    /// sentinel is terminal and must survive a resumed run untouched.
    fn is_pending(&self, row: &[String]) -> bool {
        RowStatus::from_cell(&row[self.email_col]) == RowStatus::Pending
            && RowStatus::from_cell(&row[self.phone_col]) == RowStatus::Pending
    }

    pub fn pending_rows(&self, limit: usize) -> Vec<(usize, String)> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| self.is_pending(row) && !row[self.url_col].trim().is_empty())
            .map(|(i, row)| (i, row[self.url_col].trim().to_string()))
            .take(limit)
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending_rows(usize::MAX).len()
    }

    pub fn set_result(&mut self, idx: usize, email_cell: String, phone_cell: String) {
        self.rows[idx][self.email_col] = email_cell;
        self.rows[idx][self.phone_col] = phone_cell;
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_to(file)
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn stats(&self) -> SheetStats {
        let mut stats = SheetStats {
            total: self.rows.len(),
            ..Default::default()
        };
        for row in &self.rows {
            let email = RowStatus::from_cell(&row[self.email_col]);
            let phone = RowStatus::from_cell(&row[self.phone_col]);
            if email == RowStatus::Found {
                stats.emails_found += 1;
            }
            if phone == RowStatus::Found {
                stats.phones_found += 1;
            }
            if email.is_terminal() || phone.is_terminal() {
                stats.terminal += 1;
            }
        }
        stats
    }

    /// `leads.csv` + `_contacts` → `leads_contacts.csv`, same directory.
    pub fn output_path(input: &Path, suffix: &str) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());
        input.with_file_name(format!("{}{}.csv", stem, suffix))
    }
}

#[derive(Debug, Default)]
pub struct SheetStats {
    pub total: usize,
    pub emails_found: usize,
    pub phones_found: usize,
    pub terminal: usize,
}

impl SheetStats {
    pub fn completion_pct(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.terminal as f64 / self.total as f64 * 100.0
    }
}

fn detect_url_column(headers: &[String], rows: &[Vec<String>]) -> Option<usize> {
    for col in 0..headers.len() {
        let sample = rows
            .iter()
            .map(|r| r[col].trim())
            .filter(|v| !v.is_empty())
            .take(5);
        for value in sample {
            if looks_like_website(value) {
                return Some(col);
            }
        }
    }
    // Content detection failed; fall back on header names.
    headers.iter().position(|h| {
        let h = h.to_lowercase();
        h.contains("url") || h.contains("website") || h.contains("link")
    })
}

fn looks_like_website(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    if value.is_empty() || value.contains('@') {
        return false;
    }
    WEBSITE_MARKERS.iter().any(|m| value.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(csv: &str) -> Sheet {
        Sheet::from_reader(csv.as_bytes(), "Email", "Phone number").unwrap()
    }

    #[test]
    fn detects_url_column_by_content() {
        let s = sheet("Name,Site\nAcme,acme.com\nGlobex,www.globex.lt\n");
        assert_eq!(s.url(0), "acme.com");
        assert_eq!(s.url(1), "www.globex.lt");
    }

    #[test]
    fn email_cells_do_not_count_as_urls() {
        let s = sheet("Contact,Website\ninfo@acme.com,https://acme.com\n");
        assert_eq!(s.url(0), "https://acme.com");
    }

    #[test]
    fn missing_url_column_is_an_error() {
        let res = Sheet::from_reader("Name,Age\nBob,41\n".as_bytes(), "Email", "Phone number");
        assert!(res.is_err());
    }

    #[test]
    fn result_columns_are_appended_when_absent() {
        let mut s = sheet("Site\nacme.com\n");
        s.set_result(0, "a@acme.com".into(), "Not found".into());
        let mut out = Vec::new();
        s.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Site,Email,Phone number\n"));
        assert!(text.contains("acme.com,a@acme.com,Not found"));
    }

    #[test]
    fn non_website_rows_are_dropped() {
        let s = sheet("Site\nRow Labels\nacme.com\nGrand Total\n");
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn pending_skips_terminal_rows() {
        let s = sheet(
            "Site,Email,Phone number\n\
             one.com,a@one.com,\n\
             two.com,Not found,Not found\n\
             three.com,Error,Error\n\
             four.com,,\n",
        );
        let pending = s.pending_rows(10);
        assert_eq!(pending, vec![(3, "four.com".to_string())]);
    }

    #[test]
    fn pending_respects_limit() {
        let s = sheet("Site\na.com\nb.com\nc.com\n");
        assert_eq!(s.pending_rows(2).len(), 2);
        assert_eq!(s.pending_count(), 3);
    }

    #[test]
    fn stats_count_real_values_not_sentinels() {
        let s = sheet(
            "Site,Email,Phone number\n\
             one.com,a@one.com,+1 555 0100\n\
             two.com,Not found,Not found\n\
             three.com,,\n",
        );
        let stats = s.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.emails_found, 1);
        assert_eq!(stats.phones_found, 1);
        assert_eq!(stats.terminal, 2);
    }

    #[test]
    fn output_path_derives_from_stem() {
        let out = Sheet::output_path(Path::new("data/leads.csv"), "_contacts");
        assert_eq!(out, PathBuf::from("data/leads_contacts.csv"));
    }

    #[test]
    fn saved_output_is_stable_for_terminal_sheets() {
        let s = sheet("Site,Email,Phone number\none.com,a@one.com,Not found\n");
        let mut first = Vec::new();
        let mut second = Vec::new();
        s.write_to(&mut first).unwrap();
        s.write_to(&mut second).unwrap();
        assert_eq!(first, second);
    }
}
