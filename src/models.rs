use url::Url;

use crate::config::Config;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub const NOT_FOUND: &str = "Not found";
pub const ERROR: &str = "Error";
pub const DUPLICATE: &str = "Duplicate";

/// Processing state of one spreadsheet row. Cells store only the sentinel
/// strings; everywhere else the enum is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Pending,
    Found,
    NotFound,
    Error,
    Duplicate,
}

impl RowStatus {
    /// Decode a stored cell value back into a status.
    pub fn from_cell(cell: &str) -> Self {
        match cell.trim() {
            "" => RowStatus::Pending,
            NOT_FOUND => RowStatus::NotFound,
            ERROR => RowStatus::Error,
            DUPLICATE => RowStatus::Duplicate,
            _ => RowStatus::Found,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RowStatus::Pending)
    }
}

/// What the browser saw on one page visit.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub url: Url,
    pub html: String,
}

#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub processed: usize,
    pub found: usize,
    pub not_found: usize,
    pub errors: usize,
    pub duplicates: usize,
}

pub struct App {
    pub config: Config,
}
