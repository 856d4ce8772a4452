pub mod layout;
pub mod memory;
pub mod reader;
pub mod sheets_client;

pub use layout::{Column, ColumnMap};
pub use memory::{MemoryTableStore, StoreOp};
pub use reader::{read_tracked_table, TableRead};
pub use sheets_client::SheetsClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::StoreError;
use layout::column_letter;

/// A block of rows addressed by 1-based physical row numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub start_row: usize,
    /// Inclusive. `None` runs to the end of the sheet.
    pub end_row: Option<usize>,
    /// Number of columns from column A. `None` spans every column.
    pub width: Option<usize>,
}

impl CellRange {
    /// Rows `start..=end`, columns `A..` for `width` columns.
    pub fn rows(start_row: usize, end_row: usize, width: usize) -> Self {
        Self {
            start_row,
            end_row: Some(end_row),
            width: Some(width),
        }
    }

    pub fn row(row: usize, width: usize) -> Self {
        Self::rows(row, row, width)
    }

    pub fn whole_sheet() -> Self {
        Self {
            start_row: 1,
            end_row: None,
            width: None,
        }
    }

    pub fn row_count(&self) -> Option<usize> {
        self.end_row
            .map(|end| end.saturating_sub(self.start_row) + 1)
    }

    /// A1 notation, e.g. `'Sheet1'!A10:I59`.
    pub fn to_a1(&self, sheet: &str) -> String {
        let sheet = format!("'{}'", sheet.replace('\'', "''"));
        let end = self.end_row.map(|e| e.to_string()).unwrap_or_default();

        match (self.width, self.start_row, self.end_row) {
            (None, 1, None) => sheet,
            (None, start, _) => format!("{sheet}!{start}:{end}"),
            (Some(width), start, _) => {
                let last = column_letter(width.saturating_sub(1));
                format!("{sheet}!A{start}:{last}{end}")
            }
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end_row {
            Some(end) => write!(f, "rows {}-{}", self.start_row, end),
            None => write!(f, "rows {}-", self.start_row),
        }
    }
}

/// Visual treatment applied to whole rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowStyle {
    /// Bold on light grey, for the header row.
    Header,
    /// Greyed and struck through, for sold or removed listings.
    Removed,
    /// Default look, for a removed listing that came back.
    Normal,
}

impl RowStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowStyle::Header => "header",
            RowStyle::Removed => "removed",
            RowStyle::Normal => "normal",
        }
    }
}

impl fmt::Display for RowStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mutable ordered table of rows with batch range primitives.
///
/// Implementations are assumed single-writer; callers serialise runs.
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn read_range(&self, range: CellRange) -> Result<Vec<Vec<String>>, StoreError>;

    async fn write_range(&self, range: CellRange, rows: &[Vec<String>]) -> Result<(), StoreError>;

    /// Add rows after the last non-empty row.
    async fn append_rows(&self, rows: &[Vec<String>]) -> Result<(), StoreError>;

    async fn format_range(&self, range: CellRange, style: RowStyle) -> Result<(), StoreError>;
}
