use serde::{Deserialize, Serialize};
use std::fmt;

/// The columns the tracker recognises, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    ItemId,
    Url,
    Title,
    CurrentPrice,
    NewPrice,
    FloorPrice,
    PriceChangePercent,
    Status,
    LastUpdated,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::ItemId,
        Column::Url,
        Column::Title,
        Column::CurrentPrice,
        Column::NewPrice,
        Column::FloorPrice,
        Column::PriceChangePercent,
        Column::Status,
        Column::LastUpdated,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Column::ItemId => "Item ID",
            Column::Url => "URL",
            Column::Title => "Title",
            Column::CurrentPrice => "Current Price",
            Column::NewPrice => "New Price",
            Column::FloorPrice => "Floor Price",
            Column::PriceChangePercent => "Price Change %",
            Column::Status => "Status",
            Column::LastUpdated => "Last Updated",
        }
    }

    /// Match a header cell. Case and surrounding whitespace are ignored, as is
    /// a trailing unit in parentheses (`Current Price (€)`).
    pub fn from_header(cell: &str) -> Option<Self> {
        let wanted = normalize_header(cell);
        if wanted.is_empty() {
            return None;
        }
        Column::ALL
            .into_iter()
            .find(|c| normalize_header(c.label()) == wanted)
    }

    fn position(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn normalize_header(cell: &str) -> String {
    let mut s = cell.trim();
    if s.ends_with(')') {
        if let Some(open) = s.rfind('(') {
            s = s[..open].trim_end();
        }
    }
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Where each recognised column lives in a physical row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    positions: [Option<usize>; 9],
    width: usize,
}

impl ColumnMap {
    /// Layout of a table written by this tracker.
    pub fn canonical() -> Self {
        let mut positions = [None; 9];
        for (i, col) in Column::ALL.into_iter().enumerate() {
            positions[col.position()] = Some(i);
        }
        Self {
            positions,
            width: Column::ALL.len(),
        }
    }

    /// Build the map from a header row. Returns `None` if the row has no id
    /// column. When a label repeats, the leftmost occurrence wins.
    pub fn from_header(cells: &[String]) -> Option<Self> {
        let mut positions = [None; 9];
        for (i, cell) in cells.iter().enumerate() {
            if let Some(col) = Column::from_header(cell) {
                positions[col.position()].get_or_insert(i);
            }
        }
        positions[Column::ItemId.position()]?;

        let mapped_width = positions.iter().flatten().max().map_or(0, |m| m + 1);
        let trimmed_width = cells
            .iter()
            .rposition(|c| !c.trim().is_empty())
            .map_or(0, |p| p + 1);

        Some(Self {
            positions,
            width: mapped_width.max(trimmed_width),
        })
    }

    pub fn index(&self, col: Column) -> Option<usize> {
        self.positions[col.position()]
    }

    pub fn has(&self, col: Column) -> bool {
        self.index(col).is_some()
    }

    /// Number of cells a full row spans.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Raw cell for `col`, `None` when the column is missing or the row is short.
    pub fn cell<'a>(&self, row: &'a [String], col: Column) -> Option<&'a str> {
        self.index(col)
            .and_then(|i| row.get(i))
            .map(String::as_str)
    }

    /// Lay out `values` over `base`, padding to the table width. Cells of
    /// columns not mentioned in `values` keep their `base` content.
    pub fn render(&self, base: &[String], values: &[(Column, String)]) -> Vec<String> {
        let mut out: Vec<String> = base.iter().take(self.width).cloned().collect();
        out.resize(self.width, String::new());
        for (col, value) in values {
            if let Some(i) = self.index(*col) {
                out[i] = value.clone();
            }
        }
        out
    }

    /// Header row for this layout; unmapped positions are left blank.
    pub fn header_cells(&self) -> Vec<String> {
        let values: Vec<(Column, String)> = Column::ALL
            .into_iter()
            .map(|c| (c, c.label().to_string()))
            .collect();
        self.render(&[], &values)
    }
}

/// Spreadsheet column letters for a 0-based index (`0 -> A`, `26 -> AA`).
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}
