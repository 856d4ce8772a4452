use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ListingStatus;
use crate::table::layout::ColumnMap;

/// The persisted record of one listing ever seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedRow {
    pub item_id: String,
    pub url: String,
    pub title: String,
    pub current_price: Decimal,
    pub new_price: Decimal,
    /// User-owned. Read, never rewritten for a listed item.
    pub floor_price: Option<Decimal>,
    /// User-owned. Blank or unparsable means "use the configured default".
    pub price_change_percent: Option<Decimal>,
    /// `None` when the status cell is blank or unrecognised.
    pub status: Option<ListingStatus>,
    pub last_updated: Option<NaiveDateTime>,
    /// 1-based physical row, header offset included. `None` until written.
    pub row_index: Option<usize>,
    /// Raw cells as read, so columns the engine does not own survive a rewrite.
    #[serde(default)]
    pub cells: Vec<String>,
}

impl TrackedRow {
    /// A row with only identity fields set, as seeded on first sighting.
    pub fn new(item_id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            url: url.into(),
            title: title.into(),
            current_price: Decimal::ZERO,
            new_price: Decimal::ZERO,
            floor_price: None,
            price_change_percent: None,
            status: None,
            last_updated: None,
            row_index: None,
            cells: Vec::new(),
        }
    }
}

/// The tracking table as loaded at the start of a run.
///
/// Built once by the reader and passed by reference into reconciliation and
/// plan building; it is never rebuilt mid-run.
#[derive(Debug, Clone)]
pub struct TrackedTable {
    header_row: usize,
    columns: ColumnMap,
    rows: HashMap<String, TrackedRow>,
    /// Ids in physical order.
    order: Vec<String>,
}

impl TrackedTable {
    pub fn new(header_row: usize, columns: ColumnMap) -> Self {
        Self {
            header_row,
            columns,
            rows: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Empty table with the canonical header at row 1.
    pub fn empty() -> Self {
        Self::new(1, ColumnMap::canonical())
    }

    /// Canonical-layout table from already materialised rows. Rows without a
    /// `row_index` are placed directly below the header in iteration order.
    pub fn from_rows(rows: impl IntoIterator<Item = TrackedRow>) -> Self {
        let mut table = Self::empty();
        let mut next_row = table.header_row + 1;
        for mut row in rows {
            match row.row_index {
                Some(idx) => next_row = next_row.max(idx + 1),
                None => {
                    row.row_index = Some(next_row);
                    next_row += 1;
                }
            }
            // Duplicates are dropped; first occurrence wins.
            let _ = table.insert(row);
        }
        table
    }

    /// Insert a row. If the id is already present the table is unchanged and
    /// the rejected row is handed back.
    pub fn insert(&mut self, row: TrackedRow) -> Result<(), TrackedRow> {
        if self.rows.contains_key(&row.item_id) {
            return Err(row);
        }
        self.order.push(row.item_id.clone());
        self.rows.insert(row.item_id.clone(), row);
        Ok(())
    }

    pub fn get(&self, item_id: &str) -> Option<&TrackedRow> {
        self.rows.get(item_id)
    }

    /// Rows in physical order.
    pub fn iter(&self) -> impl Iterator<Item = &TrackedRow> {
        self.order.iter().filter_map(|id| self.rows.get(id))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn header_row(&self) -> usize {
        self.header_row
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }
}
