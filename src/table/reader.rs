use rust_decimal::Decimal;

use crate::engine::cells::{parse_decimal, parse_status, parse_timestamp};
use crate::errors::{Diagnostic, SyncError};
use crate::models::{TrackedRow, TrackedTable};
use crate::table::layout::{Column, ColumnMap};

/// A tracking table materialised from raw cells, plus everything that had to
/// be recovered along the way.
#[derive(Debug, Clone)]
pub struct TableRead {
    pub table: TrackedTable,
    pub diagnostics: Vec<Diagnostic>,
}

/// Materialise raw table contents into tracked rows.
///
/// The first row carrying an `Item ID` label is the header; everything above
/// it is ignored. Columns are located by name, so reordered or partial
/// layouts still read. A cell that cannot be parsed falls back to its default
/// (0 for prices, absent for everything else) and is reported, it never
/// aborts the read.
pub fn read_tracked_table(raw: &[Vec<String>]) -> Result<TableRead, SyncError> {
    let (header_idx, columns) = raw
        .iter()
        .enumerate()
        .find_map(|(i, row)| ColumnMap::from_header(row).map(|map| (i, map)))
        .ok_or(SyncError::MalformedTable {
            rows_scanned: raw.len(),
        })?;

    let header_row = header_idx + 1;
    let mut table = TrackedTable::new(header_row, columns.clone());
    let mut diagnostics = Vec::new();

    for (offset, cells) in raw.iter().enumerate().skip(header_idx + 1) {
        let row_index = offset + 1;

        let id = columns
            .cell(cells, Column::ItemId)
            .map(str::trim)
            .unwrap_or_default();
        if id.is_empty() {
            continue;
        }
        if Column::from_header(id) == Some(Column::ItemId) {
            diagnostics.push(Diagnostic::StrayHeader { row: row_index });
            continue;
        }

        let row = parse_row(id, cells, row_index, &columns, &mut diagnostics);
        if let Err(rejected) = table.insert(row) {
            let first_row = table
                .get(&rejected.item_id)
                .and_then(|r| r.row_index)
                .unwrap_or(header_row);
            diagnostics.push(Diagnostic::DuplicateTrackedRow {
                id: rejected.item_id,
                row: row_index,
                first_row,
            });
        }
    }

    for diagnostic in &diagnostics {
        tracing::warn!(kind = diagnostic.kind(), "{diagnostic}");
    }
    tracing::debug!(
        header_row,
        rows = table.len(),
        recovered = diagnostics.len(),
        "Tracking table read"
    );

    Ok(TableRead { table, diagnostics })
}

fn parse_row(
    id: &str,
    cells: &[String],
    row_index: usize,
    columns: &ColumnMap,
    diagnostics: &mut Vec<Diagnostic>,
) -> TrackedRow {
    let text = |col: Column| {
        columns
            .cell(cells, col)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };
    let mut recover = |col: Column, raw: Option<&str>, fallback: &str| {
        if let Some(raw) = raw {
            diagnostics.push(Diagnostic::ParseRecovery {
                row: row_index,
                column: col,
                raw: raw.to_string(),
                fallback: fallback.to_string(),
            });
        }
    };

    let current_price = parse_decimal(columns.cell(cells, Column::CurrentPrice));
    recover(Column::CurrentPrice, current_price.recovered(), "0");
    let new_price = parse_decimal(columns.cell(cells, Column::NewPrice));
    recover(Column::NewPrice, new_price.recovered(), "0");
    let floor_price = parse_decimal(columns.cell(cells, Column::FloorPrice));
    recover(Column::FloorPrice, floor_price.recovered(), "no floor");
    let percent = parse_decimal(columns.cell(cells, Column::PriceChangePercent));
    recover(Column::PriceChangePercent, percent.recovered(), "default percent");
    let status = parse_status(columns.cell(cells, Column::Status));
    recover(Column::Status, status.recovered(), "recomputed status");
    let last_updated = parse_timestamp(columns.cell(cells, Column::LastUpdated));
    recover(Column::LastUpdated, last_updated.recovered(), "none");

    TrackedRow {
        item_id: id.to_string(),
        url: text(Column::Url),
        title: text(Column::Title),
        current_price: current_price.unwrap_or(Decimal::ZERO),
        new_price: new_price.unwrap_or(Decimal::ZERO),
        floor_price: floor_price.value(),
        price_change_percent: percent.value(),
        status: status.value(),
        last_updated: last_updated.value(),
        row_index: Some(row_index),
        cells: cells.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListingStatus;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    const HEADER: &[&str] = &[
        "Item ID",
        "URL",
        "Title",
        "Current Price",
        "New Price",
        "Floor Price",
        "Price Change %",
        "Status",
        "Last Updated",
    ];

    #[test]
    fn test_reads_canonical_table() {
        let raw = rows(&[
            HEADER,
            &["42", "https://x.test/items/42", "Coat", "20.00", "22.00", "", "10", "Active", "2024-01-02 03:04:05"],
            &["43", "https://x.test/items/43", "Hat", "5,50", "5.50", "4", "", "🆕 New", ""],
        ]);

        let read = read_tracked_table(&raw).unwrap();
        assert!(read.diagnostics.is_empty());
        assert_eq!(read.table.header_row(), 1);
        assert_eq!(read.table.len(), 2);

        let coat = read.table.get("42").unwrap();
        assert_eq!(coat.row_index, Some(2));
        assert_eq!(coat.current_price, Decimal::new(2000, 2));
        assert_eq!(coat.price_change_percent, Some(Decimal::from(10)));
        assert_eq!(coat.floor_price, None);
        assert_eq!(coat.status, Some(ListingStatus::Active));
        assert!(coat.last_updated.is_some());

        let hat = read.table.get("43").unwrap();
        assert_eq!(hat.current_price, Decimal::new(550, 2));
        assert_eq!(hat.floor_price, Some(Decimal::from(4)));
        assert_eq!(hat.price_change_percent, None);
        assert_eq!(hat.status, Some(ListingStatus::New));
    }

    #[test]
    fn test_missing_header_is_malformed() {
        let raw = rows(&[&["just", "some"], &["notes", "here"]]);
        let err = read_tracked_table(&raw).unwrap_err();
        assert!(matches!(err, SyncError::MalformedTable { rows_scanned: 2 }));
    }

    #[test]
    fn test_empty_table_is_malformed() {
        assert!(matches!(
            read_tracked_table(&[]),
            Err(SyncError::MalformedTable { rows_scanned: 0 })
        ));
    }

    #[test]
    fn test_header_found_below_junk_rows() {
        let raw = rows(&[
            &["Vinted tracker"],
            &[],
            &["Title", "Item ID", "Current Price (€)"],
            &["Shoes", "9", "30"],
        ]);

        let read = read_tracked_table(&raw).unwrap();
        assert_eq!(read.table.header_row(), 3);
        let shoes = read.table.get("9").unwrap();
        assert_eq!(shoes.row_index, Some(4));
        assert_eq!(shoes.title, "Shoes");
        assert_eq!(shoes.current_price, Decimal::from(30));
        assert_eq!(shoes.status, None);
    }

    #[test]
    fn test_bad_cells_recover_without_aborting() {
        let raw = rows(&[
            HEADER,
            &["1", "u", "A", "abc", "1.00", "low", "half", "paused", "someday"],
            &["2", "u", "B", "3.00", "3.00", "", "", "Active", ""],
        ]);

        let read = read_tracked_table(&raw).unwrap();
        assert_eq!(read.table.len(), 2);

        let a = read.table.get("1").unwrap();
        assert_eq!(a.current_price, Decimal::ZERO);
        assert_eq!(a.floor_price, None);
        assert_eq!(a.price_change_percent, None);
        assert_eq!(a.status, None);
        assert_eq!(a.last_updated, None);

        let recovered: Vec<Column> = read
            .diagnostics
            .iter()
            .filter_map(|d| match d {
                Diagnostic::ParseRecovery { row: 2, column, .. } => Some(*column),
                _ => None,
            })
            .collect();
        assert_eq!(
            recovered,
            vec![
                Column::CurrentPrice,
                Column::FloorPrice,
                Column::PriceChangePercent,
                Column::Status,
                Column::LastUpdated,
            ]
        );
    }

    #[test]
    fn test_blank_ids_and_repeated_headers_are_skipped() {
        let raw = rows(&[
            HEADER,
            &["1", "u", "A", "1", "1", "", "", "Active", ""],
            &["", "", "", "", "", "", "", "", ""],
            HEADER,
            &["2", "u", "B", "2", "2", "", "", "Active", ""],
        ]);

        let read = read_tracked_table(&raw).unwrap();
        assert_eq!(read.table.len(), 2);
        assert_eq!(read.table.get("2").unwrap().row_index, Some(5));
        assert_eq!(read.diagnostics, vec![Diagnostic::StrayHeader { row: 4 }]);
    }

    #[test]
    fn test_duplicate_ids_keep_first_row() {
        let raw = rows(&[
            HEADER,
            &["1", "u", "First", "1", "1", "", "", "Active", ""],
            &["1", "u", "Second", "2", "2", "", "", "Active", ""],
        ]);

        let read = read_tracked_table(&raw).unwrap();
        assert_eq!(read.table.get("1").unwrap().title, "First");
        assert_eq!(
            read.diagnostics,
            vec![Diagnostic::DuplicateTrackedRow {
                id: "1".into(),
                row: 3,
                first_row: 2,
            }]
        );
    }

    #[test]
    fn test_short_rows_tolerated() {
        let raw = rows(&[HEADER, &["5", "https://x.test/items/5"]]);
        let read = read_tracked_table(&raw).unwrap();
        let row = read.table.get("5").unwrap();
        assert_eq!(row.title, "");
        assert_eq!(row.current_price, Decimal::ZERO);
        assert!(read.diagnostics.is_empty());
    }
}
