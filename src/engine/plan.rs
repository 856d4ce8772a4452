use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::time::Duration;

use super::cells::{format_percent, format_price, format_timestamp};
use super::reconcile::Reconciliation;
use crate::models::{AnnotatedListing, ListingStatus, TrackedTable};
use crate::table::layout::{Column, ColumnMap};
use crate::table::{CellRange, RowStyle};

/// Minimum pause between two batched write requests. One notch above what
/// the store's per-minute write quota allows.
pub const WRITE_GROUP_DELAY: Duration = Duration::from_millis(1100);

/// Inputs to plan building that do not come from reconciliation.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    /// Seeded into the percent column of brand-new rows.
    pub default_percent: Decimal,
    /// Stamp written to every touched row.
    pub updated_at: NaiveDateTime,
    pub group_delay: Duration,
}

/// One contiguous block of rows sent as a single range write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeWrite {
    pub start_row: usize,
    pub end_row: usize,
    pub rows: Vec<Vec<String>>,
}

impl RangeWrite {
    pub fn range(&self, width: usize) -> CellRange {
        CellRange::rows(self.start_row, self.end_row, width)
    }
}

/// Every mutation one run needs, in the order it must be issued:
/// update groups (ascending), then one append, then formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePlan {
    /// Full-row contents keyed by physical row.
    pub updates: BTreeMap<usize, Vec<String>>,
    /// First sightings, in snapshot order.
    pub appends: Vec<Vec<String>>,
    pub formatting: Vec<(usize, RowStyle)>,
    /// Row width of every update and append.
    pub width: usize,
    pub group_delay: Duration,
}

impl WritePlan {
    pub fn empty(width: usize, group_delay: Duration) -> Self {
        Self {
            updates: BTreeMap::new(),
            appends: Vec::new(),
            formatting: Vec::new(),
            width,
            group_delay,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.appends.is_empty() && self.formatting.is_empty()
    }

    /// Updates folded into maximal runs of consecutive rows, ascending.
    pub fn groups(&self) -> Vec<RangeWrite> {
        group_runs(self.updates.keys().copied())
            .into_iter()
            .map(|(start_row, end_row)| RangeWrite {
                start_row,
                end_row,
                rows: (start_row..=end_row)
                    .filter_map(|r| self.updates.get(&r).cloned())
                    .collect(),
            })
            .collect()
    }

    /// Formatting folded into runs of consecutive rows sharing a style.
    pub fn format_runs(&self) -> Vec<(CellRange, RowStyle)> {
        let mut sorted = self.formatting.clone();
        sorted.sort_by_key(|(row, _)| *row);
        sorted.dedup_by_key(|(row, _)| *row);

        let mut runs: Vec<(CellRange, RowStyle)> = Vec::new();
        for (row, style) in sorted {
            match runs.last_mut() {
                Some((range, last_style))
                    if *last_style == style && range.end_row == Some(row - 1) =>
                {
                    range.end_row = Some(row);
                }
                _ => runs.push((CellRange::row(row, self.width), style)),
            }
        }
        runs
    }

    /// Number of store requests executing this plan costs.
    pub fn request_count(&self) -> usize {
        self.groups().len() + usize::from(!self.appends.is_empty()) + self.format_runs().len()
    }
}

/// Fold ascending row numbers into inclusive `(start, end)` runs of
/// consecutive integers. Duplicates are ignored.
pub fn group_runs(rows: impl IntoIterator<Item = usize>) -> Vec<(usize, usize)> {
    let mut runs: Vec<(usize, usize)> = Vec::new();
    for row in rows {
        match runs.last_mut() {
            Some((_, end)) if row == *end + 1 => *end = row,
            Some((_, end)) if row <= *end => {}
            _ => runs.push((row, row)),
        }
    }
    runs
}

/// Turn a reconciliation into the minimal set of writes.
///
/// Dirty rows that already exist are updated in place, first sightings are
/// appended, and rows that dropped out of the snapshot are relabelled and
/// greyed out. Clean rows are never touched.
pub fn build_plan(rec: &Reconciliation, tracked: &TrackedTable, opts: &PlanOptions) -> WritePlan {
    let columns = tracked.columns();
    let stamp = format_timestamp(opts.updated_at);
    let mut plan = WritePlan::empty(columns.width(), opts.group_delay);

    for annotated in rec.annotated.iter().filter(|a| a.dirty) {
        let existing = tracked.get(annotated.id());
        match annotated.row_index {
            Some(row) => {
                let base = existing.map(|r| r.cells.as_slice()).unwrap_or_default();
                plan.updates
                    .insert(row, listing_cells(columns, base, annotated, &stamp));

                if existing.and_then(|r| r.status) == Some(ListingStatus::SoldRemoved) {
                    plan.formatting.push((row, RowStyle::Normal));
                }
            }
            None => {
                let mut cells = listing_cells(columns, &[], annotated, &stamp);
                if let Some(i) = columns.index(Column::PriceChangePercent) {
                    cells[i] = format_percent(opts.default_percent);
                }
                plan.appends.push(cells);
            }
        }
    }

    for removed in rec.removed.iter().filter(|r| r.dirty) {
        let Some(row) = removed.row_index else {
            tracing::warn!(id = %removed.item_id, "Removed listing has no row to relabel");
            continue;
        };
        let base = tracked
            .get(&removed.item_id)
            .map(|r| r.cells.as_slice())
            .unwrap_or_default();
        let cells = columns.render(
            base,
            &[
                (Column::ItemId, removed.item_id.clone()),
                (Column::PriceChangePercent, format_percent(removed.price_change_percent)),
                (Column::Status, ListingStatus::SoldRemoved.label().to_string()),
                (Column::LastUpdated, stamp.clone()),
            ],
        );
        plan.updates.insert(row, cells);
        if removed.newly_removed {
            plan.formatting.push((row, RowStyle::Removed));
        }
    }

    tracing::debug!(
        updates = plan.updates.len(),
        appends = plan.appends.len(),
        formatting = plan.formatting.len(),
        "Write plan built"
    );
    plan
}

/// Engine-owned cells of a listing row laid over `base`. Floor and percent
/// are user-owned and keep whatever `base` holds.
fn listing_cells(
    columns: &ColumnMap,
    base: &[String],
    annotated: &AnnotatedListing,
    stamp: &str,
) -> Vec<String> {
    columns.render(
        base,
        &[
            (Column::ItemId, annotated.listing.id.clone()),
            (Column::Url, annotated.listing.url.clone()),
            (Column::Title, annotated.listing.title.clone()),
            (Column::CurrentPrice, format_price(annotated.listing.price)),
            (Column::NewPrice, format_price(annotated.new_price)),
            (Column::Status, annotated.status.label().to_string()),
            (Column::LastUpdated, stamp.to_string()),
        ],
    )
}
