use rust_decimal::Decimal;
use std::collections::HashSet;

use super::cells::round_price;
use super::pricing::{compute_new_price, price_moved, PriceOutcome};
use crate::errors::Diagnostic;
use crate::models::{AnnotatedListing, Listing, ListingStatus, TrackedRow, TrackedTable};
use crate::table::layout::{Column, ColumnMap};

/// A tracked listing that is no longer in the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedListing {
    pub item_id: String,
    pub row_index: Option<usize>,
    /// Last known prices, carried forward untouched.
    pub current_price: Decimal,
    pub new_price: Decimal,
    pub floor_price: Option<Decimal>,
    /// Always zero for a removed listing.
    pub price_change_percent: Decimal,
    /// The row was not already marked sold/removed.
    pub dirty: bool,
    /// The row is being relabelled this run.
    pub newly_removed: bool,
}

/// Everything reconciliation decided about one run.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// Snapshot listings in snapshot order, duplicates dropped.
    pub annotated: Vec<AnnotatedListing>,
    /// Tracked rows missing from the snapshot, in physical row order.
    pub removed: Vec<RemovedListing>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Reconciliation {
    pub fn dirty_count(&self) -> usize {
        self.annotated.iter().filter(|a| a.dirty).count()
            + self.removed.iter().filter(|r| r.dirty).count()
    }

    pub fn new_discoveries(&self) -> impl Iterator<Item = &AnnotatedListing> {
        self.annotated.iter().filter(|a| a.is_new_discovery())
    }

    /// Listings whose live price should be edited to `new_price`.
    pub fn repricing_candidates(&self) -> impl Iterator<Item = &AnnotatedListing> {
        self.annotated.iter().filter(|a| a.needs_reprice())
    }
}

/// Diff a snapshot against the tracking table.
///
/// Pure: no I/O, no clock, no configuration lookups. The default percent is
/// applied to known listings whose own percent cell is blank or unreadable;
/// a first sighting always gets a zero change.
pub fn reconcile(snapshot: &[Listing], tracked: &TrackedTable, default_percent: Decimal) -> Reconciliation {
    let mut out = Reconciliation::default();
    let mut seen: HashSet<&str> = HashSet::with_capacity(snapshot.len());

    for (position, listing) in snapshot.iter().enumerate() {
        if !seen.insert(listing.id.as_str()) {
            out.diagnostics.push(Diagnostic::DuplicateListing {
                id: listing.id.clone(),
                position,
            });
            continue;
        }

        let annotated = match tracked.get(&listing.id) {
            None => annotate_new(listing),
            Some(row) => annotate_known(
                listing,
                row,
                tracked.columns(),
                default_percent,
                &mut out.diagnostics,
            ),
        };

        tracing::debug!(
            id = %listing.id,
            status = %annotated.status,
            price = %listing.price,
            new_price = %annotated.new_price,
            dirty = annotated.dirty,
            "Listing reconciled"
        );
        out.annotated.push(annotated);
    }

    let can_relabel = tracked.columns().has(Column::Status);
    for row in tracked.iter() {
        if seen.contains(row.item_id.as_str()) {
            continue;
        }
        let already_removed = !can_relabel || row.status == Some(ListingStatus::SoldRemoved);
        out.removed.push(RemovedListing {
            item_id: row.item_id.clone(),
            row_index: row.row_index,
            current_price: row.current_price,
            new_price: row.new_price,
            floor_price: row.floor_price,
            price_change_percent: Decimal::ZERO,
            dirty: !already_removed,
            newly_removed: !already_removed,
        });
    }

    for diagnostic in &out.diagnostics {
        tracing::warn!(kind = diagnostic.kind(), "{diagnostic}");
    }

    out
}

fn annotate_new(listing: &Listing) -> AnnotatedListing {
    // No repricing before a human has seen the row.
    AnnotatedListing {
        listing: listing.clone(),
        status: ListingStatus::New,
        price_change_percent: Decimal::ZERO,
        floor_price: None,
        new_price: round_price(listing.price),
        floor_applied: false,
        dirty: true,
        row_index: None,
    }
}

fn annotate_known(
    listing: &Listing,
    row: &TrackedRow,
    columns: &ColumnMap,
    default_percent: Decimal,
    diagnostics: &mut Vec<Diagnostic>,
) -> AnnotatedListing {
    let floor = row.floor_price;
    let (percent, outcome) = price_row(listing, row, columns, default_percent, diagnostics);
    let status = ListingStatus::Active;

    if outcome.floor_applied {
        tracing::info!(
            id = %listing.id,
            floor = %outcome.new_price,
            "Floor price applied"
        );
    }

    // Only fields the table has a column for can ever match; a missing
    // column must not keep the row dirty forever.
    let dirty = (columns.has(Column::CurrentPrice) && price_moved(listing.price, row.current_price))
        || (columns.has(Column::Status) && row.status != Some(status))
        || (columns.has(Column::Title) && row.title != listing.title)
        || (columns.has(Column::Url) && row.url != listing.url);

    AnnotatedListing {
        listing: listing.clone(),
        status,
        price_change_percent: percent,
        floor_price: floor,
        new_price: outcome.new_price,
        floor_applied: outcome.floor_applied,
        dirty,
        row_index: row.row_index,
    }
}

/// Apply the row's percent, falling back to the default and then to the
/// unchanged live price when the arithmetic overflows.
fn price_row(
    listing: &Listing,
    row: &TrackedRow,
    columns: &ColumnMap,
    default_percent: Decimal,
    diagnostics: &mut Vec<Diagnostic>,
) -> (Decimal, PriceOutcome) {
    let row_number = row.row_index.unwrap_or_default();

    if let Some(percent) = row.price_change_percent {
        if let Some(outcome) = compute_new_price(listing.price, percent, row.floor_price) {
            return (percent, outcome);
        }
        let raw = columns
            .cell(&row.cells, Column::PriceChangePercent)
            .map(str::to_string)
            .unwrap_or_else(|| percent.to_string());
        diagnostics.push(Diagnostic::ParseRecovery {
            row: row_number,
            column: Column::PriceChangePercent,
            raw,
            fallback: "default percent".into(),
        });
    }

    if let Some(outcome) = compute_new_price(listing.price, default_percent, row.floor_price) {
        return (default_percent, outcome);
    }

    diagnostics.push(Diagnostic::ParseRecovery {
        row: row_number,
        column: Column::CurrentPrice,
        raw: listing.price.to_string(),
        fallback: "unchanged price".into(),
    });
    (
        default_percent,
        PriceOutcome {
            new_price: listing.price,
            floor_applied: false,
        },
    )
}
