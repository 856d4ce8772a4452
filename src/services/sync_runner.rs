use chrono::{Local, NaiveDateTime};
use metrics::{counter, histogram};
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};

use crate::collector::ListingSource;
use crate::config::SyncSettings;
use crate::engine::{build_plan, execute_plan, reconcile, write_header, PlanOptions, PlanReport};
use crate::errors::{Diagnostic, SyncError};
use crate::models::TrackedTable;
use crate::table::{read_tracked_table, CellRange, ColumnMap, TableStore};

/// Outcome of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub listings: usize,
    pub new_listings: usize,
    pub dirty_rows: usize,
    pub newly_removed: usize,
    pub repricing_candidates: usize,
    pub diagnostics: usize,
    /// The table had no header and a fresh one was written.
    pub bootstrapped: bool,
    pub dry_run: bool,
    pub report: PlanReport,
}

/// Run one sync, stamping touched rows with the local wall clock.
pub async fn run_sync_once<S, T>(
    source: &S,
    store: &T,
    settings: &SyncSettings,
) -> Result<SyncSummary, SyncError>
where
    S: ListingSource + ?Sized,
    T: TableStore + ?Sized,
{
    run_sync_at(source, store, settings, Local::now().naive_local()).await
}

/// Run one sync with an explicit `updated_at` stamp.
pub async fn run_sync_at<S, T>(
    source: &S,
    store: &T,
    settings: &SyncSettings,
    updated_at: NaiveDateTime,
) -> Result<SyncSummary, SyncError>
where
    S: ListingSource + ?Sized,
    T: TableStore + ?Sized,
{
    let started = Instant::now();
    counter!("sync_runs_total").increment(1);

    let result = sync(source, store, settings, updated_at).await;

    histogram!("sync_duration_seconds").record(started.elapsed().as_secs_f64());
    if let Err(e) = &result {
        counter!("sync_failures_total").increment(1);
        tracing::error!(error = %e, "Sync run failed");
    }
    result
}

async fn sync<S, T>(
    source: &S,
    store: &T,
    settings: &SyncSettings,
    updated_at: NaiveDateTime,
) -> Result<SyncSummary, SyncError>
where
    S: ListingSource + ?Sized,
    T: TableStore + ?Sized,
{
    let snapshot = source.fetch_listings().await?;
    if snapshot.is_empty() {
        // Never read an empty snapshot as "everything sold".
        return Err(SyncError::EmptySnapshot);
    }
    counter!("listings_observed_total").increment(snapshot.len() as u64);

    let raw = store.read_range(CellRange::whole_sheet()).await?;
    let mut bootstrapped = false;
    let (table, mut diagnostics) = match read_tracked_table(&raw) {
        Ok(read) => (read.table, read.diagnostics),
        Err(SyncError::MalformedTable { rows_scanned }) => {
            tracing::warn!(rows_scanned, "No tracking header found, starting a fresh table");
            if !settings.dry_run {
                write_header(store, &ColumnMap::canonical().header_cells()).await?;
            }
            bootstrapped = true;
            (TrackedTable::empty(), Vec::new())
        }
        Err(e) => return Err(e),
    };

    let rec = reconcile(&snapshot, &table, settings.default_price_change_percent);
    diagnostics.extend(rec.diagnostics.iter().cloned());

    let recoveries = diagnostics
        .iter()
        .filter(|d| matches!(d, Diagnostic::ParseRecovery { .. }))
        .count();
    counter!("parse_recoveries_total").increment(recoveries as u64);

    for candidate in rec.repricing_candidates() {
        tracing::info!(
            id = %candidate.id(),
            title = %candidate.listing.title,
            current = %candidate.listing.price,
            target = %candidate.new_price,
            percent = %candidate.price_change_percent,
            floor_applied = candidate.floor_applied,
            "Repricing candidate"
        );
    }

    let plan = build_plan(
        &rec,
        &table,
        &PlanOptions {
            default_percent: settings.default_price_change_percent,
            updated_at,
            group_delay: settings.write_group_delay,
        },
    );

    let report = if settings.dry_run {
        for group in plan.groups() {
            tracing::info!(range = %group.range(plan.width), "Dry run: would update");
        }
        if !plan.appends.is_empty() {
            tracing::info!(rows = plan.appends.len(), "Dry run: would append");
        }
        PlanReport::default()
    } else {
        execute_plan(store, &plan).await?
    };

    let newly_removed = rec.removed.iter().filter(|r| r.newly_removed).count();
    counter!("rows_dirty_total").increment(rec.dirty_count() as u64);
    counter!("rows_appended_total").increment(report.rows_appended as u64);
    counter!("rows_removed_total").increment(newly_removed as u64);
    counter!("write_groups_total").increment(report.groups_written as u64);

    let summary = SyncSummary {
        listings: rec.annotated.len(),
        new_listings: rec.new_discoveries().count(),
        dirty_rows: rec.dirty_count(),
        newly_removed,
        repricing_candidates: rec.repricing_candidates().count(),
        diagnostics: diagnostics.len(),
        bootstrapped,
        dry_run: settings.dry_run,
        report,
    };

    tracing::info!(
        listings = summary.listings,
        new = summary.new_listings,
        dirty = summary.dirty_rows,
        removed = summary.newly_removed,
        repricing = summary.repricing_candidates,
        diagnostics = summary.diagnostics,
        requests = summary.report.requests(),
        dry_run = summary.dry_run,
        "Sync run complete"
    );
    Ok(summary)
}

/// Run syncs back to back on a fixed schedule. Failures are logged and the
/// next tick retries; a run never overlaps the previous one.
pub async fn run_sync_loop<S, T>(source: &S, store: &T, settings: &SyncSettings, every: Duration)
where
    S: ListingSource + ?Sized,
    T: TableStore + ?Sized,
{
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::info!(interval_secs = every.as_secs(), "Sync loop started");

    loop {
        ticker.tick().await;
        // Errors are already logged and counted.
        let _ = run_sync_once(source, store, settings).await;
    }
}
