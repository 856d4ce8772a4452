use std::time::Duration;

use super::plan::WritePlan;
use crate::errors::StoreError;
use crate::table::{CellRange, RowStyle, TableStore};

/// What executing a plan actually sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanReport {
    pub groups_written: usize,
    pub rows_updated: usize,
    pub rows_appended: usize,
    pub ranges_formatted: usize,
}

impl PlanReport {
    pub fn requests(&self) -> usize {
        self.groups_written + usize::from(self.rows_appended > 0) + self.ranges_formatted
    }
}

/// Sleeps `delay` before every paced call except the first.
struct Pacer {
    delay: Duration,
    calls: usize,
}

impl Pacer {
    fn new(delay: Duration) -> Self {
        Self { delay, calls: 0 }
    }

    async fn wait(&mut self) {
        if self.calls > 0 && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.calls += 1;
    }
}

/// Issue a plan against the store: update groups in ascending row order,
/// then one append, then formatting runs.
///
/// Stops at the first failing call. Everything sent before it stays
/// written; the next run's read picks up from there.
pub async fn execute_plan<S>(store: &S, plan: &WritePlan) -> Result<PlanReport, StoreError>
where
    S: TableStore + ?Sized,
{
    let mut report = PlanReport::default();
    let mut pacer = Pacer::new(plan.group_delay);

    for group in plan.groups() {
        pacer.wait().await;
        let range = group.range(plan.width);
        store.write_range(range, &group.rows).await?;
        tracing::info!(%range, rows = group.rows.len(), "Update group written");
        report.groups_written += 1;
        report.rows_updated += group.rows.len();
    }

    if !plan.appends.is_empty() {
        store.append_rows(&plan.appends).await?;
        tracing::info!(rows = plan.appends.len(), "New listings appended");
        report.rows_appended = plan.appends.len();
    }

    for (range, style) in plan.format_runs() {
        pacer.wait().await;
        store.format_range(range, style).await?;
        report.ranges_formatted += 1;
    }

    Ok(report)
}

/// Write the canonical header to row 1 and style it.
pub async fn write_header<S>(store: &S, header: &[String]) -> Result<(), StoreError>
where
    S: TableStore + ?Sized,
{
    let range = CellRange::row(1, header.len());
    store.write_range(range, &[header.to_vec()]).await?;
    store.format_range(range, RowStyle::Header).await?;
    tracing::info!("Header row written");
    Ok(())
}
