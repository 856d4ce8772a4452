mod common;

use rust_decimal::Decimal;
use std::time::Duration;

use common::{item_url, listing, stamp};
use pricebot::engine::{build_plan, execute_plan, reconcile, PlanOptions, WRITE_GROUP_DELAY};
use pricebot::models::{ListingStatus, TrackedRow, TrackedTable};
use pricebot::table::{CellRange, MemoryTableStore, StoreOp};

fn active_row(row: usize) -> TrackedRow {
    let id = row.to_string();
    let mut tracked = TrackedRow::new(id.clone(), format!("Item {id}"), item_url(&id));
    tracked.current_price = Decimal::from(10);
    tracked.new_price = Decimal::new(980, 2);
    tracked.price_change_percent = Some(Decimal::from(-2));
    tracked.status = Some(ListingStatus::Active);
    tracked.row_index = Some(row);
    tracked
}

fn moved(row: usize) -> bool {
    (10..=59).contains(&row) || [100, 150, 151].contains(&row)
}

#[tokio::test(start_paused = true)]
async fn test_scattered_dirty_rows_written_as_three_paced_groups() {
    let table = TrackedTable::from_rows((2..=160).map(active_row));
    let snapshot: Vec<_> = (2..=160)
        .map(|row| {
            let price = if moved(row) { 20 } else { 10 };
            listing(&row.to_string(), Decimal::from(price))
        })
        .collect();

    let rec = reconcile(&snapshot, &table, Decimal::from(-2));
    assert_eq!(rec.dirty_count(), 53);

    let plan = build_plan(
        &rec,
        &table,
        &PlanOptions {
            default_percent: Decimal::from(-2),
            updated_at: stamp(1),
            group_delay: WRITE_GROUP_DELAY,
        },
    );
    let spans: Vec<(usize, usize)> = plan.groups().iter().map(|g| (g.start_row, g.end_row)).collect();
    assert_eq!(spans, vec![(10, 59), (100, 100), (150, 151)]);
    assert!(plan.appends.is_empty());

    let store = MemoryTableStore::new();
    let started = tokio::time::Instant::now();
    let report = execute_plan(&store, &plan).await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(2200));
    assert_eq!(report.groups_written, 3);
    assert_eq!(report.rows_updated, 53);
    assert_eq!(
        store.ops().await,
        vec![
            StoreOp::Write(CellRange::rows(10, 59, 9)),
            StoreOp::Write(CellRange::row(100, 9)),
            StoreOp::Write(CellRange::rows(150, 151, 9)),
        ]
    );

    let rows = store.rows().await;
    assert_eq!(rows[9][0], "10");
    assert_eq!(rows[9][3], "20.00");
    assert_eq!(rows[9][4], "19.60");
    assert_eq!(rows[9][8], "2024-05-01 12:00:00");
}

#[tokio::test]
async fn test_new_and_removed_in_one_plan() {
    let table = TrackedTable::from_rows([active_row(2), active_row(3)]);
    let snapshot = vec![listing("2", Decimal::from(10)), listing("900", Decimal::from(7))];

    let rec = reconcile(&snapshot, &table, Decimal::from(-2));
    let plan = build_plan(
        &rec,
        &table,
        &PlanOptions {
            default_percent: Decimal::from(-2),
            updated_at: stamp(1),
            group_delay: Duration::ZERO,
        },
    );

    assert_eq!(plan.updates.keys().copied().collect::<Vec<_>>(), vec![3]);
    assert_eq!(plan.appends.len(), 1);
    assert_eq!(plan.appends[0][0], "900");
    assert_eq!(plan.appends[0][7], "New");
    // One update group, one append, one format call.
    assert_eq!(plan.request_count(), 3);
}
