mod common;

use rust_decimal::Decimal;

use common::{cells, header, item_url, listing, settings, stamp, FixedSource};
use pricebot::errors::SyncError;
use pricebot::services::run_sync_at;
use pricebot::table::{CellRange, MemoryTableStore, RowStyle, StoreOp};

fn two_listings() -> Vec<pricebot::models::Listing> {
    vec![
        listing("1", Decimal::from(10)),
        listing("2", Decimal::new(1350, 2)),
    ]
}

/// Runs one and two: bootstrap and append, then promotion to Active.
async fn seeded_store(source: &FixedSource) -> MemoryTableStore {
    let store = MemoryTableStore::new();
    run_sync_at(source, &store, &settings(), stamp(1)).await.unwrap();
    run_sync_at(source, &store, &settings(), stamp(2)).await.unwrap();
    store.clear_ops().await;
    store
}

#[tokio::test]
async fn test_first_run_bootstraps_header_and_appends() {
    let source = FixedSource::new(two_listings());
    let store = MemoryTableStore::new();

    let summary = run_sync_at(&source, &store, &settings(), stamp(1)).await.unwrap();

    assert!(summary.bootstrapped);
    assert_eq!(summary.new_listings, 2);
    assert_eq!(summary.repricing_candidates, 0);
    assert_eq!(
        store.ops().await,
        vec![
            StoreOp::Read(CellRange::whole_sheet()),
            StoreOp::Write(CellRange::row(1, 9)),
            StoreOp::Format(CellRange::row(1, 9), RowStyle::Header),
            StoreOp::Append { rows: 2 },
        ]
    );

    let rows = store.rows().await;
    assert_eq!(rows[0], header());
    assert_eq!(
        rows[1],
        cells(&[
            "1",
            "https://x.test/items/1",
            "Item 1",
            "10.00",
            "10.00",
            "",
            "-2",
            "New",
            "2024-05-01 12:00:00",
        ])
    );
    assert_eq!(rows[2][3], "13.50");
    assert_eq!(store.style_of(1).await, Some(RowStyle::Header));
}

#[tokio::test]
async fn test_second_run_promotes_and_reprices() {
    let source = FixedSource::new(two_listings());
    let store = MemoryTableStore::new();
    run_sync_at(&source, &store, &settings(), stamp(1)).await.unwrap();
    store.clear_ops().await;

    let summary = run_sync_at(&source, &store, &settings(), stamp(2)).await.unwrap();

    assert_eq!(summary.dirty_rows, 2);
    assert_eq!(summary.repricing_candidates, 2);
    assert_eq!(
        store.ops().await,
        vec![
            StoreOp::Read(CellRange::whole_sheet()),
            StoreOp::Write(CellRange::rows(2, 3, 9)),
        ]
    );

    let rows = store.rows().await;
    assert_eq!(
        rows[1],
        cells(&[
            "1",
            "https://x.test/items/1",
            "Item 1",
            "10.00",
            "9.80",
            "",
            "-2",
            "Active",
            "2024-05-02 12:00:00",
        ])
    );
    assert_eq!(rows[2][4], "13.23");
}

#[tokio::test]
async fn test_unchanged_snapshot_writes_nothing() {
    let source = FixedSource::new(two_listings());
    let store = seeded_store(&source).await;

    let summary = run_sync_at(&source, &store, &settings(), stamp(3)).await.unwrap();

    assert_eq!(summary.dirty_rows, 0);
    assert_eq!(summary.report.requests(), 0);
    assert!(store.ops().await.iter().all(|op| !op.is_mutation()));
    // Still flagged for repricing even though the rows are clean.
    assert_eq!(summary.repricing_candidates, 2);
}

#[tokio::test]
async fn test_missing_listing_marked_removed_once() {
    let source = FixedSource::new(two_listings());
    let store = seeded_store(&source).await;
    source.set(vec![listing("1", Decimal::from(10))]).await;

    let summary = run_sync_at(&source, &store, &settings(), stamp(3)).await.unwrap();

    assert_eq!(summary.newly_removed, 1);
    assert_eq!(
        store.ops().await,
        vec![
            StoreOp::Read(CellRange::whole_sheet()),
            StoreOp::Write(CellRange::row(3, 9)),
            StoreOp::Format(CellRange::row(3, 9), RowStyle::Removed),
        ]
    );
    assert_eq!(
        store.rows().await[2],
        cells(&[
            "2",
            "https://x.test/items/2",
            "Item 2",
            "13.50",
            "13.23",
            "",
            "0",
            "Sold/Removed",
            "2024-05-03 12:00:00",
        ])
    );
    assert_eq!(store.style_of(3).await, Some(RowStyle::Removed));

    store.clear_ops().await;
    let again = run_sync_at(&source, &store, &settings(), stamp(4)).await.unwrap();
    assert_eq!(again.newly_removed, 0);
    assert!(store.ops().await.iter().all(|op| !op.is_mutation()));
}

#[tokio::test]
async fn test_relisted_listing_reactivates_in_place() {
    let source = FixedSource::new(two_listings());
    let store = seeded_store(&source).await;
    source.set(vec![listing("1", Decimal::from(10))]).await;
    run_sync_at(&source, &store, &settings(), stamp(3)).await.unwrap();

    source.set(two_listings()).await;
    store.clear_ops().await;
    let summary = run_sync_at(&source, &store, &settings(), stamp(4)).await.unwrap();

    assert_eq!(summary.new_listings, 0);
    let rows = store.rows().await;
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2][4], "13.50");
    assert_eq!(rows[2][6], "0");
    assert_eq!(rows[2][7], "Active");
    assert_eq!(store.style_of(3).await, Some(RowStyle::Normal));
}

#[tokio::test]
async fn test_user_floor_and_percent_respected() {
    let store = MemoryTableStore::with_rows(vec![
        header(),
        cells(&[
            "42",
            &item_url("42"),
            "Item 42",
            "20",
            "",
            "10",
            "-50",
            "Active",
            "",
        ]),
    ]);
    let source = FixedSource::new(vec![listing("42", Decimal::from(18))]);

    let summary = run_sync_at(&source, &store, &settings(), stamp(1)).await.unwrap();

    assert_eq!(summary.dirty_rows, 1);
    let row = &store.rows().await[1];
    assert_eq!(row[3], "18.00");
    assert_eq!(row[4], "10.00");
    assert_eq!(row[5], "10");
    assert_eq!(row[6], "-50");
}

#[tokio::test]
async fn test_legacy_layout_read_and_written_by_name() {
    let store = MemoryTableStore::with_rows(vec![
        cells(&["Price tracker"]),
        cells(&[
            "Item ID",
            "URL",
            "Title",
            "Current Price (€)",
            "New Price (€)",
            "Floor Price (€)",
            "Price Change %",
            "Status",
            "Last Updated",
        ]),
        cells(&[
            "7",
            &item_url("7"),
            "Item 7",
            "13,50 €",
            "13,50",
            "",
            "",
            "🆕 New",
            "",
        ]),
    ]);
    let source = FixedSource::new(vec![listing("7", Decimal::new(1350, 2))]);

    let summary = run_sync_at(&source, &store, &settings(), stamp(1)).await.unwrap();

    assert!(!summary.bootstrapped);
    assert_eq!(
        store.ops().await[1],
        StoreOp::Write(CellRange::row(3, 9))
    );
    let row = &store.rows().await[2];
    assert_eq!(row[3], "13.50");
    // Blank percent falls back to the default of -2.
    assert_eq!(row[4], "13.23");
    assert_eq!(row[6], "");
    assert_eq!(row[7], "Active");
}

#[tokio::test]
async fn test_failed_write_recovered_by_next_run() {
    let source = FixedSource::new(
        (1..=5)
            .map(|i| listing(&i.to_string(), Decimal::from(10 + i)))
            .collect(),
    );
    let store = seeded_store(&source).await;

    // Rows 2, 4 and 6 move: three separate groups.
    source
        .set(
            (1..=5)
                .map(|i| {
                    let bump = if i % 2 == 1 { 5 } else { 0 };
                    listing(&i.to_string(), Decimal::from(10 + i + bump))
                })
                .collect(),
        )
        .await;
    store.fail_after(1).await;

    let err = run_sync_at(&source, &store, &settings(), stamp(3)).await.unwrap_err();
    assert!(matches!(err, SyncError::Store(_)));
    assert_eq!(store.rows().await[1][3], "16.00");
    assert_eq!(store.rows().await[3][3], "13.00");

    store.heal().await;
    store.clear_ops().await;
    let summary = run_sync_at(&source, &store, &settings(), stamp(4)).await.unwrap();

    assert_eq!(summary.dirty_rows, 2);
    assert_eq!(
        store.ops().await,
        vec![
            StoreOp::Read(CellRange::whole_sheet()),
            StoreOp::Write(CellRange::row(4, 9)),
            StoreOp::Write(CellRange::row(6, 9)),
        ]
    );
    assert_eq!(store.rows().await[3][3], "18.00");
    assert_eq!(store.rows().await[5][3], "20.00");
}

#[tokio::test]
async fn test_empty_snapshot_leaves_table_alone() {
    let source = FixedSource::new(two_listings());
    let store = seeded_store(&source).await;
    source.set(vec![]).await;

    let err = run_sync_at(&source, &store, &settings(), stamp(3)).await.unwrap_err();

    assert!(matches!(err, SyncError::EmptySnapshot));
    assert!(store.ops().await.is_empty());
    assert_eq!(store.rows().await[2][7], "Active");
}

#[tokio::test]
async fn test_huge_percent_cell_does_not_abort_run() {
    let store = MemoryTableStore::with_rows(vec![
        header(),
        cells(&["1", &item_url("1"), "Item 1", "10", "", "", "-2", "Active", ""]),
        cells(&[
            "7",
            &item_url("7"),
            "Item 7",
            "1000",
            "",
            "",
            "79228162514264337593543950335",
            "Active",
            "",
        ]),
    ]);
    let source = FixedSource::new(vec![
        listing("1", Decimal::from(12)),
        listing("7", Decimal::from(1000)),
    ]);

    let summary = run_sync_at(&source, &store, &settings(), stamp(1)).await.unwrap();

    assert_eq!(summary.diagnostics, 1);
    assert_eq!(summary.repricing_candidates, 2);
    let rows = store.rows().await;
    assert_eq!(rows[1][3], "12.00");
    assert_eq!(rows[1][4], "11.76");
    // The oversized cell is left for the user to fix.
    assert_eq!(rows[2][6], "79228162514264337593543950335");
}
