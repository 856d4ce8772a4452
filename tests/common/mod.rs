use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::time::Duration;
use tokio::sync::Mutex;

use pricebot::collector::ListingSource;
use pricebot::config::SyncSettings;
use pricebot::errors::CollectorError;
use pricebot::models::Listing;
use pricebot::table::ColumnMap;

/// Listing source whose snapshot tests swap between runs.
#[allow(dead_code)]
#[derive(Default)]
pub struct FixedSource {
    listings: Mutex<Vec<Listing>>,
}

#[allow(dead_code)]
impl FixedSource {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self {
            listings: Mutex::new(listings),
        }
    }

    pub async fn set(&self, listings: Vec<Listing>) {
        *self.listings.lock().await = listings;
    }
}

#[async_trait]
impl ListingSource for FixedSource {
    async fn fetch_listings(&self) -> Result<Vec<Listing>, CollectorError> {
        Ok(self.listings.lock().await.clone())
    }
}

#[allow(dead_code)]
pub fn listing(id: &str, price: Decimal) -> Listing {
    Listing::new(id, format!("Item {id}"), price, item_url(id))
}

pub fn item_url(id: &str) -> String {
    format!("https://x.test/items/{id}")
}

#[allow(dead_code)]
pub fn header() -> Vec<String> {
    ColumnMap::canonical().header_cells()
}

#[allow(dead_code)]
pub fn cells(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Zero write delay so runs do not sleep.
#[allow(dead_code)]
pub fn settings() -> SyncSettings {
    SyncSettings {
        write_group_delay: Duration::ZERO,
        ..SyncSettings::default()
    }
}

/// Noon on the given day of May 2024.
#[allow(dead_code)]
pub fn stamp(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, day)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}
