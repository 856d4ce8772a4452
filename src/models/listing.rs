use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ListingStatus;

/// One listing as observed on the marketplace during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub price: Decimal,
    pub url: String,
}

impl Listing {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        price: Decimal,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price,
            url: url.into(),
        }
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) @ {}", self.title, self.id, self.price)
    }
}

/// A snapshot listing after reconciliation: its lifecycle state, the
/// effective pricing policy and whether its persisted row must be rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedListing {
    pub listing: Listing,
    pub status: ListingStatus,
    /// Percent actually applied this run (0 for new discoveries).
    pub price_change_percent: Decimal,
    pub floor_price: Option<Decimal>,
    pub new_price: Decimal,
    /// True when `new_price` was raised to `floor_price`.
    pub floor_applied: bool,
    pub dirty: bool,
    /// Physical row of the existing tracked row, `None` on first sighting.
    pub row_index: Option<usize>,
}

impl AnnotatedListing {
    pub fn id(&self) -> &str {
        &self.listing.id
    }

    pub fn is_new_discovery(&self) -> bool {
        self.row_index.is_none()
    }

    /// The listing's live price differs from the computed target.
    pub fn needs_reprice(&self) -> bool {
        self.status != ListingStatus::New && self.new_price != self.listing.price
    }
}
