pub mod listing;
pub mod tracked_row;

pub use listing::{AnnotatedListing, Listing};
pub use tracked_row::{TrackedRow, TrackedTable};

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ListingStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a tracked listing.
///
/// `New` on first sighting, `Active` on every later run that still observes
/// the listing, `SoldRemoved` once it disappears from the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListingStatus {
    New,
    Active,
    SoldRemoved,
}

impl ListingStatus {
    /// Label written into the status column.
    pub fn label(&self) -> &'static str {
        match self {
            ListingStatus::New => "New",
            ListingStatus::Active => "Active",
            ListingStatus::SoldRemoved => "Sold/Removed",
        }
    }

    /// Parse a status cell. Accepts the decorated labels older tables carry
    /// (`🆕 New`, `❌ Sold/Removed`) as well as bare words in any case.
    pub fn from_label(s: &str) -> Option<Self> {
        let cleaned: String = s
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '/')
            .collect::<String>()
            .to_lowercase();

        match cleaned.as_str() {
            "new" => Some(ListingStatus::New),
            "active" => Some(ListingStatus::Active),
            "sold/removed" | "sold" | "removed" | "soldremoved" => Some(ListingStatus::SoldRemoved),
            _ => None,
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
