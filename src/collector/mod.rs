pub mod types;
pub mod wardrobe_client;

pub use wardrobe_client::WardrobeClient;

use async_trait::async_trait;

use crate::errors::CollectorError;
use crate::models::Listing;

/// Produces the current snapshot of a seller's listings.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_listings(&self) -> Result<Vec<Listing>, CollectorError>;
}
