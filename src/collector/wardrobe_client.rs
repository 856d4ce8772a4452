use async_trait::async_trait;
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::future::Future;

use super::types::{ApiItem, WardrobePage};
use super::ListingSource;
use crate::engine::cells::parse_decimal;
use crate::errors::CollectorError;
use crate::models::Listing;

const PER_PAGE: u32 = 96;
const MAX_PAGES: u32 = 200;

/// Pages through a seller's public wardrobe.
#[derive(Debug, Clone)]
pub struct WardrobeClient {
    http: Client,
    base_url: String,
    profile_id: String,
}

impl WardrobeClient {
    pub fn new(http: Client, base_url: impl Into<String>, profile_id: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            profile_id: profile_id.into(),
        }
    }

    /// Build a client from a profile link such as
    /// `https://www.vinted.fr/member/12345678-someone`.
    pub fn from_profile_url(
        http: Client,
        profile_url: &str,
        base_url: Option<&str>,
    ) -> Result<Self, CollectorError> {
        let url = Url::parse(profile_url)
            .map_err(|e| CollectorError::InvalidProfile(format!("{profile_url}: {e}")))?;
        let profile_id = profile_id(&url)
            .ok_or_else(|| CollectorError::InvalidProfile(profile_url.to_string()))?;
        let base = match base_url {
            Some(b) => b.to_string(),
            None => url.origin().ascii_serialization(),
        };
        Ok(Self::new(http, base, profile_id))
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    fn page_url(&self, page: u32) -> Result<Url, CollectorError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| CollectorError::Unexpected(format!("bad base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| CollectorError::Unexpected("base url cannot hold a path".into()))?
            .pop_if_empty()
            .extend(["api", "v2", "wardrobe", self.profile_id.as_str(), "items"]);
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &PER_PAGE.to_string())
            .append_pair("order", "relevance");
        Ok(url)
    }

    async fn fetch_page(&self, page: u32) -> Result<WardrobePage, CollectorError> {
        let url = self.page_url(page)?;
        let resp = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?;

        let body: WardrobePage = resp.json().await?;
        Ok(body)
    }
}

#[async_trait]
impl ListingSource for WardrobeClient {
    async fn fetch_listings(&self) -> Result<Vec<Listing>, CollectorError> {
        let listings = collect_pages(&self.base_url, |page| self.fetch_page(page)).await?;
        tracing::info!(
            profile = %self.profile_id,
            listings = listings.len(),
            "Listings collected"
        );
        Ok(listings)
    }
}

/// Walk pages from 1 until an empty page or the reported last page,
/// keeping the first occurrence of each id. More than `MAX_PAGES` pages is
/// an error, never a partial snapshot.
async fn collect_pages<F, Fut>(base_url: &str, mut fetch_page: F) -> Result<Vec<Listing>, CollectorError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<WardrobePage, CollectorError>>,
{
    let mut listings = Vec::new();
    let mut seen = HashSet::new();
    let mut page = 1;

    loop {
        let body = fetch_page(page).await?;
        let total_pages = body
            .pagination
            .as_ref()
            .and_then(|p| p.total_pages)
            .unwrap_or(page);
        let fetched = body.items.len();

        for item in body.items.iter().filter(|i| i.is_listed()) {
            let Some(listing) = listing_from_item(item, base_url) else {
                tracing::debug!(id = ?item.id, "Item without usable id skipped");
                continue;
            };
            if seen.insert(listing.id.clone()) {
                listings.push(listing);
            }
        }

        tracing::debug!(page, total_pages, fetched, "Wardrobe page fetched");
        if fetched == 0 || page >= total_pages {
            return Ok(listings);
        }
        if page >= MAX_PAGES {
            return Err(CollectorError::Unexpected(format!(
                "wardrobe reports {total_pages} pages, more than the {MAX_PAGES} page limit"
            )));
        }
        page += 1;
    }
}

/// Numeric member id from the last path segment (`12345678-someone`).
fn profile_id(url: &Url) -> Option<String> {
    let last = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let id: String = last.chars().take_while(|c| c.is_ascii_digit()).collect();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

pub(crate) fn listing_from_item(item: &ApiItem, base_url: &str) -> Option<Listing> {
    let id = item.id_text()?;
    let raw_price = item.price_text();
    let parsed = parse_decimal(raw_price.as_deref());
    if let Some(raw) = parsed.recovered() {
        tracing::debug!(%id, raw, "Unparsable price, using 0");
    }
    let price = parsed.unwrap_or(Decimal::ZERO);

    let link = item
        .url
        .as_deref()
        .or(item.path.as_deref())
        .map(|u| absolute_url(base_url, u))
        .unwrap_or_else(|| format!("{base_url}/items/{id}"));

    Some(Listing::new(
        id.clone(),
        clean_title(item.title.as_deref(), &id),
        price,
        link,
    ))
}

/// Text before the first comma; blank titles become `Item {id}`.
pub fn clean_title(raw: Option<&str>, id: &str) -> String {
    let head = raw.unwrap_or_default().split(',').next().unwrap_or_default().trim();
    if head.is_empty() {
        format!("Item {id}")
    } else {
        head.to_string()
    }
}

pub fn absolute_url(base_url: &str, link: &str) -> String {
    let link = link.trim();
    if link.starts_with("http://") || link.starts_with("https://") {
        link.to_string()
    } else if link.starts_with('/') {
        format!("{}{link}", base_url.trim_end_matches('/'))
    } else {
        format!("{}/{link}", base_url.trim_end_matches('/'))
    }
}
