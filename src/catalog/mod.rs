//! Catalog store interface.
//!
//! The hosted marketplace store owns dealers, categories, listings, and
//! listing images; the pipeline only talks to it through this trait. The
//! production backend is [`RestCatalog`]; [`MemoryCatalog`] backs tests and
//! dry runs.

mod memory;
mod rest;

pub use memory::{MemoryCatalog, StoredImage};
pub use rest::RestCatalog;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by a catalog store backend.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("catalog returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("catalog response missing field `{0}`")]
    MissingField(&'static str),
    #[error("constraint violated: {0}")]
    Constraint(String),
}

/// A dealer profile row, keyed in practice by company name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealerProfile {
    pub id: String,
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// Payload for provisioning a dealer: a fresh authentication identity plus
/// the profile row seeded with contact metadata.
#[derive(Debug, Clone)]
pub struct NewDealer {
    pub company_name: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub website: Option<String>,
    /// Synthetic login for the created identity.
    pub login_email: String,
    /// One-time password; the auth service owns hashing.
    pub password: String,
}

/// A category taxonomy row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub slug: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

/// The durable listing row as the store reports it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogListing {
    pub id: String,
    pub dealer_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_number: Option<String>,
}

/// Payload for inserting a listing row.
#[derive(Debug, Clone, Serialize)]
pub struct NewCatalogListing {
    pub dealer_id: String,
    pub category_id: i64,
    pub title: String,
    pub year: Option<u16>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub vin: Option<String>,
    pub stock_number: Option<String>,
    pub price: Option<u32>,
    pub condition: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub source_url: String,
}

/// Payload for inserting one listing image row.
#[derive(Debug, Clone, Serialize)]
pub struct NewListingImage {
    pub listing_id: String,
    pub url: String,
    /// Preserves extraction order.
    pub sort_index: i32,
    pub is_primary: bool,
}

/// The operations the importer needs from the hosted store.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Look a dealer profile up by its company name.
    async fn find_dealer_by_company(
        &self,
        company: &str,
    ) -> Result<Option<DealerProfile>, CatalogError>;

    /// Create an authentication identity plus profile row.
    async fn create_dealer(&self, dealer: &NewDealer) -> Result<DealerProfile, CatalogError>;

    /// Look a category up by slug.
    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, CatalogError>;

    /// Look a listing up by its (dealer, title) pair.
    async fn find_listing_by_title(
        &self,
        dealer_id: &str,
        title: &str,
    ) -> Result<Option<CatalogListing>, CatalogError>;

    /// Look a listing up by VIN, across all dealers.
    async fn find_listing_by_vin(&self, vin: &str) -> Result<Option<CatalogListing>, CatalogError>;

    /// Look a listing up by stock number within one dealer's inventory.
    async fn find_listing_by_stock(
        &self,
        dealer_id: &str,
        stock_number: &str,
    ) -> Result<Option<CatalogListing>, CatalogError>;

    /// Insert a listing row.
    async fn insert_listing(
        &self,
        listing: &NewCatalogListing,
    ) -> Result<CatalogListing, CatalogError>;

    /// Insert the image rows for a listing.
    async fn insert_images(&self, images: &[NewListingImage]) -> Result<(), CatalogError>;
}
