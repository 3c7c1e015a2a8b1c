//! In-process catalog store for tests and dry runs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{
    CatalogError, CatalogListing, CatalogStore, Category, DealerProfile, NewCatalogListing,
    NewDealer, NewListingImage,
};
use crate::taxonomy;

#[derive(Debug, Default)]
struct Inner {
    dealers: Vec<DealerProfile>,
    categories: Vec<Category>,
    listings: Vec<CatalogListing>,
    images: Vec<StoredImage>,
    next_id: u64,
}

/// Image row as stored, exposed through [`MemoryCatalog::images_for`].
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub listing_id: String,
    pub url: String,
    pub sort_index: i32,
    pub is_primary: bool,
}

/// Catalog store backed by in-process vectors behind a mutex.
///
/// Enforces the same uniqueness the importer relies on - (dealer, title)
/// pairs, VINs, per-dealer stock numbers - so importer tests exercise real
/// constraint behavior.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    inner: Mutex<Inner>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with the full category taxonomy, one row per slug.
    pub fn with_taxonomy() -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.lock().unwrap();
            for (index, slug) in taxonomy::all_slugs().iter().enumerate() {
                inner.categories.push(Category {
                    id: index as i64 + 1,
                    slug: slug.to_string(),
                    name: slug.replace('-', " "),
                    parent_id: None,
                });
            }
        }
        store
    }

    fn next_id(inner: &mut Inner, prefix: &str) -> String {
        inner.next_id += 1;
        format!("{prefix}-{:04}", inner.next_id)
    }

    pub fn dealer_count(&self) -> usize {
        self.inner.lock().unwrap().dealers.len()
    }

    pub fn listing_count(&self) -> usize {
        self.inner.lock().unwrap().listings.len()
    }

    /// Image rows for a listing, in sort order.
    pub fn images_for(&self, listing_id: &str) -> Vec<StoredImage> {
        let inner = self.inner.lock().unwrap();
        let mut images: Vec<StoredImage> = inner
            .images
            .iter()
            .filter(|image| image.listing_id == listing_id)
            .cloned()
            .collect();
        images.sort_by_key(|image| image.sort_index);
        images
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn find_dealer_by_company(
        &self,
        company: &str,
    ) -> Result<Option<DealerProfile>, CatalogError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .dealers
            .iter()
            .find(|dealer| dealer.company_name == company)
            .cloned())
    }

    async fn create_dealer(&self, dealer: &NewDealer) -> Result<DealerProfile, CatalogError> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .dealers
            .iter()
            .any(|existing| existing.company_name == dealer.company_name)
        {
            return Err(CatalogError::Constraint(format!(
                "dealer `{}` already exists",
                dealer.company_name
            )));
        }
        let profile = DealerProfile {
            id: Self::next_id(&mut inner, "dealer"),
            company_name: dealer.company_name.clone(),
            phone: dealer.phone.clone(),
            city: dealer.city.clone(),
            state: dealer.state.clone(),
            website: dealer.website.clone(),
        };
        inner.dealers.push(profile.clone());
        Ok(profile)
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, CatalogError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .categories
            .iter()
            .find(|category| category.slug == slug)
            .cloned())
    }

    async fn find_listing_by_title(
        &self,
        dealer_id: &str,
        title: &str,
    ) -> Result<Option<CatalogListing>, CatalogError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .listings
            .iter()
            .find(|listing| listing.dealer_id == dealer_id && listing.title == title)
            .cloned())
    }

    async fn find_listing_by_vin(&self, vin: &str) -> Result<Option<CatalogListing>, CatalogError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .listings
            .iter()
            .find(|listing| listing.vin.as_deref() == Some(vin))
            .cloned())
    }

    async fn find_listing_by_stock(
        &self,
        dealer_id: &str,
        stock_number: &str,
    ) -> Result<Option<CatalogListing>, CatalogError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .listings
            .iter()
            .find(|listing| {
                listing.dealer_id == dealer_id
                    && listing.stock_number.as_deref() == Some(stock_number)
            })
            .cloned())
    }

    async fn insert_listing(
        &self,
        listing: &NewCatalogListing,
    ) -> Result<CatalogListing, CatalogError> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .listings
            .iter()
            .any(|existing| {
                existing.dealer_id == listing.dealer_id && existing.title == listing.title
            })
        {
            return Err(CatalogError::Constraint(format!(
                "duplicate listing `{}`",
                listing.title
            )));
        }
        if let Some(vin) = &listing.vin {
            if inner
                .listings
                .iter()
                .any(|existing| existing.vin.as_deref() == Some(vin))
            {
                return Err(CatalogError::Constraint(format!("duplicate VIN `{vin}`")));
            }
        }
        let row = CatalogListing {
            id: Self::next_id(&mut inner, "listing"),
            dealer_id: listing.dealer_id.clone(),
            title: listing.title.clone(),
            vin: listing.vin.clone(),
            stock_number: listing.stock_number.clone(),
        };
        inner.listings.push(row.clone());
        Ok(row)
    }

    async fn insert_images(&self, images: &[NewListingImage]) -> Result<(), CatalogError> {
        let mut inner = self.inner.lock().unwrap();
        for image in images {
            inner.images.push(StoredImage {
                listing_id: image.listing_id.clone(),
                url: image.url.clone(),
                sort_index: image.sort_index,
                is_primary: image.is_primary,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dealer_lookup_and_create() {
        let store = MemoryCatalog::new();
        assert!(store
            .find_dealer_by_company("Midwest Trailer Sales")
            .await
            .unwrap()
            .is_none());

        let dealer = store
            .create_dealer(&NewDealer {
                company_name: "Midwest Trailer Sales".to_string(),
                phone: None,
                city: Some("Des Moines".to_string()),
                state: Some("IA".to_string()),
                website: None,
                login_email: "midwest-trailer-sales@dealers.axles.example".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();

        let found = store
            .find_dealer_by_company("Midwest Trailer Sales")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, dealer.id);
    }

    #[tokio::test]
    async fn test_duplicate_listing_rejected() {
        let store = MemoryCatalog::with_taxonomy();
        let listing = NewCatalogListing {
            dealer_id: "dealer-1".to_string(),
            category_id: 1,
            title: "2019 Great Dane Reefer".to_string(),
            year: Some(2019),
            make: Some("Great Dane".to_string()),
            model: None,
            vin: None,
            stock_number: None,
            price: Some(45_000),
            condition: "used".to_string(),
            city: None,
            state: None,
            source_url: String::new(),
        };
        store.insert_listing(&listing).await.unwrap();
        let err = store.insert_listing(&listing).await.unwrap_err();
        assert!(matches!(err, CatalogError::Constraint(_)));
        assert_eq!(store.listing_count(), 1);
    }

    #[tokio::test]
    async fn test_taxonomy_seeded() {
        let store = MemoryCatalog::with_taxonomy();
        assert!(store
            .find_category_by_slug("sleeper-trucks")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_category_by_slug("specialty")
            .await
            .unwrap()
            .is_some());
    }
}
