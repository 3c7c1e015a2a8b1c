//! Catalog importer: dealer resolution, duplicate detection, and insert
//! orchestration against the catalog store.
//!
//! The importer is scoped to one run of one source. Its dealer and category
//! caches are plain fields, so repeated lookups within a run are cheap and
//! nothing leaks across runs.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::{
    CatalogError, CatalogStore, NewCatalogListing, NewDealer, NewListingImage,
};
use crate::models::{DealerSeed, NormalizedListing};
use crate::taxonomy::FALLBACK_CATEGORY;

/// Result of importing one normalized listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported,
    SkippedDuplicate,
    SkippedNoImages,
    Error(String),
}

impl ImportOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Imported => "imported",
            Self::SkippedDuplicate => "skipped_duplicate",
            Self::SkippedNoImages => "skipped_no_images",
            Self::Error(_) => "error",
        }
    }
}

/// Importer for one source's run against the catalog store.
pub struct CatalogImporter {
    store: Arc<dyn CatalogStore>,
    seed: DealerSeed,
    require_images: bool,
    /// company name -> dealer id, scoped to this run.
    dealer_cache: HashMap<String, String>,
    /// category slug -> category id, scoped to this run.
    category_cache: HashMap<String, i64>,
}

impl CatalogImporter {
    pub fn new(store: Arc<dyn CatalogStore>, seed: DealerSeed, require_images: bool) -> Self {
        Self {
            store,
            seed,
            require_images,
            dealer_cache: HashMap::new(),
            category_cache: HashMap::new(),
        }
    }

    /// Import one listing. Failures are per-listing: an `Error` outcome never
    /// aborts the batch.
    pub async fn import(&mut self, listing: &NormalizedListing) -> ImportOutcome {
        match self.try_import(listing).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!("import failed for `{}`: {}", listing.title, error);
                ImportOutcome::Error(error.to_string())
            }
        }
    }

    async fn try_import(
        &mut self,
        listing: &NormalizedListing,
    ) -> Result<ImportOutcome, CatalogError> {
        let dealer_id = self.resolve_dealer().await?;

        // Duplicate check: (dealer, title) pair, then the stronger
        // identifiers where the source provided them.
        if self
            .store
            .find_listing_by_title(&dealer_id, &listing.title)
            .await?
            .is_some()
        {
            return Ok(ImportOutcome::SkippedDuplicate);
        }
        if let Some(vin) = &listing.vin {
            if self.store.find_listing_by_vin(vin).await?.is_some() {
                return Ok(ImportOutcome::SkippedDuplicate);
            }
        } else if let Some(stock) = &listing.stock_number {
            if self
                .store
                .find_listing_by_stock(&dealer_id, stock)
                .await?
                .is_some()
            {
                return Ok(ImportOutcome::SkippedDuplicate);
            }
        }

        if self.require_images && listing.images.is_empty() {
            return Ok(ImportOutcome::SkippedNoImages);
        }

        let category_id = self.resolve_category(&listing.category_slug).await?;

        let row = self
            .store
            .insert_listing(&NewCatalogListing {
                dealer_id,
                category_id,
                title: listing.title.clone(),
                year: listing.year,
                make: listing.make.clone(),
                model: listing.model.clone(),
                vin: listing.vin.clone(),
                stock_number: listing.stock_number.clone(),
                price: listing.price,
                condition: listing.condition.as_str().to_string(),
                city: listing.city.clone(),
                state: listing.state.clone(),
                source_url: listing.source_url.clone(),
            })
            .await?;

        let images: Vec<NewListingImage> = listing
            .images
            .iter()
            .enumerate()
            .map(|(index, url)| NewListingImage {
                listing_id: row.id.clone(),
                url: url.clone(),
                sort_index: index as i32,
                is_primary: index == 0,
            })
            .collect();
        self.store.insert_images(&images).await?;

        debug!(
            "imported `{}` as {} ({})",
            listing.title,
            row.id,
            listing.fingerprint(&self.seed.company)
        );
        Ok(ImportOutcome::Imported)
    }

    /// Resolve the owning dealer account, creating it on first miss.
    /// Lookups are keyed on company name before any create, so repeated runs
    /// are idempotent.
    async fn resolve_dealer(&mut self) -> Result<String, CatalogError> {
        let company = self.seed.company.clone();
        if let Some(id) = self.dealer_cache.get(&company) {
            return Ok(id.clone());
        }
        if let Some(profile) = self.store.find_dealer_by_company(&company).await? {
            self.dealer_cache.insert(company, profile.id.clone());
            return Ok(profile.id);
        }

        let dealer = NewDealer {
            company_name: company.clone(),
            phone: self.seed.phone.clone(),
            city: self.seed.city.clone(),
            state: self.seed.state.clone(),
            website: self.seed.website.clone(),
            login_email: format!("{}@dealers.axles.ai", slugify(&company)),
            password: Uuid::new_v4().simple().to_string(),
        };
        let profile = self.store.create_dealer(&dealer).await?;
        info!("provisioned dealer account for `{}`", company);
        self.dealer_cache.insert(company, profile.id.clone());
        Ok(profile.id)
    }

    /// Resolve a category slug to its id, falling back to the generic
    /// catch-all when the slug is missing from the catalog's table.
    async fn resolve_category(&mut self, slug: &str) -> Result<i64, CatalogError> {
        if let Some(id) = self.category_cache.get(slug) {
            return Ok(*id);
        }
        let category = match self.store.find_category_by_slug(slug).await? {
            Some(category) => category,
            None => self
                .store
                .find_category_by_slug(FALLBACK_CATEGORY)
                .await?
                .ok_or_else(|| {
                    CatalogError::Constraint(format!(
                        "category table has neither `{slug}` nor `{FALLBACK_CATEGORY}`"
                    ))
                })?,
        };
        // Cache under the requested slug so the fallback is looked up once.
        self.category_cache.insert(slug.to_string(), category.id);
        Ok(category.id)
    }
}

/// Lowercase, alphanumeric-and-dashes slug of a company name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::models::Condition;

    fn seed() -> DealerSeed {
        DealerSeed {
            company: "Interstate Truck Sales".to_string(),
            phone: Some("555-0100".to_string()),
            city: Some("Tulsa".to_string()),
            state: Some("OK".to_string()),
            website: Some("https://trucks.example.com".to_string()),
        }
    }

    fn listing(title: &str) -> NormalizedListing {
        NormalizedListing {
            title: title.to_string(),
            year: Some(2021),
            make: Some("Peterbilt".to_string()),
            model: Some("579".to_string()),
            vin: None,
            stock_number: None,
            price: Some(89_500),
            condition: Condition::Used,
            city: Some("Tulsa".to_string()),
            state: Some("OK".to_string()),
            category_slug: "sleeper-trucks".to_string(),
            images: vec!["https://cdn.example.com/a.jpg".to_string()],
            source_url: "https://trucks.example.com/listing/579".to_string(),
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Interstate Truck Sales"), "interstate-truck-sales");
        assert_eq!(slugify("A & B Trailers, LLC"), "a-b-trailers-llc");
        assert_eq!(slugify("--"), "");
    }

    #[tokio::test]
    async fn test_import_then_duplicate() {
        let store = Arc::new(MemoryCatalog::with_taxonomy());
        let mut importer = CatalogImporter::new(store.clone(), seed(), true);

        let first = importer.import(&listing("2021 Peterbilt 579 Sleeper")).await;
        assert_eq!(first, ImportOutcome::Imported);
        let second = importer.import(&listing("2021 Peterbilt 579 Sleeper")).await;
        assert_eq!(second, ImportOutcome::SkippedDuplicate);
        // The catalog gained exactly one listing row.
        assert_eq!(store.listing_count(), 1);
    }

    #[tokio::test]
    async fn test_vin_duplicate_detected_across_titles() {
        let store = Arc::new(MemoryCatalog::with_taxonomy());
        let mut importer = CatalogImporter::new(store.clone(), seed(), true);

        let mut original = listing("2021 Peterbilt 579 Sleeper");
        original.vin = Some("1XPBDP9X1MD123456".to_string());
        assert_eq!(importer.import(&original).await, ImportOutcome::Imported);

        let mut renamed = listing("PETERBILT 579 - PRICE REDUCED");
        renamed.vin = Some("1XPBDP9X1MD123456".to_string());
        assert_eq!(
            importer.import(&renamed).await,
            ImportOutcome::SkippedDuplicate
        );
    }

    #[tokio::test]
    async fn test_no_images_policy() {
        let store = Arc::new(MemoryCatalog::with_taxonomy());

        let mut strict = CatalogImporter::new(store.clone(), seed(), true);
        let mut bare = listing("2020 Wabash Dry Van");
        bare.images.clear();
        assert_eq!(strict.import(&bare).await, ImportOutcome::SkippedNoImages);
        assert_eq!(store.listing_count(), 0);

        // Some ingestion paths accept image-less listings.
        let mut lenient = CatalogImporter::new(store.clone(), seed(), false);
        assert_eq!(lenient.import(&bare).await, ImportOutcome::Imported);
    }

    #[tokio::test]
    async fn test_dealer_created_once() {
        let store = Arc::new(MemoryCatalog::with_taxonomy());
        let mut importer = CatalogImporter::new(store.clone(), seed(), true);

        importer.import(&listing("2021 Peterbilt 579 Sleeper")).await;
        importer.import(&listing("2019 Kenworth T680 Sleeper")).await;
        assert_eq!(store.dealer_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_slug_falls_back() {
        let store = Arc::new(MemoryCatalog::with_taxonomy());
        let mut importer = CatalogImporter::new(store.clone(), seed(), true);

        let mut odd = listing("Custom rig");
        odd.category_slug = "not-a-real-slug".to_string();
        assert_eq!(importer.import(&odd).await, ImportOutcome::Imported);
    }

    #[tokio::test]
    async fn test_write_failure_is_per_listing() {
        // Empty category table: resolve_category fails, but the outcome is
        // an error for that listing, and the next import still proceeds.
        let store = Arc::new(MemoryCatalog::new());
        let mut importer = CatalogImporter::new(store.clone(), seed(), true);

        let outcome = importer.import(&listing("2021 Peterbilt 579 Sleeper")).await;
        assert!(matches!(outcome, ImportOutcome::Error(_)));
        assert_eq!(store.listing_count(), 0);
        // Dealer resolution already happened; nothing else was written.
        assert_eq!(store.dealer_count(), 1);
    }
}
