//! REST backend for the hosted marketplace store.
//!
//! The store fronts its relational schema with a PostgREST-style API plus an
//! admin auth endpoint; the service key authorizes both. Each trait method
//! maps to one or two requests - there is no client-side transaction, which
//! matches the check-then-act contract the importer is written against.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::{
    CatalogError, CatalogListing, CatalogStore, Category, DealerProfile, NewCatalogListing,
    NewDealer, NewListingImage,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Catalog store client over the hosted store's HTTP API.
#[derive(Debug, Clone)]
pub struct RestCatalog {
    http: Client,
    base_url: String,
    service_key: String,
}

impl RestCatalog {
    pub fn new(base_url: &str, service_key: &str) -> Result<Self, CatalogError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn check(response: Response) -> Result<Response, CatalogError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(CatalogError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// `SELECT ... LIMIT 1` against a table with PostgREST filters.
    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Option<T>, CatalogError> {
        let mut request = self.authed(self.http.get(self.table_url(table)));
        for (column, filter) in filters {
            request = request.query(&[(*column, filter.as_str())]);
        }
        request = request.query(&[("limit", "1")]);
        let response = Self::check(request.send().await?).await?;
        let mut rows: Vec<T> = response.json().await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    /// Insert a row and return its representation.
    async fn insert_returning<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        table: &str,
        body: &B,
        missing: &'static str,
    ) -> Result<T, CatalogError> {
        let request = self
            .authed(self.http.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(body);
        let response = Self::check(request.send().await?).await?;
        let mut rows: Vec<T> = response.json().await?;
        if rows.is_empty() {
            return Err(CatalogError::MissingField(missing));
        }
        Ok(rows.swap_remove(0))
    }
}

#[async_trait]
impl CatalogStore for RestCatalog {
    async fn find_dealer_by_company(
        &self,
        company: &str,
    ) -> Result<Option<DealerProfile>, CatalogError> {
        self.select_one(
            "dealer_profiles",
            &[("company_name", format!("eq.{company}"))],
        )
        .await
    }

    async fn create_dealer(&self, dealer: &NewDealer) -> Result<DealerProfile, CatalogError> {
        // Auth identity first; the profile row reuses its id.
        let request = self
            .authed(
                self.http
                    .post(format!("{}/auth/v1/admin/users", self.base_url)),
            )
            .json(&json!({
                "email": dealer.login_email,
                "password": dealer.password,
                "email_confirm": true,
            }));
        let response = Self::check(request.send().await?).await?;
        let identity: serde_json::Value = response.json().await?;
        let identity_id = identity
            .get("id")
            .and_then(|id| id.as_str())
            .ok_or(CatalogError::MissingField("id"))?
            .to_string();

        self.insert_returning(
            "dealer_profiles",
            &json!({
                "id": identity_id,
                "company_name": dealer.company_name,
                "phone": dealer.phone,
                "city": dealer.city,
                "state": dealer.state,
                "website": dealer.website,
            }),
            "dealer_profiles",
        )
        .await
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, CatalogError> {
        self.select_one("categories", &[("slug", format!("eq.{slug}"))])
            .await
    }

    async fn find_listing_by_title(
        &self,
        dealer_id: &str,
        title: &str,
    ) -> Result<Option<CatalogListing>, CatalogError> {
        self.select_one(
            "listings",
            &[
                ("dealer_id", format!("eq.{dealer_id}")),
                ("title", format!("eq.{title}")),
            ],
        )
        .await
    }

    async fn find_listing_by_vin(&self, vin: &str) -> Result<Option<CatalogListing>, CatalogError> {
        self.select_one("listings", &[("vin", format!("eq.{vin}"))])
            .await
    }

    async fn find_listing_by_stock(
        &self,
        dealer_id: &str,
        stock_number: &str,
    ) -> Result<Option<CatalogListing>, CatalogError> {
        self.select_one(
            "listings",
            &[
                ("dealer_id", format!("eq.{dealer_id}")),
                ("stock_number", format!("eq.{stock_number}")),
            ],
        )
        .await
    }

    async fn insert_listing(
        &self,
        listing: &NewCatalogListing,
    ) -> Result<CatalogListing, CatalogError> {
        self.insert_returning("listings", listing, "listings").await
    }

    async fn insert_images(&self, images: &[NewListingImage]) -> Result<(), CatalogError> {
        if images.is_empty() {
            return Ok(());
        }
        let request = self
            .authed(self.http.post(self.table_url("listing_images")))
            .header("Prefer", "return=minimal")
            .json(images);
        Self::check(request.send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url() {
        let catalog = RestCatalog::new("https://store.axles.example/", "key").unwrap();
        assert_eq!(
            catalog.table_url("listings"),
            "https://store.axles.example/rest/v1/listings"
        );
    }
}
