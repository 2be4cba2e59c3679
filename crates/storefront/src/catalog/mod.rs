//! Product catalog client.
//!
//! Reads the catalog document from disk or over HTTP(S) and caches the
//! parsed result using `moka` (5-minute TTL). Failed fetches are not cached,
//! so the next page load retries.

mod cache;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use medicart_core::{Catalog, CatalogError, Product, ProductId};
use moka::future::Cache;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::CatalogLocation;

use cache::CacheKey;

/// How long a parsed catalog is served before it is read again.
const CATALOG_TTL: Duration = Duration::from_secs(300);

/// Errors that can occur when loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogFetchError {
    /// The catalog file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The catalog URL could not be fetched.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The document is not a valid catalog.
    #[error(transparent)]
    Parse(#[from] CatalogError),
}

/// Client for the product catalog document.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    location: CatalogLocation,
    http: reqwest::Client,
    cache: Cache<CacheKey, Arc<Catalog>>,
}

impl CatalogClient {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(location: CatalogLocation) -> Self {
        let cache = Cache::builder()
            .max_capacity(4)
            .time_to_live(CATALOG_TTL)
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                location,
                http: reqwest::Client::new(),
                cache,
            }),
        }
    }

    /// Where this client reads the catalog from.
    #[must_use]
    pub fn location(&self) -> &CatalogLocation {
        &self.inner.location
    }

    /// Get the catalog, from cache if fresh.
    ///
    /// # Errors
    ///
    /// Returns `CatalogFetchError` if the document cannot be read or parsed.
    #[instrument(skip(self), fields(location = %self.inner.location))]
    pub async fn catalog(&self) -> Result<Arc<Catalog>, CatalogFetchError> {
        if let Some(catalog) = self.inner.cache.get(&CacheKey::Catalog).await {
            debug!("Catalog cache hit");
            return Ok(catalog);
        }

        let catalog = Arc::new(self.fetch().await?);
        self.inner
            .cache
            .insert(CacheKey::Catalog, Arc::clone(&catalog))
            .await;
        debug!(
            categories = catalog.categories.len(),
            "Catalog loaded and cached"
        );
        Ok(catalog)
    }

    /// Look up a product by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogFetchError` if the catalog cannot be loaded.
    pub async fn product(&self, id: &ProductId) -> Result<Option<Product>, CatalogFetchError> {
        Ok(self.catalog().await?.product(id).cloned())
    }

    /// Drop the cached catalog so the next call re-reads it.
    #[cfg(test)]
    async fn invalidate(&self) {
        self.inner.cache.invalidate(&CacheKey::Catalog).await;
    }

    async fn fetch(&self) -> Result<Catalog, CatalogFetchError> {
        let text = match &self.inner.location {
            CatalogLocation::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|source| CatalogFetchError::Io {
                    path: path.clone(),
                    source,
                })?,
            CatalogLocation::Remote(url) => {
                self.inner
                    .http
                    .get(url.clone())
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?
            }
        };

        Ok(Catalog::parse(&text)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CATALOG_JSON: &str = r#"{"categories":[{"name":"Vitamins","products":[
        {"id":"vitamin-c","name":"Vitamin C","description":"1000mg","image":"vc.png","price":9.99}
    ]}]}"#;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("medicart-catalog-{}.json", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_reads_file_and_looks_up_product() {
        let path = temp_path();
        tokio::fs::write(&path, CATALOG_JSON).await.unwrap();

        let client = CatalogClient::new(CatalogLocation::File(path.clone()));
        let product = client
            .product(&ProductId::new("vitamin-c"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.name, "Vitamin C");
        assert!(
            client
                .product(&ProductId::new("missing"))
                .await
                .unwrap()
                .is_none()
        );

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_serves_cached_catalog_until_invalidated() {
        let path = temp_path();
        tokio::fs::write(&path, CATALOG_JSON).await.unwrap();
        let client = CatalogClient::new(CatalogLocation::File(path.clone()));
        client.catalog().await.unwrap();

        tokio::fs::remove_file(&path).await.unwrap();
        assert!(client.catalog().await.is_ok());

        client.invalidate().await;
        let err = client.catalog().await.unwrap_err();
        assert!(matches!(err, CatalogFetchError::Io { .. }));
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let path = temp_path();
        let client = CatalogClient::new(CatalogLocation::File(path.clone()));
        assert!(client.catalog().await.is_err());

        tokio::fs::write(&path, CATALOG_JSON).await.unwrap();
        assert!(client.catalog().await.is_ok());

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_unparsable_document() {
        let path = temp_path();
        tokio::fs::write(&path, "<html>not json</html>").await.unwrap();
        let client = CatalogClient::new(CatalogLocation::File(path.clone()));

        let err = client.catalog().await.unwrap_err();
        assert!(matches!(err, CatalogFetchError::Parse(_)));

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
