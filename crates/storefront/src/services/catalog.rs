//! Cached catalog reads.
//!
//! Product lists and single products are cached with `moka` for 60 seconds.
//! Admin writes invalidate the whole cache so edits show up immediately on
//! this instance.

mod cache;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use cache::{CacheKey, CacheValue};

use crate::db::products::ProductRepository;
use crate::db::{Repository, RepositoryError};
use crate::models::Product;
use crate::store::DocumentStore;

/// Cache entry lifetime.
const CACHE_TTL: Duration = Duration::from_secs(60);

/// Catalog reader with a short-lived cache in front of the store.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    store: DocumentStore,
    cache: Cache<CacheKey, CacheValue>,
}

impl Catalog {
    /// Create a catalog over the given store.
    #[must_use]
    pub fn new(store: DocumentStore) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(CatalogInner { store, cache }),
        }
    }

    /// Every product, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store request fails.
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, RepositoryError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::AllProducts).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products = Arc::new(ProductRepository::new(&self.inner.store).all().await?);
        self.inner
            .cache
            .insert(CacheKey::AllProducts, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// One product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store request fails or the document
    /// is corrupt.
    pub async fn product(&self, id: &str) -> Result<Option<Product>, RepositoryError> {
        let key = CacheKey::Product(id.to_string());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!(product_id = %id, "Cache hit for product");
            return Ok(Some(*product));
        }

        let product = Repository::<Product>::new(&self.inner.store).get(id).await?;
        if let Some(product) = &product {
            self.inner
                .cache
                .insert(key, CacheValue::Product(Box::new(product.clone())))
                .await;
        }
        Ok(product)
    }

    /// Featured products, from the cached list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store request fails.
    pub async fn featured(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self
            .products()
            .await?
            .iter()
            .filter(|p| p.featured)
            .cloned()
            .collect())
    }

    /// Drop every cached entry.
    pub async fn invalidate(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
        debug!("Catalog cache cleared");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_cache_serves_stale_until_invalidated() {
        let store = DocumentStore::Memory(MemoryStore::new());
        let repo = Repository::<Product>::new(&store);
        let catalog = Catalog::new(store.clone());

        let created = repo
            .create(Product {
                name: "Amber".to_string(),
                featured: true,
                ..Product::default()
            })
            .await
            .unwrap();
        assert_eq!(catalog.products().await.unwrap().len(), 1);
        assert_eq!(
            catalog.product(created.id.as_str()).await.unwrap().unwrap().name,
            "Amber"
        );

        repo.save(Product {
            name: "Amber Glow".to_string(),
            ..created.clone()
        })
        .await
        .unwrap();
        repo.create(Product::default()).await.unwrap();

        assert_eq!(catalog.products().await.unwrap().len(), 1);
        assert_eq!(
            catalog.product(created.id.as_str()).await.unwrap().unwrap().name,
            "Amber"
        );

        catalog.invalidate().await;
        assert_eq!(catalog.products().await.unwrap().len(), 2);
        assert_eq!(
            catalog.product(created.id.as_str()).await.unwrap().unwrap().name,
            "Amber Glow"
        );
        assert_eq!(catalog.featured().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_product_is_not_cached() {
        let store = DocumentStore::Memory(MemoryStore::new());
        let catalog = Catalog::new(store.clone());
        assert!(catalog.product("later").await.unwrap().is_none());

        store
            .set(
                "products",
                "later",
                serde_json::json!({"name": "Late"}).as_object().cloned().unwrap(),
            )
            .await
            .unwrap();
        assert!(catalog.product("later").await.unwrap().is_some());
    }
}
