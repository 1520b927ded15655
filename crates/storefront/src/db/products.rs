//! Catalog queries.

use serde_json::Value;

use super::{Repository, RepositoryError};
use crate::models::Product;
use crate::store::DocumentStore;

/// Product queries beyond plain CRUD.
pub struct ProductRepository<'a> {
    products: Repository<'a, Product>,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(store: &'a DocumentStore) -> Self {
        Self {
            products: Repository::new(store),
        }
    }

    /// Every product, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the request fails.
    pub async fn all(&self) -> Result<Vec<Product>, RepositoryError> {
        let mut products = self.products.list().await?;
        sort_by_name(&mut products);
        Ok(products)
    }

    /// Products in one category, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the query fails.
    pub async fn by_category(&self, category: &str) -> Result<Vec<Product>, RepositoryError> {
        let mut products = self
            .products
            .find_by("category", Value::String(category.to_string()))
            .await?;
        sort_by_name(&mut products);
        Ok(products)
    }
}

/// Distinct non-empty categories, sorted.
#[must_use]
pub fn categories(products: &[Product]) -> Vec<String> {
    let mut categories: Vec<String> = products
        .iter()
        .map(|p| p.category.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    categories.sort();
    categories.dedup();
    categories
}

fn sort_by_name(products: &mut [Product]) {
    products.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
}
