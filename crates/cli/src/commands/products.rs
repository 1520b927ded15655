//! Catalog commands.
//!
//! # Environment Variables
//!
//! - `FIRESTORE_PROJECT_ID` - Project that owns the document database
//! - `FIRESTORE_BASE_URL` - REST endpoint override, e.g. the local emulator
//! - `FIRESTORE_API_KEY` - Web API key

use ember_wick_storefront::config::{ConfigError, FirestoreConfig};
use ember_wick_storefront::db::RepositoryError;
use ember_wick_storefront::db::products::ProductRepository;
use ember_wick_storefront::models::Product;
use ember_wick_storefront::store::{DocumentStore, FirestoreClient, StoreError};
use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during catalog commands.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Products that need attention, by problem.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ProductAudit {
    pub total: usize,
    pub missing_images: Vec<String>,
    pub out_of_stock: Vec<String>,
    pub bad_price: Vec<String>,
}

impl ProductAudit {
    /// Sort every product into the problems it has.
    #[must_use]
    pub fn of(products: &[Product]) -> Self {
        let mut audit = Self {
            total: products.len(),
            ..Self::default()
        };

        for product in products {
            let label = format!("{} ({})", product.name, product.id);
            if product.images.is_empty() {
                audit.missing_images.push(label.clone());
            }
            if product.stock == 0 {
                audit.out_of_stock.push(label.clone());
            }
            if product.price <= Decimal::ZERO {
                audit.bad_price.push(label);
            }
        }
        audit
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.missing_images.is_empty() && self.out_of_stock.is_empty() && self.bad_price.is_empty()
    }
}

/// Compile a case-insensitive search pattern.
///
/// # Errors
///
/// Returns `regex::Error` if the pattern is not a valid regular expression.
pub fn search_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Products whose name, description or category match `pattern`.
#[must_use]
pub fn matching<'a>(products: &'a [Product], pattern: &Regex) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| {
            pattern.is_match(&p.name)
                || pattern.is_match(&p.description)
                || pattern.is_match(&p.category)
        })
        .collect()
}

async fn load_products() -> Result<Vec<Product>, CatalogError> {
    dotenvy::dotenv().ok();

    let config = FirestoreConfig::from_env()?;
    tracing::info!(project = %config.project_id, "Reading products...");

    let store = DocumentStore::Firestore(FirestoreClient::new(&config)?);
    Ok(ProductRepository::new(&store).all().await?)
}

/// Report product count and products with missing images, zero stock or a
/// non-positive price.
///
/// # Errors
///
/// Returns an error if configuration is missing or the store cannot be read.
pub async fn check_products() -> Result<(), CatalogError> {
    let products = load_products().await?;
    let audit = ProductAudit::of(&products);

    tracing::info!("{} products", audit.total);
    for product in &products {
        tracing::info!(
            "  {} - {} [{}] stock {}",
            product.id,
            product.name,
            product.category,
            product.stock
        );
    }

    let sections = [
        ("Missing images", &audit.missing_images),
        ("Out of stock", &audit.out_of_stock),
        ("Price not positive", &audit.bad_price),
    ];
    for (heading, names) in sections {
        if !names.is_empty() {
            tracing::warn!("{heading}: {}", names.len());
            for name in names {
                tracing::warn!("  {name}");
            }
        }
    }

    if audit.is_clean() {
        tracing::info!("All products look good");
    }
    Ok(())
}

/// Print products matching `pattern`.
///
/// # Errors
///
/// Returns an error if the pattern is invalid or the store cannot be read.
pub async fn search_candles(pattern: &str) -> Result<(), CatalogError> {
    // Fail on a bad pattern before touching the network
    let regex = search_pattern(pattern)?;
    let products = load_products().await?;
    let found = matching(&products, &regex);

    tracing::info!("{} of {} products match {pattern:?}", found.len(), products.len());
    for product in found {
        tracing::info!(
            "  {} - {} [{}] ${}",
            product.id,
            product.name,
            product.category,
            product.price
        );
    }
    Ok(())
}
