//! Product store interface.
//!
//! The retrieval core only needs two operations from whatever owns product
//! rows: list everything for an index rebuild, and resolve a set of ids back
//! to full records. [`InMemoryCatalog`] is the reference implementation used
//! by tests and demos.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::product::Product;
use crate::ProductId;

/// Read access to the product catalog.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// List all products.
    async fn list_all(&self) -> Result<Vec<Product>>;

    /// Resolve a set of ids to products. Missing ids are simply absent from
    /// the returned map.
    async fn get_by_ids(&self, ids: &[ProductId]) -> Result<HashMap<ProductId, Product>>;
}

/// In-memory product store.
pub struct InMemoryCatalog {
    products: Arc<RwLock<Vec<Product>>>,
}

impl InMemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self {
            products: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create a catalog seeded with products.
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: Arc::new(RwLock::new(products)),
        }
    }

    /// Add a product.
    pub async fn insert(&self, product: Product) {
        debug!("Inserting product: {}", product.name);
        self.products.write().await.push(product);
    }

    /// Number of products.
    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    /// Check whether the catalog is empty.
    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductStore for InMemoryCatalog {
    async fn list_all(&self) -> Result<Vec<Product>> {
        Ok(self.products.read().await.clone())
    }

    async fn get_by_ids(&self, ids: &[ProductId]) -> Result<HashMap<ProductId, Product>> {
        let products = self.products.read().await;
        Ok(products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .map(|p| (p.id, p.clone()))
            .collect())
    }
}
