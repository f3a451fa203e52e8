//! # Catalog
//!
//! Product records and the narrow store interface the retrieval pipeline
//! consumes. Relational storage, CRUD, and seed loading live outside this
//! core; everything here goes through [`ProductStore`].

pub mod error;
pub mod product;
pub mod store;

pub use error::{CatalogError, Result};
pub use product::Product;
pub use store::{InMemoryCatalog, ProductStore};

/// Catalog item identifier.
pub type ProductId = i64;
