//! Product record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ProductId;

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier.
    pub id: ProductId,

    /// Display name.
    pub name: String,

    /// Free-text description, the main signal for semantic retrieval.
    pub description: String,

    /// Price in the shop currency.
    pub price: f64,

    /// Category label.
    pub category: String,

    /// Brand, if known.
    pub brand: Option<String>,

    /// Image URL, if any.
    pub image_url: Option<String>,

    /// Free-form tags.
    pub tags: Vec<String>,

    /// Units in stock.
    pub stock: u32,

    /// Average rating.
    pub rating: f32,

    /// When the product was added.
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Create a product with the fields retrieval cares about.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        description: impl Into<String>,
        price: f64,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            price,
            category: category.into(),
            brand: None,
            image_url: None,
            tags: Vec::new(),
            stock: 0,
            rating: 0.0,
            created_at: Utc::now(),
        }
    }

    /// Set the brand.
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Set the image URL.
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Add a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set stock and rating.
    pub fn with_inventory(mut self, stock: u32, rating: f32) -> Self {
        self.stock = stock;
        self.rating = rating;
        self
    }

    /// The text that gets embedded for this product.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.description, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_product_builder() {
        let product = Product::new(1, "Sports T-Shirt", "Breathable shirt", 29.99, "Apparel")
            .with_brand("Nike")
            .with_tag("sports")
            .with_inventory(50, 4.5);

        assert_eq!(product.brand.as_deref(), Some("Nike"));
        assert_eq!(product.tags, vec!["sports"]);
        assert_eq!(product.stock, 50);
    }

    #[test]
    fn test_embedding_text_concatenates_description_and_name() {
        let product = Product::new(1, "Sports T-Shirt", "Breathable shirt", 29.99, "Apparel");
        assert_eq!(product.embedding_text(), "Breathable shirt Sports T-Shirt");
    }
}
