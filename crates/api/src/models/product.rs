//! Catalog product model.
//!
//! Products are read-only to the cart/checkout core; only the admin surface
//! mutates them. Carts snapshot the name, first image, and price at the
//! moment an item is added, so later edits here never rewrite cart lines.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tamarind_core::{Gender, ProductId, UserId};

/// A single product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub url: String,
    pub alt_text: Option<String>,
}

/// A catalog product document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub count_in_stock: u32,
    pub sku: String,
    pub category: String,
    pub brand: Option<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub collections: String,
    pub material: Option<String>,
    pub gender: Option<Gender>,
    pub images: Vec<ProductImage>,
    pub is_featured: bool,
    pub is_published: bool,
    pub rating: f32,
    pub num_reviews: u32,
    pub tags: Vec<String>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub count_in_stock: u32,
    pub sku: String,
    pub category: String,
    pub brand: Option<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    pub collections: String,
    pub material: Option<String>,
    pub gender: Option<Gender>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub num_reviews: u32,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ProductInput {
    /// Check field-level constraints that the type system cannot.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message for the first violated constraint.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name cannot be empty".to_string());
        }
        if self.sku.trim().is_empty() {
            return Err("Sku cannot be empty".to_string());
        }
        if self.price.is_sign_negative() {
            return Err("Price cannot be negative".to_string());
        }
        if self.discount_price.is_some_and(|p| p.is_sign_negative()) {
            return Err("Discount price cannot be negative".to_string());
        }
        if self.rating < 0.0 {
            return Err("Rating cannot be negative".to_string());
        }
        Ok(())
    }
}

/// Partial update for a product.
///
/// Every field is explicitly "set to this value" (`Some`) or "leave
/// unchanged" (`None`), so falsy-but-valid values like `false`, `0`, and
/// `""` survive the trip.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub discount_price: Option<Decimal>,
    pub count_in_stock: Option<u32>,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub sizes: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    pub collections: Option<String>,
    pub material: Option<String>,
    pub gender: Option<Gender>,
    pub images: Option<Vec<ProductImage>>,
    pub is_featured: Option<bool>,
    pub is_published: Option<bool>,
    pub rating: Option<f32>,
    pub num_reviews: Option<u32>,
    pub tags: Option<Vec<String>>,
}

impl ProductPatch {
    /// Check field-level constraints on the fields being set.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message for the first violated constraint.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err("Name cannot be empty".to_string());
        }
        if self.sku.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err("Sku cannot be empty".to_string());
        }
        if self.price.is_some_and(|p| p.is_sign_negative()) {
            return Err("Price cannot be negative".to_string());
        }
        if self.discount_price.is_some_and(|p| p.is_sign_negative()) {
            return Err("Discount price cannot be negative".to_string());
        }
        if self.rating.is_some_and(|r| r < 0.0) {
            return Err("Rating cannot be negative".to_string());
        }
        Ok(())
    }
}

impl Product {
    /// Build a new product from a validated input payload.
    #[must_use]
    pub fn new(input: ProductInput, created_by: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::generate(),
            name: input.name,
            description: input.description,
            price: input.price,
            discount_price: input.discount_price,
            count_in_stock: input.count_in_stock,
            sku: input.sku,
            category: input.category,
            brand: input.brand,
            sizes: input.sizes,
            colors: input.colors,
            collections: input.collections,
            material: input.material,
            gender: input.gender,
            images: input.images,
            is_featured: input.is_featured,
            is_published: input.is_published,
            rating: input.rating,
            num_reviews: input.num_reviews,
            tags: input.tags,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update, leaving `None` fields untouched.
    pub fn apply(&mut self, patch: ProductPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(discount_price) = patch.discount_price {
            self.discount_price = Some(discount_price);
        }
        if let Some(count_in_stock) = patch.count_in_stock {
            self.count_in_stock = count_in_stock;
        }
        if let Some(sku) = patch.sku {
            self.sku = sku;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(brand) = patch.brand {
            self.brand = Some(brand);
        }
        if let Some(sizes) = patch.sizes {
            self.sizes = sizes;
        }
        if let Some(colors) = patch.colors {
            self.colors = colors;
        }
        if let Some(collections) = patch.collections {
            self.collections = collections;
        }
        if let Some(material) = patch.material {
            self.material = Some(material);
        }
        if let Some(gender) = patch.gender {
            self.gender = Some(gender);
        }
        if let Some(images) = patch.images {
            self.images = images;
        }
        if let Some(is_featured) = patch.is_featured {
            self.is_featured = is_featured;
        }
        if let Some(is_published) = patch.is_published {
            self.is_published = is_published;
        }
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
        if let Some(num_reviews) = patch.num_reviews {
            self.num_reviews = num_reviews;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        self.updated_at = Utc::now();
    }

    /// The first image, if any. Carts snapshot this on add.
    #[must_use]
    pub fn first_image(&self) -> Option<&ProductImage> {
        self.images.first()
    }
}
