use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;
pub const FEATURED_LIMIT: u64 = 8;
pub const RECOMMENDED_LIMIT: u64 = 4;

// ==============================================================================
// PRODUCTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductImage {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Specification {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub user: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub discount_price: Option<f64>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    pub category: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub ratings: Vec<Review>,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub total_reviews: u32,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub specifications: Vec<Specification>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Discount price when one is set above zero, list price otherwise.
    pub fn effective_price(&self) -> f64 {
        match self.discount_price {
            Some(discount) if discount > 0.0 => discount,
            _ => self.price,
        }
    }

    pub fn first_image(&self) -> Option<String> {
        self.images.first().map(|i| i.url.clone())
    }
}

pub(crate) fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SortField {
    #[serde(rename = "price")]
    Price,
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "averageRating")]
    AverageRating,
    #[serde(rename = "stock")]
    Stock,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Price => "price",
            SortField::Name => "name",
            SortField::CreatedAt => "createdAt",
            SortField::AverageRating => "averageRating",
            SortField::Stock => "stock",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
    pub sort_by: Option<SortField>,
    pub order: Option<SortOrder>,
}

impl ProductQuery {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Rows to skip, or `None` when the page lies past any addressable row.
    pub fn offset(&self) -> Option<u64> {
        (self.page() - 1)
            .checked_mul(self.limit())
            .filter(|offset| *offset <= i64::MAX as u64)
    }

    /// Newest first when no sort field is given; ascending otherwise unless
    /// `order=desc`.
    pub fn sort(&self) -> (SortField, bool) {
        match self.sort_by {
            None => (SortField::CreatedAt, self.order == Some(SortOrder::Asc)),
            Some(field) => (field, self.order != Some(SortOrder::Desc)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub page: u64,
    pub pages: u64,
    pub count: usize,
    pub total: u64,
    pub data: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct ProductList {
    pub count: usize,
    pub data: Vec<Product>,
}

impl From<Vec<Product>> for ProductList {
    fn from(data: Vec<Product>) -> Self {
        Self {
            count: data.len(),
            data,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub discount_price: Option<f64>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub stock: Option<i64>,
    pub sku: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub specifications: Vec<Specification>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ProductImage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specifications: Option<Vec<Specification>>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: Option<f64>,
    pub comment: Option<String>,
}

// ==============================================================================
// CATEGORIES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    pub slug: String,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent: Option<String>,
    pub image: Option<String>,
    pub icon: Option<String>,
    pub slug: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent: Option<String>,
    pub image: Option<String>,
    pub icon: Option<String>,
    pub slug: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Result of a catalog read, flagged when it came from the built-in sample data.
#[derive(Debug)]
pub struct CatalogRead<T> {
    pub data: T,
    pub fallback: bool,
}

impl<T> CatalogRead<T> {
    pub fn live(data: T) -> Self {
        Self { data, fallback: false }
    }

    pub fn fallback(data: T) -> Self {
        Self { data, fallback: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_defaults() {
        let query = ProductQuery::default();
        assert_eq!(query.sort(), (SortField::CreatedAt, false));

        let query = ProductQuery {
            sort_by: Some(SortField::Price),
            ..Default::default()
        };
        assert_eq!(query.sort(), (SortField::Price, true));

        let query = ProductQuery {
            sort_by: Some(SortField::Price),
            order: Some(SortOrder::Desc),
            ..Default::default()
        };
        assert_eq!(query.sort(), (SortField::Price, false));
    }

    #[test]
    fn page_size_is_clamped() {
        let query = ProductQuery {
            page: Some(0),
            limit: Some(500),
            ..Default::default()
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), MAX_PAGE_SIZE);
        assert_eq!(query.offset(), Some(0));
    }

    #[test]
    fn offset_overflow_is_detected() {
        let query = ProductQuery {
            page: Some(3),
            limit: Some(20),
            ..Default::default()
        };
        assert_eq!(query.offset(), Some(40));

        let query = ProductQuery {
            page: Some(u64::MAX),
            ..Default::default()
        };
        assert_eq!(query.offset(), None);
    }

    #[test]
    fn unknown_sort_field_is_rejected() {
        let parsed: Result<ProductQuery, _> =
            serde_json::from_value(serde_json::json!({"sortBy": "password"}));
        assert!(parsed.is_err());
    }
}
