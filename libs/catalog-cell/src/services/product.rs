use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{DatabaseError, QueryBuilder, SupabaseClient};
use shared_models::error::AppError;

use crate::models::{
    CatalogRead, CreateProductRequest, Product, ProductList, ProductPage, ProductQuery, Review,
    ReviewRequest, UpdateProductRequest, FEATURED_LIMIT, RECOMMENDED_LIMIT,
};
use crate::services::mock;

const PRODUCTS: &str = "products";
const STOCK_UPDATE_ATTEMPTS: usize = 3;

pub struct ProductService {
    supabase: SupabaseClient,
}

impl ProductService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<CatalogRead<ProductPage>, AppError> {
        let page = query.page();
        let limit = query.limit();
        let offset = query
            .offset()
            .ok_or_else(|| AppError::ValidationError("page is out of range".to_string()))?;
        let (sort_field, ascending) = query.sort();

        let mut builder = QueryBuilder::new().select("*");
        if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
            builder = builder.eq("category", category);
        }
        if let Some(min) = query.min_price {
            builder = builder.gte("price", min);
        }
        if let Some(max) = query.max_price {
            builder = builder.lte("price", max);
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            builder = builder.ilike_any(&["name", "description"], search);
        }
        let builder = builder
            .order(sort_field.column(), ascending)
            .offset(offset)
            .limit(limit);

        match self
            .supabase
            .select_with_count::<Product>(PRODUCTS, &builder.build())
            .await
        {
            Ok((data, total)) => Ok(CatalogRead::live(ProductPage {
                page,
                pages: total.div_ceil(limit),
                count: data.len(),
                total,
                data,
            })),
            Err(e) if e.is_unavailable() => {
                warn!("Product store unavailable, serving sample data: {}", e);
                let data = mock::filter_mock_products(query);
                let total = data.len() as u64;
                Ok(CatalogRead::fallback(ProductPage {
                    page: 1,
                    pages: 1,
                    count: data.len(),
                    total,
                    data,
                }))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn featured_products(&self) -> Result<CatalogRead<ProductList>, AppError> {
        let query = QueryBuilder::new()
            .eq("isFeatured", true)
            .eq("isActive", true)
            .order("createdAt", false)
            .limit(FEATURED_LIMIT)
            .build();

        self.list_or_mock(&query, |products| {
            products.into_iter().filter(|p| p.is_featured).collect()
        })
        .await
    }

    pub async fn recommended_products(&self) -> Result<CatalogRead<ProductList>, AppError> {
        let query = QueryBuilder::new()
            .eq("isActive", true)
            .order("averageRating", false)
            .limit(RECOMMENDED_LIMIT)
            .build();

        self.list_or_mock(&query, |mut products| {
            products.sort_by(|a, b| b.average_rating.total_cmp(&a.average_rating));
            products.truncate(RECOMMENDED_LIMIT as usize);
            products
        })
        .await
    }

    async fn list_or_mock<F>(&self, query: &str, shape_mock: F) -> Result<CatalogRead<ProductList>, AppError>
    where
        F: FnOnce(Vec<Product>) -> Vec<Product>,
    {
        match self.supabase.select::<Product>(PRODUCTS, query).await {
            Ok(products) => Ok(CatalogRead::live(products.into())),
            Err(e) if e.is_unavailable() => {
                warn!("Product store unavailable, serving sample data: {}", e);
                Ok(CatalogRead::fallback(shape_mock(mock::mock_products()).into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Public detail read with the sample-data fallback.
    pub async fn get_product(&self, id: &str) -> Result<CatalogRead<Product>, AppError> {
        match self.fetch(id).await {
            Ok(Some(product)) => Ok(CatalogRead::live(product)),
            Ok(None) => Err(product_not_found()),
            Err(e) if e.is_unavailable() => {
                warn!("Product store unavailable, serving sample data: {}", e);
                mock::mock_product(id)
                    .map(CatalogRead::fallback)
                    .ok_or_else(product_not_found)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Store-only lookup for callers that must not act on sample data.
    pub async fn find_product(&self, id: &str) -> Result<Option<Product>, AppError> {
        Ok(self.fetch(id).await?)
    }

    pub async fn find_products(&self, ids: &[String]) -> Result<Vec<Product>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = QueryBuilder::new().in_list("id", ids).build();
        Ok(self.supabase.select(PRODUCTS, &query).await?)
    }

    async fn fetch(&self, id: &str) -> Result<Option<Product>, DatabaseError> {
        let query = QueryBuilder::new().eq("id", id).build();
        self.supabase.select_one(PRODUCTS, &query).await
    }

    #[instrument(skip(self, request))]
    pub async fn add_review(
        &self,
        product_id: &str,
        user_id: &str,
        request: ReviewRequest,
    ) -> Result<Product, AppError> {
        let rating = validate_rating(request.rating)?;

        let mut product = self
            .find_product(product_id)
            .await?
            .ok_or_else(product_not_found)?;

        upsert_review(
            &mut product.ratings,
            Review {
                user: user_id.to_string(),
                rating,
                comment: request.comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
                created_at: Utc::now(),
            },
        );
        product.average_rating = average_rating(&product.ratings);
        product.total_reviews = product.ratings.len() as u32;

        let query = QueryBuilder::new().eq("id", product_id).build();
        let updated: Vec<Product> = self
            .supabase
            .update(
                PRODUCTS,
                &query,
                &json!({
                    "ratings": product.ratings,
                    "averageRating": product.average_rating,
                    "totalReviews": product.total_reviews,
                    "updatedAt": Utc::now(),
                }),
            )
            .await?;

        updated.into_iter().next().ok_or_else(product_not_found)
    }

    #[instrument(skip(self, request))]
    pub async fn create_product(&self, request: CreateProductRequest) -> Result<Product, AppError> {
        let mut errors = Vec::new();
        let name = request.name.map(|n| n.trim().to_string()).unwrap_or_default();
        let description = request.description.map(|d| d.trim().to_string()).unwrap_or_default();
        let category = request.category.map(|c| c.trim().to_string()).unwrap_or_default();

        if name.is_empty() {
            errors.push("Product name is required".to_string());
        }
        if description.is_empty() {
            errors.push("Product description is required".to_string());
        }
        if category.is_empty() {
            errors.push("Product category is required".to_string());
        }
        match request.price {
            None => errors.push("Product price is required".to_string()),
            Some(price) => errors.extend(check_pricing(price, request.discount_price, request.stock.unwrap_or(0))),
        }
        if !errors.is_empty() {
            return Err(AppError::ValidationFailed(errors));
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            price: request.price.unwrap_or_default(),
            discount_price: request.discount_price,
            images: request.images,
            category,
            brand: request.brand,
            stock: request.stock.unwrap_or(0),
            sku: request
                .sku
                .filter(|s| !s.trim().is_empty())
                .or_else(|| Some(generate_sku())),
            ratings: Vec::new(),
            average_rating: 0.0,
            total_reviews: 0,
            is_featured: request.is_featured,
            is_active: request.is_active.unwrap_or(true),
            tags: request.tags,
            specifications: request.specifications,
            created_at: now,
            updated_at: now,
        };

        let created: Product = self.supabase.insert(PRODUCTS, &product).await?;
        info!("Created product {}", created.id);
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update_product(&self, id: &str, request: UpdateProductRequest) -> Result<Product, AppError> {
        let existing = self.find_product(id).await?.ok_or_else(product_not_found)?;

        if matches!(request.name.as_deref(), Some(n) if n.trim().is_empty()) {
            return Err(AppError::ValidationError("Product name cannot be empty".to_string()));
        }

        let errors = check_pricing(
            request.price.unwrap_or(existing.price),
            request.discount_price.or(existing.discount_price),
            request.stock.unwrap_or(existing.stock),
        );
        if !errors.is_empty() {
            return Err(AppError::ValidationFailed(errors));
        }

        let mut changes = serde_json::to_value(&request)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        if let Some(map) = changes.as_object_mut() {
            map.insert("updatedAt".to_string(), json!(Utc::now()));
        }

        let query = QueryBuilder::new().eq("id", id).build();
        let updated: Vec<Product> = self.supabase.update(PRODUCTS, &query, &changes).await?;

        debug!("Updated product {}", id);
        updated.into_iter().next().ok_or_else(product_not_found)
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), AppError> {
        self.find_product(id).await?.ok_or_else(product_not_found)?;

        let query = QueryBuilder::new().eq("id", id).build();
        self.supabase.delete(PRODUCTS, &query).await?;

        info!("Deleted product {}", id);
        Ok(())
    }

    /// Applies `delta` to the stock level with a compare-and-set on the
    /// previous value, retrying when a concurrent writer got there first.
    /// Returns the new stock level.
    #[instrument(skip(self))]
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> Result<i64, AppError> {
        for attempt in 1..=STOCK_UPDATE_ATTEMPTS {
            let product = self.find_product(id).await?.ok_or_else(product_not_found)?;

            let next = product.stock + delta;
            if next < 0 {
                return Err(AppError::BadRequest(format!(
                    "Insufficient stock for {}",
                    product.name
                )));
            }

            let query = QueryBuilder::new()
                .eq("id", id)
                .eq("stock", product.stock)
                .build();
            let updated: Vec<Product> = self
                .supabase
                .update(PRODUCTS, &query, &json!({ "stock": next, "updatedAt": Utc::now() }))
                .await?;

            if !updated.is_empty() {
                return Ok(next);
            }
            debug!("Stock for {} changed concurrently (attempt {})", id, attempt);
        }

        Err(AppError::Conflict(format!(
            "Stock for product {} is changing too quickly, try again",
            id
        )))
    }
}

fn product_not_found() -> AppError {
    AppError::NotFound("Product not found".to_string())
}

fn generate_sku() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("SKU-{}", id[..8].to_uppercase())
}

fn validate_rating(rating: Option<f64>) -> Result<u8, AppError> {
    match rating {
        Some(r) if r.fract() == 0.0 && (1.0..=5.0).contains(&r) => Ok(r as u8),
        _ => Err(AppError::ValidationError(
            "Rating must be an integer between 1 and 5".to_string(),
        )),
    }
}

fn check_pricing(price: f64, discount_price: Option<f64>, stock: i64) -> Vec<String> {
    let mut errors = Vec::new();
    if price < 0.0 {
        errors.push("Price cannot be negative".to_string());
    }
    if let Some(discount) = discount_price {
        if discount < 0.0 {
            errors.push("Discount price cannot be negative".to_string());
        } else if discount > price {
            errors.push("Discount price cannot exceed the price".to_string());
        }
    }
    if stock < 0 {
        errors.push("Stock cannot be negative".to_string());
    }
    errors
}

/// One review per user; a repeat review replaces the earlier one.
pub fn upsert_review(ratings: &mut Vec<Review>, review: Review) {
    match ratings.iter().position(|r| r.user == review.user) {
        Some(index) => ratings[index] = review,
        None => ratings.push(review),
    }
}

/// Mean rating rounded to one decimal, 0 when there are no reviews.
pub fn average_rating(ratings: &[Review]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: f64 = ratings.iter().map(|r| f64::from(r.rating)).sum();
    (sum / ratings.len() as f64 * 10.0).round() / 10.0
}
