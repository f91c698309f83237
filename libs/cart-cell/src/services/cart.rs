use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use catalog_cell::services::ProductService;
use shared_config::AppConfig;
use shared_database::{QueryBuilder, SupabaseClient};
use shared_models::error::AppError;

use crate::models::{
    AddToCartRequest, Cart, CartItem, CartItemView, CartView, ProductSummary, UpdateCartItemRequest,
};

const CARTS: &str = "carts";

pub struct CartService {
    supabase: SupabaseClient,
    products: ProductService,
}

impl CartService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            products: ProductService::new(config),
        }
    }

    pub async fn find_cart(&self, user_id: &str) -> Result<Option<Cart>, AppError> {
        let query = QueryBuilder::new().eq("user", user_id).build();
        Ok(self.supabase.select_one(CARTS, &query).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: &str) -> Result<CartView, AppError> {
        match self.find_cart(user_id).await? {
            Some(cart) => self.view(cart).await,
            None => Ok(CartView::empty(user_id)),
        }
    }

    #[instrument(skip(self, request))]
    pub async fn add_item(&self, user_id: &str, request: AddToCartRequest) -> Result<CartView, AppError> {
        let product_id = request
            .product_id
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| AppError::ValidationError("Product ID is required".to_string()))?;
        let quantity = request.quantity.unwrap_or(1);
        if quantity < 1 {
            return Err(AppError::ValidationError("Quantity must be at least 1".to_string()));
        }

        let product = self
            .products
            .find_product(&product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

        if !product.is_active {
            return Err(AppError::BadRequest("This product is no longer available".to_string()));
        }
        if product.stock < quantity {
            return Err(AppError::BadRequest("Insufficient stock".to_string()));
        }

        let (mut cart, is_new) = match self.find_cart(user_id).await? {
            Some(cart) => (cart, false),
            None => (Cart::new(Uuid::new_v4().to_string(), user_id.to_string()), true),
        };

        match cart.items.iter().position(|i| i.product == product_id) {
            Some(index) => {
                let combined = cart.items[index].quantity + quantity;
                if combined > product.stock {
                    return Err(AppError::BadRequest(
                        "Insufficient stock for the requested quantity".to_string(),
                    ));
                }
                cart.items[index].quantity = combined;
            }
            None => cart.items.push(CartItem {
                id: Uuid::new_v4().to_string(),
                product: product_id.clone(),
                quantity,
                price: product.price,
                discount_price: product.discount_price.unwrap_or(0.0),
                added_at: Utc::now(),
            }),
        }

        let saved = self.save(cart, is_new).await?;
        debug!("Added {} x {} to cart {}", quantity, product_id, saved.id);
        self.view(saved).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_item(&self, user_id: &str, request: UpdateCartItemRequest) -> Result<CartView, AppError> {
        let mut errors = Vec::new();
        if request.item_id.as_deref().map_or(true, |i| i.trim().is_empty()) {
            errors.push("Item ID is required".to_string());
        }
        if request.quantity.is_none() {
            errors.push("Quantity is required".to_string());
        }
        if !errors.is_empty() {
            return Err(AppError::ValidationFailed(errors));
        }

        let item_id = request.item_id.unwrap_or_default();
        let quantity = request.quantity.unwrap_or_default();
        if quantity <= 0 {
            return Err(AppError::ValidationError("Quantity must be greater than 0".to_string()));
        }

        let mut cart = self
            .find_cart(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart not found".to_string()))?;

        let product_id = cart
            .item_mut(&item_id)
            .map(|i| i.product.clone())
            .ok_or_else(item_not_found)?;

        let stock = self
            .products
            .find_product(&product_id)
            .await?
            .map(|p| p.stock)
            .unwrap_or(0);
        if stock < quantity {
            return Err(AppError::BadRequest("Insufficient stock".to_string()));
        }

        if let Some(item) = cart.item_mut(&item_id) {
            item.quantity = quantity;
        }

        let saved = self.save(cart, false).await?;
        self.view(saved).await
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: &str, item_id: &str) -> Result<CartView, AppError> {
        let mut cart = self
            .find_cart(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart not found".to_string()))?;

        let before = cart.items.len();
        cart.items.retain(|i| i.id != item_id);
        if cart.items.len() == before {
            return Err(item_not_found());
        }

        let saved = self.save(cart, false).await?;
        self.view(saved).await
    }

    #[instrument(skip(self))]
    pub async fn clear_cart(&self, user_id: &str) -> Result<CartView, AppError> {
        match self.find_cart(user_id).await? {
            None => Ok(CartView::empty(user_id)),
            Some(mut cart) => {
                cart.items.clear();
                let saved = self.save(cart, false).await?;
                info!("Cleared cart for user {}", user_id);
                self.view(saved).await
            }
        }
    }

    async fn save(&self, mut cart: Cart, is_new: bool) -> Result<Cart, AppError> {
        cart.recalculate();

        if is_new {
            return Ok(self.supabase.insert(CARTS, &cart).await?);
        }

        let query = QueryBuilder::new().eq("id", &cart.id).build();
        let updated: Vec<Cart> = self.supabase.update(CARTS, &query, &cart).await?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Cart not found".to_string()))
    }

    async fn view(&self, cart: Cart) -> Result<CartView, AppError> {
        let ids: Vec<String> = cart.items.iter().map(|i| i.product.clone()).collect();
        let products: HashMap<String, ProductSummary> = self
            .products
            .find_products(&ids)
            .await?
            .iter()
            .map(|p| (p.id.clone(), ProductSummary::from(p)))
            .collect();

        let items = cart
            .items
            .into_iter()
            .map(|item| CartItemView {
                product: products.get(&item.product).cloned(),
                product_id: item.product,
                id: item.id,
                quantity: item.quantity,
                price: item.price,
                discount_price: item.discount_price,
                added_at: item.added_at,
            })
            .collect();

        Ok(CartView {
            id: Some(cart.id),
            user: cart.user,
            items,
            total_items: cart.total_items,
            total_price: cart.total_price,
            updated_at: Some(cart.updated_at),
        })
    }
}

fn item_not_found() -> AppError {
    AppError::NotFound("Item not found in cart".to_string())
}
