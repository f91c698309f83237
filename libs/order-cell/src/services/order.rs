use chrono::Utc;
use rand::Rng;
use serde_json::json;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use cart_cell::models::round_cents;
use cart_cell::services::CartService;
use catalog_cell::services::ProductService;
use shared_config::AppConfig;
use shared_database::{QueryBuilder, SupabaseClient};
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::error::OrderError;
use crate::models::{
    CreateOrderRequest, Order, OrderItem, OrderList, OrderStatus, PayOrderRequest, PaymentMethod,
    UpdateStatusRequest,
};

const ORDERS: &str = "orders";

pub struct OrderService {
    supabase: SupabaseClient,
    products: ProductService,
    carts: CartService,
}

impl OrderService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            products: ProductService::new(config),
            carts: CartService::new(config),
        }
    }

    /// Converts the user's cart into an order. Every line is checked before
    /// any stock moves; a failed decrement reverts the ones already applied.
    #[instrument(skip(self, request), fields(user_id = %user.id))]
    pub async fn place_order(&self, user: &User, request: CreateOrderRequest) -> Result<Order, AppError> {
        let mut errors = Vec::new();
        let shipping_address = request.shipping_address.unwrap_or_default();
        errors.extend(shipping_address.missing_fields());

        let payment_method = match request.payment_method.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push("paymentMethod is required".to_string());
                None
            }
            Some(raw) => match raw.parse::<PaymentMethod>() {
                Ok(method) => Some(method),
                Err(e) => {
                    errors.push(e);
                    None
                }
            },
        };
        if !errors.is_empty() {
            return Err(AppError::ValidationFailed(errors));
        }
        let payment_method = payment_method.ok_or_else(|| {
            AppError::ValidationError("paymentMethod is required".to_string())
        })?;

        let cart = match self.carts.find_cart(&user.id).await? {
            Some(cart) if !cart.items.is_empty() => cart,
            _ => return Err(OrderError::EmptyCart.into()),
        };

        let mut order_items = Vec::with_capacity(cart.items.len());
        for line in &cart.items {
            let product = self
                .products
                .find_product(&line.product)
                .await?
                .ok_or_else(|| OrderError::ProductNotFound(line.product.clone()))?;

            if product.stock < line.quantity {
                return Err(OrderError::InsufficientStock(product.name).into());
            }

            order_items.push(OrderItem {
                product: product.id.clone(),
                name: product.name.clone(),
                quantity: line.quantity,
                price: product.price,
                discount_price: product.discount_price,
                image: product.first_image(),
                sku: product.sku.clone(),
            });
        }

        let mut applied: Vec<(String, i64)> = Vec::with_capacity(order_items.len());
        for item in &order_items {
            match self.products.adjust_stock(&item.product, -item.quantity).await {
                Ok(_) => applied.push((item.product.clone(), item.quantity)),
                Err(e) => {
                    warn!("Stock decrement failed for {}: {}", item.product, e);
                    self.restore_stock(&applied).await;
                    return Err(e);
                }
            }
        }

        let items_price = round_cents(order_items.iter().map(OrderItem::line_total).sum());
        let (shipping_price, tax_price, discount_amount) = (0.0, 0.0, 0.0);
        let now = Utc::now();

        let order = Order {
            id: Uuid::new_v4().to_string(),
            order_number: generate_order_number(),
            user: user.id.clone(),
            order_items,
            shipping_address,
            payment_method,
            payment_result: None,
            items_price,
            shipping_price,
            tax_price,
            discount_amount,
            total_price: round_cents(items_price + shipping_price + tax_price - discount_amount),
            order_status: OrderStatus::Pending,
            is_paid: false,
            paid_at: None,
            is_delivered: false,
            delivered_at: None,
            tracking_number: None,
            notes: request.notes.filter(|n| !n.trim().is_empty()),
            coupon_code: request.coupon_code.filter(|c| !c.trim().is_empty()),
            created_at: now,
            updated_at: now,
        };

        let created: Order = match self.supabase.insert(ORDERS, &order).await {
            Ok(created) => created,
            Err(e) => {
                error!("Failed to store order, reverting stock: {}", e);
                self.restore_stock(&applied).await;
                return Err(e.into());
            }
        };

        if let Err(e) = self.carts.clear_cart(&user.id).await {
            warn!("Order {} placed but cart was not cleared: {}", created.id, e);
        }

        info!("Placed order {} ({})", created.order_number, created.id);
        Ok(created)
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<OrderList, AppError> {
        let query = QueryBuilder::new()
            .eq("user", user_id)
            .order("createdAt", false)
            .build();
        let data: Vec<Order> = self.supabase.select(ORDERS, &query).await?;

        Ok(OrderList { count: data.len(), data })
    }

    pub async fn list_all(&self, status: Option<&str>) -> Result<OrderList, AppError> {
        let mut builder = QueryBuilder::new();
        if let Some(status) = status.filter(|s| !s.is_empty()) {
            let status: OrderStatus = status.parse().map_err(AppError::from)?;
            builder = builder.eq("orderStatus", status);
        }
        let query = builder.order("createdAt", false).build();
        let data: Vec<Order> = self.supabase.select(ORDERS, &query).await?;

        Ok(OrderList { count: data.len(), data })
    }

    /// Loads an order the caller owns, or any order for admins.
    pub async fn get_order(&self, user: &User, order_id: &str) -> Result<Order, AppError> {
        let order = self.find(order_id).await?.ok_or(OrderError::NotFound)?;

        if !user.can_access(&order.user) {
            return Err(OrderError::AccessDenied.into());
        }
        Ok(order)
    }

    #[instrument(skip(self), fields(user_id = %user.id))]
    pub async fn cancel_order(&self, user: &User, order_id: &str) -> Result<Order, AppError> {
        let order = self.get_order(user, order_id).await?;

        if !order.order_status.can_transition_to(OrderStatus::Cancelled) {
            return Err(OrderError::NotCancellable.into());
        }

        self.transition(order, OrderStatus::Cancelled, None).await
    }

    #[instrument(skip(self, payment), fields(user_id = %user.id))]
    pub async fn pay_order(
        &self,
        user: &User,
        order_id: &str,
        payment: PayOrderRequest,
    ) -> Result<Order, AppError> {
        let order = self.find(order_id).await?.ok_or(OrderError::NotFound)?;

        if order.user != user.id {
            return Err(OrderError::AccessDenied.into());
        }
        if order.order_status == OrderStatus::Cancelled {
            return Err(OrderError::PaymentOnCancelled.into());
        }
        if order.is_paid {
            return Err(OrderError::AlreadyPaid.into());
        }

        let query = QueryBuilder::new().eq("id", order_id).build();
        let updated: Vec<Order> = self
            .supabase
            .update(
                ORDERS,
                &query,
                &json!({
                    "isPaid": true,
                    "paidAt": Utc::now(),
                    "paymentResult": payment,
                    "updatedAt": Utc::now(),
                }),
            )
            .await?;

        info!("Order {} marked as paid", order_id);
        updated.into_iter().next().ok_or_else(|| OrderError::NotFound.into())
    }

    #[instrument(skip(self, request))]
    pub async fn update_status(&self, order_id: &str, request: UpdateStatusRequest) -> Result<Order, AppError> {
        let next: OrderStatus = request.status.trim().parse()?;
        let order = self.find(order_id).await?.ok_or(OrderError::NotFound)?;

        if order.order_status == next {
            return Ok(order);
        }
        if !order.order_status.can_transition_to(next) {
            return Err(OrderError::InvalidStatusTransition {
                from: order.order_status,
                to: next,
            }
            .into());
        }

        self.transition(order, next, request.tracking_number).await
    }

    /// Writes a status change guarded on the current status, then applies its
    /// side effects.
    async fn transition(
        &self,
        order: Order,
        next: OrderStatus,
        tracking_number: Option<String>,
    ) -> Result<Order, AppError> {
        let now = Utc::now();
        let mut changes = serde_json::Map::new();
        changes.insert("orderStatus".into(), json!(next));
        changes.insert("updatedAt".into(), json!(now));
        if next == OrderStatus::Delivered {
            changes.insert("isDelivered".into(), json!(true));
            changes.insert("deliveredAt".into(), json!(now));
        }
        if let Some(tracking) = tracking_number.filter(|t| !t.trim().is_empty()) {
            changes.insert("trackingNumber".into(), json!(tracking));
        }

        let query = QueryBuilder::new()
            .eq("id", &order.id)
            .eq("orderStatus", order.order_status)
            .build();
        let updated: Vec<Order> = self.supabase.update(ORDERS, &query, &changes).await?;
        let updated = updated
            .into_iter()
            .next()
            .ok_or(OrderError::ConcurrentUpdate)?;

        if next == OrderStatus::Cancelled {
            let lines: Vec<(String, i64)> = order
                .order_items
                .iter()
                .map(|i| (i.product.clone(), i.quantity))
                .collect();
            self.restore_stock(&lines).await;
        }

        info!("Order {} moved from {} to {}", order.id, order.order_status, next);
        Ok(updated)
    }

    async fn find(&self, order_id: &str) -> Result<Option<Order>, AppError> {
        let query = QueryBuilder::new().eq("id", order_id).build();
        Ok(self.supabase.select_one(ORDERS, &query).await?)
    }

    async fn restore_stock(&self, lines: &[(String, i64)]) {
        for (product_id, quantity) in lines {
            if let Err(e) = self.products.adjust_stock(product_id, *quantity).await {
                error!("Failed to restore {} units of {}: {}", quantity, product_id, e);
            }
        }
    }
}

/// `ORDER-YYYYMMDD-NNNNNN`
pub fn generate_order_number() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(100_000..=999_999);
    format!("ORDER-{}-{}", Utc::now().format("%Y%m%d"), suffix)
}
