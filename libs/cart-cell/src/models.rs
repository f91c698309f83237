use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_cell::models::{Product, ProductImage};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub product: String,
    pub quantity: i64,
    pub price: f64,
    #[serde(default)]
    pub discount_price: f64,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    pub fn effective_price(&self) -> f64 {
        if self.discount_price > 0.0 {
            self.discount_price
        } else {
            self.price
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: String,
    pub user: String,
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub total_items: i64,
    #[serde(default)]
    pub total_price: f64,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(id: String, user: String) -> Self {
        Self {
            id,
            user,
            items: Vec::new(),
            total_items: 0,
            total_price: 0.0,
            updated_at: Utc::now(),
        }
    }

    /// Recomputes the derived totals from the items. Called after every mutation.
    pub fn recalculate(&mut self) {
        self.total_items = self.items.iter().map(|i| i.quantity).sum();
        self.total_price = round_cents(
            self.items
                .iter()
                .map(|i| i.effective_price() * i.quantity as f64)
                .sum(),
        );
        self.updated_at = Utc::now();
    }

    pub fn item_mut(&mut self, item_id: &str) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|i| i.id == item_id)
    }
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Product fields shown alongside each cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
    pub images: Vec<ProductImage>,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub stock: i64,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            images: product.images.clone(),
            price: product.price,
            discount_price: product.discount_price,
            stock: product.stock,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub id: String,
    pub product_id: String,
    /// `None` when the product has since been removed from the catalog.
    pub product: Option<ProductSummary>,
    pub quantity: i64,
    pub price: f64,
    pub discount_price: f64,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub id: Option<String>,
    pub user: String,
    pub items: Vec<CartItemView>,
    pub total_items: i64,
    pub total_price: f64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CartView {
    pub fn empty(user: &str) -> Self {
        Self {
            id: None,
            user: user.to_string(),
            items: Vec::new(),
            total_items: 0,
            total_price: 0.0,
            updated_at: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: Option<String>,
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartItemRequest {
    pub item_id: Option<String>,
    pub quantity: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64, price: f64, discount_price: f64) -> CartItem {
        CartItem {
            id: format!("i{}", quantity),
            product: "p".into(),
            quantity,
            price,
            discount_price,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn totals_use_discount_when_positive() {
        let mut cart = Cart::new("c".into(), "u".into());
        cart.items = vec![item(2, 10.0, 7.5), item(3, 1.1, 0.0)];
        cart.recalculate();

        assert_eq!(cart.total_items, 5);
        assert_eq!(cart.total_price, 18.3);
    }

    #[test]
    fn empty_cart_has_zero_totals() {
        let mut cart = Cart::new("c".into(), "u".into());
        cart.total_items = 9;
        cart.total_price = 99.0;
        cart.recalculate();

        assert_eq!(cart.total_items, 0);
        assert_eq!(cart.total_price, 0.0);
    }

    #[test]
    fn rounds_to_cents() {
        assert_eq!(round_cents(0.1 + 0.2), 0.3);
        assert_eq!(round_cents(19.999), 20.0);
    }
}
