use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use uuid::Uuid;

use shared_config::{AppConfig, Environment};
use shared_models::auth::{JwtClaims, Role, User};

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    /// A config whose store is not configured, so reads take the fallback path.
    pub fn offline() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_service_key: String::new(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            jwt_expiry_secs: 3600,
            port: 5000,
            environment: Environment::Development,
            cors_allowed_origin: None,
            admin_emails: vec!["admin@example.com".to_string()],
            smtp: None,
            monitoring_config_path: None,
            monitoring_enabled: false,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", Role::User)
    }
}

impl TestUser {
    pub fn new(email: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role,
        }
    }

    pub fn customer(email: &str) -> Self {
        Self::new(email, Role::User)
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, Role::Admin)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: self.email.clone(),
            role: self.role,
            issued_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let claims = JwtClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("test token encodes")
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Canned documents in the store's camelCase layout.
pub struct MockStoreResponses;

impl MockStoreResponses {
    pub fn product(id: &str, price: f64, stock: i64) -> serde_json::Value {
        json!({
            "id": id,
            "name": format!("Product {}", id),
            "description": "A product used in tests",
            "price": price,
            "discountPrice": 0.0,
            "images": [{"url": "/images/test.jpg", "alt": "test"}],
            "category": "electronics",
            "brand": "Acme",
            "stock": stock,
            "sku": format!("SKU-{}", id),
            "ratings": [],
            "averageRating": 0.0,
            "totalReviews": 0,
            "isFeatured": false,
            "isActive": true,
            "tags": [],
            "specifications": [],
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        })
    }

    pub fn cart(user_id: &str, items: serde_json::Value) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "user": user_id,
            "items": items,
            "totalItems": 0,
            "totalPrice": 0.0,
            "updatedAt": "2024-01-01T00:00:00Z"
        })
    }

    pub fn cart_item(item_id: &str, product_id: &str, quantity: i64, price: f64) -> serde_json::Value {
        json!({
            "id": item_id,
            "product": product_id,
            "quantity": quantity,
            "price": price,
            "discountPrice": 0.0,
            "addedAt": "2024-01-01T00:00:00Z"
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let app_config = TestConfig::default().to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_service_key, "test-service-key");
        assert!(app_config.is_configured());
        assert!(!TestConfig::offline().to_app_config().is_database_configured());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::admin("boss@example.com");
        let model = user.to_user();

        assert_eq!(model.email, user.email);
        assert_eq!(model.id, user.id);
        assert!(model.is_admin());
    }

    #[test]
    fn test_jwt_token_creation() {
        let token = JwtTestUtils::create_test_token(&TestUser::default(), "test-secret", Some(1));
        assert_eq!(token.split('.').count(), 3);
    }
}
