use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use order_cell::router::order_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockStoreResponses, TestConfig, TestUser};

struct TestContext {
    server: MockServer,
    config: AppConfig,
    user: TestUser,
    admin: TestUser,
}

impl TestContext {
    async fn new() -> Self {
        let server = MockServer::start().await;
        let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
        Self {
            server,
            config,
            user: TestUser::customer("buyer@example.com"),
            admin: TestUser::admin("admin@example.com"),
        }
    }

    fn app(&self) -> Router {
        order_routes(Arc::new(self.config.clone()))
    }

    fn request_as(&self, who: &TestUser, method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let token = JwtTestUtils::create_test_token(who, &self.config.jwt_secret, Some(1));
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {}", token));
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn request(&self, method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        self.request_as(&self.user, method, uri, body)
    }

    async fn mount_order(&self, order: Value) {
        let id = order["id"].as_str().unwrap().to_string();
        Mock::given(method("GET"))
            .and(path("/rest/v1/orders"))
            .and(query_param("id", format!("eq.{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([order])))
            .mount(&self.server)
            .await;
    }

    async fn mount_product(&self, product: Value) {
        let id = product["id"].as_str().unwrap().to_string();
        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .and(query_param("id", format!("eq.{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([product])))
            .mount(&self.server)
            .await;
    }
}

fn order_fixture(id: &str, user_id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "orderNumber": "ORDER-20240101-123456",
        "user": user_id,
        "orderItems": [{
            "product": "p1",
            "name": "Product p1",
            "quantity": 2,
            "price": 20.0,
            "discountPrice": 0.0,
            "image": "/images/test.jpg",
            "sku": "SKU-p1"
        }],
        "shippingAddress": {
            "fullName": "Jane Doe",
            "phone": "13800138000",
            "address": "1 Main St",
            "city": "Springfield",
            "zipCode": "12345",
            "country": "US"
        },
        "paymentMethod": "creditCard",
        "itemsPrice": 40.0,
        "shippingPrice": 0.0,
        "taxPrice": 0.0,
        "discountAmount": 0.0,
        "totalPrice": 40.0,
        "orderStatus": status,
        "isPaid": false,
        "isDelivered": false,
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-01-01T00:00:00Z"
    })
}

fn order_body() -> Value {
    json!({
        "shippingAddress": {
            "fullName": "Jane Doe",
            "phone": "13800138000",
            "address": "1 Main St",
            "city": "Springfield",
            "zipCode": "12345",
            "country": "US"
        },
        "paymentMethod": "creditCard"
    })
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

// ==============================================================================
// PLACING ORDERS
// ==============================================================================

#[tokio::test]
async fn test_orders_require_login() {
    let app = order_routes(TestConfig::default().to_arc());

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_place_order_collects_validation_errors() {
    let ctx = TestContext::new().await;

    let response = ctx
        .app()
        .oneshot(ctx.request("POST", "/", Some(json!({"shippingAddress": {"fullName": "Jane"}}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["success"], false);
    let errors = body["errors"].as_array().unwrap();
    assert!(errors.contains(&json!("shippingAddress.city is required")));
    assert!(errors.contains(&json!("paymentMethod is required")));
}

#[tokio::test]
async fn test_place_order_with_empty_cart() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/carts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&ctx.server)
        .await;

    let response = ctx.app().oneshot(ctx.request("POST", "/", Some(order_body()))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["error"], "Cart is empty, cannot place an order");
}

#[tokio::test]
async fn test_place_order_rejects_short_stock_before_writing() {
    let ctx = TestContext::new().await;
    let cart = MockStoreResponses::cart(&ctx.user.id, json!([
        MockStoreResponses::cart_item("i1", "p1", 5, 20.0)
    ]));
    Mock::given(method("GET"))
        .and(path("/rest/v1/carts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([cart])))
        .mount(&ctx.server)
        .await;
    ctx.mount_product(MockStoreResponses::product("p1", 20.0, 3)).await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&ctx.server)
        .await;

    let response = ctx.app().oneshot(ctx.request("POST", "/", Some(order_body()))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["error"], "Insufficient stock for Product p1");
}

#[tokio::test]
async fn test_failed_decrement_reverts_earlier_lines() {
    let ctx = TestContext::new().await;
    let cart = MockStoreResponses::cart(&ctx.user.id, json!([
        MockStoreResponses::cart_item("i1", "p1", 2, 20.0),
        MockStoreResponses::cart_item("i2", "p2", 1, 15.0)
    ]));
    Mock::given(method("GET"))
        .and(path("/rest/v1/carts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([cart])))
        .mount(&ctx.server)
        .await;

    // p1 reads 10 for the availability check and the decrement, then 8.
    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", "eq.p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([MockStoreResponses::product("p1", 20.0, 10)])))
        .up_to_n_times(2)
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", "eq.p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([MockStoreResponses::product("p1", 20.0, 8)])))
        .mount(&ctx.server)
        .await;
    ctx.mount_product(MockStoreResponses::product("p2", 15.0, 5)).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", "eq.p1"))
        .and(query_param("stock", "eq.10"))
        .and(body_partial_json(json!({"stock": 8})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([MockStoreResponses::product("p1", 20.0, 8)])))
        .expect(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", "eq.p2"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(MockStoreResponses::error_response("boom", "XX000")),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", "eq.p1"))
        .and(query_param("stock", "eq.8"))
        .and(body_partial_json(json!({"stock": 10})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([MockStoreResponses::product("p1", 20.0, 10)])))
        .expect(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/orders"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&ctx.server)
        .await;

    let response = ctx.app().oneshot(ctx.request("POST", "/", Some(order_body()))).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_failed_order_insert_reverts_stock() {
    let ctx = TestContext::new().await;
    let cart = MockStoreResponses::cart(&ctx.user.id, json!([
        MockStoreResponses::cart_item("i1", "p1", 3, 20.0)
    ]));
    Mock::given(method("GET"))
        .and(path("/rest/v1/carts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([cart])))
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", "eq.p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([MockStoreResponses::product("p1", 20.0, 5)])))
        .up_to_n_times(2)
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", "eq.p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([MockStoreResponses::product("p1", 20.0, 2)])))
        .mount(&ctx.server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/products"))
        .and(query_param("stock", "eq.5"))
        .and(body_partial_json(json!({"stock": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([MockStoreResponses::product("p1", 20.0, 2)])))
        .expect(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/products"))
        .and(query_param("stock", "eq.2"))
        .and(body_partial_json(json!({"stock": 5})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([MockStoreResponses::product("p1", 20.0, 5)])))
        .expect(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/orders"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(MockStoreResponses::error_response("boom", "XX000")),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/carts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&ctx.server)
        .await;

    let response = ctx.app().oneshot(ctx.request("POST", "/", Some(order_body()))).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_place_order_snapshots_items_and_clears_cart() {
    let ctx = TestContext::new().await;
    let cart = MockStoreResponses::cart(&ctx.user.id, json!([
        MockStoreResponses::cart_item("i1", "p1", 2, 20.0)
    ]));
    let cart_id = cart["id"].as_str().unwrap().to_string();
    Mock::given(method("GET"))
        .and(path("/rest/v1/carts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([cart.clone()])))
        .mount(&ctx.server)
        .await;
    ctx.mount_product(MockStoreResponses::product("p1", 20.0, 10)).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/products"))
        .and(query_param("stock", "eq.10"))
        .and(body_partial_json(json!({"stock": 8})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([MockStoreResponses::product("p1", 20.0, 8)])),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/orders"))
        .and(body_partial_json(json!({
            "itemsPrice": 40.0,
            "totalPrice": 40.0,
            "orderStatus": "pending",
            "isPaid": false,
            "orderItems": [{"product": "p1", "quantity": 2, "sku": "SKU-p1"}]
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!([order_fixture("o1", &ctx.user.id, "pending")])),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;

    let mut emptied = cart;
    emptied["items"] = json!([]);
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/carts"))
        .and(query_param("id", format!("eq.{}", cart_id)))
        .and(body_partial_json(json!({"items": [], "totalItems": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([emptied])))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let response = ctx.app().oneshot(ctx.request("POST", "/", Some(order_body()))).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], "o1");
    assert_eq!(body["data"]["totalPrice"], 40.0);
}

// ==============================================================================
// READING ORDERS
// ==============================================================================

#[tokio::test]
async fn test_other_customers_order_is_forbidden() {
    let ctx = TestContext::new().await;
    ctx.mount_order(order_fixture("o2", "someone-else", "pending")).await;

    let response = ctx.app().oneshot(ctx.request("GET", "/o2", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_can_read_any_order() {
    let ctx = TestContext::new().await;
    ctx.mount_order(order_fixture("o2", "someone-else", "pending")).await;

    let response = ctx
        .app()
        .oneshot(ctx.request_as(&ctx.admin, "GET", "/o2", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_order_is_not_found() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&ctx.server)
        .await;

    let response = ctx.app().oneshot(ctx.request("GET", "/nope", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_listing_requires_admin_role() {
    let ctx = TestContext::new().await;

    let response = ctx.app().oneshot(ctx.request("GET", "/admin/all", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_listing_filters_by_status() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/orders"))
        .and(query_param("orderStatus", "eq.shipped"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([order_fixture("o3", "u9", "shipped")])),
        )
        .mount(&ctx.server)
        .await;

    let response = ctx
        .app()
        .oneshot(ctx.request_as(&ctx.admin, "GET", "/admin/all?status=shipped", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["count"], 1);
}

// ==============================================================================
// LIFECYCLE
// ==============================================================================

#[tokio::test]
async fn test_cancel_restores_stock() {
    let ctx = TestContext::new().await;
    ctx.mount_order(order_fixture("o1", &ctx.user.id, "pending")).await;
    ctx.mount_product(MockStoreResponses::product("p1", 20.0, 8)).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/orders"))
        .and(query_param("orderStatus", "eq.pending"))
        .and(body_partial_json(json!({"orderStatus": "cancelled"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([order_fixture("o1", &ctx.user.id, "cancelled")])),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/products"))
        .and(body_partial_json(json!({"stock": 10})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([MockStoreResponses::product("p1", 20.0, 10)])),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;

    let response = ctx.app().oneshot(ctx.request("PUT", "/o1/cancel", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["orderStatus"], "cancelled");
}

#[tokio::test]
async fn test_shipped_order_cannot_be_cancelled() {
    let ctx = TestContext::new().await;
    ctx.mount_order(order_fixture("o1", &ctx.user.id, "shipped")).await;

    let response = ctx.app().oneshot(ctx.request("PUT", "/o1/cancel", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pay_marks_order_paid() {
    let ctx = TestContext::new().await;
    ctx.mount_order(order_fixture("o1", &ctx.user.id, "pending")).await;

    let mut paid = order_fixture("o1", &ctx.user.id, "pending");
    paid["isPaid"] = json!(true);
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/orders"))
        .and(body_partial_json(json!({"isPaid": true, "paymentResult": {"id": "pay_1"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([paid])))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let payment = json!({
        "id": "pay_1",
        "status": "COMPLETED",
        "updateTime": "2024-01-02T00:00:00Z",
        "emailAddress": "buyer@example.com"
    });
    let response = ctx
        .app()
        .oneshot(ctx.request("PUT", "/o1/pay", Some(payment)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["isPaid"], true);
}

#[tokio::test]
async fn test_cancelled_order_cannot_be_paid() {
    let ctx = TestContext::new().await;
    ctx.mount_order(order_fixture("o1", &ctx.user.id, "cancelled")).await;

    let payment = json!({
        "id": "pay_1",
        "status": "COMPLETED",
        "updateTime": "2024-01-02T00:00:00Z",
        "emailAddress": "buyer@example.com"
    });
    let response = ctx
        .app()
        .oneshot(ctx.request("PUT", "/o1/pay", Some(payment)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["error"], "Cancelled orders cannot be paid");
}

#[tokio::test]
async fn test_status_update_rejects_skipped_steps() {
    let ctx = TestContext::new().await;
    ctx.mount_order(order_fixture("o1", "u9", "pending")).await;

    let response = ctx
        .app()
        .oneshot(ctx.request_as(&ctx.admin, "PUT", "/o1/status", Some(json!({"status": "delivered"}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["error"], "Invalid status transition from pending to delivered");
}

#[tokio::test]
async fn test_status_update_rejects_unknown_status() {
    let ctx = TestContext::new().await;

    let response = ctx
        .app()
        .oneshot(ctx.request_as(&ctx.admin, "PUT", "/o1/status", Some(json!({"status": "lost"}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delivered_sets_delivery_fields() {
    let ctx = TestContext::new().await;
    ctx.mount_order(order_fixture("o1", "u9", "shipped")).await;

    let mut delivered = order_fixture("o1", "u9", "delivered");
    delivered["isDelivered"] = json!(true);
    delivered["deliveredAt"] = json!("2024-01-05T00:00:00Z");
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/orders"))
        .and(query_param("orderStatus", "eq.shipped"))
        .and(body_partial_json(json!({"orderStatus": "delivered", "isDelivered": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([delivered])))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let response = ctx
        .app()
        .oneshot(ctx.request_as(&ctx.admin, "PUT", "/o1/status", Some(json!({"status": "delivered"}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["isDelivered"], true);
}

#[tokio::test]
async fn test_concurrent_status_change_is_a_conflict() {
    let ctx = TestContext::new().await;
    ctx.mount_order(order_fixture("o1", "u9", "pending")).await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&ctx.server)
        .await;

    let response = ctx
        .app()
        .oneshot(ctx.request_as(&ctx.admin, "PUT", "/o1/status", Some(json!({"status": "processing"}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}
