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

use cart_cell::router::cart_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockStoreResponses, TestConfig, TestUser};

struct TestContext {
    server: MockServer,
    config: AppConfig,
    user: TestUser,
    token: String,
}

impl TestContext {
    async fn new() -> Self {
        let server = MockServer::start().await;
        let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
        let user = TestUser::customer("shopper@example.com");
        let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(1));
        Self { server, config, user, token }
    }

    fn app(&self) -> Router {
        cart_routes(Arc::new(self.config.clone()))
    }

    fn request(&self, method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {}", self.token));
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn mount_product(&self, product: Value) {
        let id = product["id"].as_str().unwrap().to_string();
        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .and(query_param("id", format!("eq.{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([product.clone()])))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .and(query_param("id", format!("in.({})", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([product])))
            .mount(&self.server)
            .await;
    }

    async fn mount_cart(&self, cart: Option<Value>) {
        let rows = cart.map(|c| json!([c])).unwrap_or_else(|| json!([]));
        Mock::given(method("GET"))
            .and(path("/rest/v1/carts"))
            .and(query_param("user", format!("eq.{}", self.user.id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(rows))
            .mount(&self.server)
            .await;
    }
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_cart_requires_login() {
    let config = TestConfig::default().to_app_config();
    let app = cart_routes(Arc::new(config));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_cart_is_empty() {
    let ctx = TestContext::new().await;
    ctx.mount_cart(None).await;

    let response = ctx.app().oneshot(ctx.request("GET", "/", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["totalItems"], 0);
    assert_eq!(body["data"]["totalPrice"], 0.0);
    assert_eq!(body["data"]["items"], json!([]));
}

#[tokio::test]
async fn test_add_creates_cart_with_totals() {
    let ctx = TestContext::new().await;
    let mut product = MockStoreResponses::product("p1", 20.0, 10);
    product["discountPrice"] = json!(15.0);
    ctx.mount_product(product).await;
    ctx.mount_cart(None).await;

    let mut stored = MockStoreResponses::cart(&ctx.user.id, json!([
        MockStoreResponses::cart_item("i1", "p1", 2, 20.0)
    ]));
    stored["items"][0]["discountPrice"] = json!(15.0);
    stored["totalItems"] = json!(2);
    stored["totalPrice"] = json!(30.0);

    Mock::given(method("POST"))
        .and(path("/rest/v1/carts"))
        .and(body_partial_json(json!({"totalItems": 2, "totalPrice": 30.0})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([stored])))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let response = ctx
        .app()
        .oneshot(ctx.request("POST", "/add", Some(json!({"productId": "p1", "quantity": 2}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["totalPrice"], 30.0);
    assert_eq!(body["data"]["items"][0]["product"]["name"], "Product p1");
}

#[tokio::test]
async fn test_add_rejects_quantity_beyond_stock() {
    let ctx = TestContext::new().await;
    ctx.mount_product(MockStoreResponses::product("p1", 20.0, 3)).await;
    ctx.mount_cart(Some(MockStoreResponses::cart(
        &ctx.user.id,
        json!([MockStoreResponses::cart_item("i1", "p1", 2, 20.0)]),
    )))
    .await;

    let response = ctx
        .app()
        .oneshot(ctx.request("POST", "/add", Some(json!({"productId": "p1", "quantity": 2}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_validates_input() {
    let ctx = TestContext::new().await;

    let missing = ctx
        .app()
        .oneshot(ctx.request("POST", "/add", Some(json!({"quantity": 1}))))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let zero = ctx
        .app()
        .oneshot(ctx.request("POST", "/add", Some(json!({"productId": "p1", "quantity": 0}))))
        .await
        .unwrap();
    assert_eq!(zero.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_unknown_product_is_404() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&ctx.server)
        .await;

    let response = ctx
        .app()
        .oneshot(ctx.request("POST", "/add", Some(json!({"productId": "ghost"}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_remove_unknown_item_is_404() {
    let ctx = TestContext::new().await;
    ctx.mount_cart(Some(MockStoreResponses::cart(
        &ctx.user.id,
        json!([MockStoreResponses::cart_item("i1", "p1", 1, 20.0)]),
    )))
    .await;

    let response = ctx
        .app()
        .oneshot(ctx.request("DELETE", "/nope", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_without_cart_is_404() {
    let ctx = TestContext::new().await;
    ctx.mount_cart(None).await;

    let response = ctx
        .app()
        .oneshot(ctx.request("PUT", "/update", Some(json!({"itemId": "i1", "quantity": 2}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clear_routes_to_clear_not_remove() {
    let ctx = TestContext::new().await;
    ctx.mount_cart(Some(MockStoreResponses::cart(
        &ctx.user.id,
        json!([MockStoreResponses::cart_item("i1", "p1", 1, 20.0)]),
    )))
    .await;

    let cleared = MockStoreResponses::cart(&ctx.user.id, json!([]));
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/carts"))
        .and(body_partial_json(json!({"items": [], "totalItems": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([cleared])))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let response = ctx
        .app()
        .oneshot(ctx.request("DELETE", "/clear", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["totalItems"], 0);
}
