use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use storefront_api::{
    config::AppConfig,
    middleware::auth::issue_token,
    pricing::PricingPolicy,
    routes::build_app,
    state::AppState,
};
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "router-test-secret";

// None of these requests reach the database, so a lazy pool is enough.
fn app() -> Router {
    let config = AppConfig {
        database_url: "postgres://localhost/storefront_unused".into(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: SECRET.into(),
        jwt_ttl_hours: 1,
        cookie_secure: false,
        db_max_connections: 1,
        cors_allowed_origin: None,
        default_pricing: PricingPolicy::default(),
    };
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .expect("lazy pool");
    build_app(AppState::new(pool, config))
}

fn bearer(role: &str) -> String {
    let token = issue_token(Uuid::new_v4(), role, SECRET, 1).expect("token");
    format!("Bearer {token}")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn health_is_public() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body = json_body(response).await;
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn unknown_path_is_enveloped_404() {
    let response = app()
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json_body(response).await;
    assert_eq!(body["message"], "Not Found");
    assert_eq!(body["data"]["path"], "/nope");
}

#[tokio::test]
async fn cart_requires_credentials() {
    let response = app()
        .oneshot(Request::get("/api/cart").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = json_body(response).await;
    assert!(body["data"]["error"].is_string());
}

#[tokio::test]
async fn garbage_bearer_token_is_rejected() {
    let response = app()
        .oneshot(
            Request::get("/api/orders")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn customer_token_cannot_reach_admin_routes() {
    let response = app()
        .oneshot(
            Request::get("/api/admin/orders")
                .header(header::AUTHORIZATION, bearer("user"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app()
        .oneshot(
            Request::patch(format!("/api/admin/customers/{}/block", Uuid::new_v4()))
                .header(header::AUTHORIZATION, bearer("user"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn customer_cannot_create_products() {
    let payload = serde_json::json!({ "name": "Mug", "price": 1000, "stock": 3 });
    let response = app()
        .oneshot(
            Request::post("/api/products")
                .header(header::AUTHORIZATION, bearer("user"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn auth_cookie_is_accepted_like_a_bearer_token() {
    let token = issue_token(Uuid::new_v4(), "user", SECRET, 1).unwrap();
    let response = app()
        .oneshot(
            Request::get("/api/admin/analytics/summary")
                .header(header::COOKIE, format!("token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    // Authenticated through the cookie, then stopped by the role check.
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn logout_clears_cookie() {
    let response = app()
        .oneshot(
            Request::post("/api/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.starts_with("token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn openapi_docs_are_served() {
    let response = app()
        .oneshot(Request::get("/docs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn inactive_banners_are_admin_only() {
    let response = app()
        .oneshot(Request::get("/api/banners?all=true").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app()
        .oneshot(
            Request::get("/api/banners?all=true")
                .header(header::AUTHORIZATION, bearer("user"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn oversized_cart_quantity_is_a_validation_error() {
    let payload = serde_json::json!({ "product_id": Uuid::new_v4(), "quantity": i32::MAX });
    let response = app()
        .oneshot(
            Request::post("/api/cart")
                .header(header::AUTHORIZATION, bearer("user"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
