#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use vendorlink_api::auth::jwt::{generate_access_token, Claims, JwtConfig};
use vendorlink_api::config::{SearchConfig, ServerConfig};
use vendorlink_api::router::build_app_router;
use vendorlink_api::state::AppState;
use vendorlink_core::geo::GeoPoint;
use vendorlink_core::roles::CallerRole;
use vendorlink_core::types::DbId;
use vendorlink_core::vendor_role::VendorRole;
use vendorlink_db::models::user::{CreateUser, User};
use vendorlink_db::models::vendor::{CreateVendor, Vendor};
use vendorlink_db::store::memory::MemoryLedgerStore;
use vendorlink_db::store::LedgerStore;

/// Bangalore city centre; fixtures are placed relative to it.
pub const ORIGIN: GeoPoint = GeoPoint {
    longitude: 77.5946,
    latitude: 12.9716,
};

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// a 30-second request timeout and a fixed JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        search: SearchConfig::default(),
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the full application router over the given in-memory store, with
/// the same middleware stack production uses.
pub fn build_test_app(store: Arc<MemoryLedgerStore>) -> Router {
    let config = test_config();
    let state = AppState::new(store, config.clone());
    build_app_router(state, &config)
}

/// Issue a bearer token for `id` acting as `role`.
pub fn token(id: DbId, role: CallerRole) -> String {
    generate_access_token(id, role, &test_config().jwt).expect("token generation should succeed")
}

pub fn admin_token() -> String {
    token(0, CallerRole::Admin)
}

/// Sign a token carrying an arbitrary `role` claim.
pub fn token_with_role_claim(id: DbId, role: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: id,
        role: role.to_string(),
        exp: now + 900,
        iat: now,
        jti: uuid::Uuid::new_v4().to_string(),
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(test_config().jwt.secret.as_bytes()),
    )
    .expect("encoding should succeed")
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

pub async fn seed_user(store: &MemoryLedgerStore, email: &str) -> User {
    store
        .create_user(&CreateUser {
            name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            phone: "+91 98450 11111".to_string(),
            profile_image: None,
        })
        .await
        .expect("user creation should succeed")
}

pub async fn seed_vendor(
    store: &MemoryLedgerStore,
    email: &str,
    role: VendorRole,
    location: GeoPoint,
) -> Vendor {
    store
        .create_vendor(&CreateVendor {
            name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            phone: "+91 98450 00000".to_string(),
            role,
            description: "Weddings and corporate events".to_string(),
            location,
            profile_image: None,
            work_images: Vec::new(),
        })
        .await
        .expect("vendor creation should succeed")
}

/// A point `km` kilometres due north of `origin`.
pub fn north_of(origin: GeoPoint, km: f64) -> GeoPoint {
    GeoPoint {
        longitude: origin.longitude,
        latitude: origin.latitude
            + (km / vendorlink_core::geo::EARTH_RADIUS_KM).to_degrees(),
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
