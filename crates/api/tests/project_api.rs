//! HTTP-level integration tests for projects, role views and candidate
//! search.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{
    body_json, delete_auth, get_auth, north_of, post_json_auth, seed_user, seed_vendor, token,
    ORIGIN,
};
use serde_json::json;
use vendorlink_core::vendor_role::VendorRole;
use vendorlink_core::roles::CallerRole;
use vendorlink_db::store::memory::MemoryLedgerStore;
use vendorlink_db::store::LedgerStore;

fn candidates_uri(project_id: i64, extra: &str) -> String {
    format!(
        "/api/v1/projects/{project_id}/candidates?role=caterer&longitude={}&latitude={}{extra}",
        ORIGIN.longitude, ORIGIN.latitude
    )
}

#[tokio::test]
async fn create_and_list_projects() {
    let store = Arc::new(MemoryLedgerStore::new());
    let user = seed_user(&store, "asha@example.com").await;
    let user_token = token(user.id, CallerRole::User);
    let app = || common::build_test_app(Arc::clone(&store));

    let response = post_json_auth(
        app(),
        "/api/v1/projects",
        json!({ "name": "  Wedding " }),
        &user_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Wedding");
    assert_eq!(json["data"]["user_id"], user.id);

    let response = get_auth(app(), "/api/v1/projects", &user_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let projects = json["data"].as_array().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["name"], "Wedding");
    assert!(projects[0]["sent_requests"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_project_name_ignoring_case_is_a_conflict() {
    let store = Arc::new(MemoryLedgerStore::new());
    let user = seed_user(&store, "asha@example.com").await;
    store.create_project(user.id, "Wedding").await.unwrap();

    let response = post_json_auth(
        common::build_test_app(Arc::clone(&store)),
        "/api/v1/projects",
        json!({ "name": "WEDDING" }),
        &token(user.id, CallerRole::User),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn blank_project_name_is_rejected() {
    let store = Arc::new(MemoryLedgerStore::new());
    let user = seed_user(&store, "asha@example.com").await;

    let response = post_json_auth(
        common::build_test_app(Arc::clone(&store)),
        "/api/v1/projects",
        json!({ "name": "" }),
        &token(user.id, CallerRole::User),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn another_users_project_is_not_found() {
    let store = Arc::new(MemoryLedgerStore::new());
    let owner = seed_user(&store, "asha@example.com").await;
    let stranger = seed_user(&store, "ravi@example.com").await;
    let project = store.create_project(owner.id, "Wedding").await.unwrap();

    let response = get_auth(
        common::build_test_app(Arc::clone(&store)),
        &format!("/api/v1/projects/{}", project.id),
        &token(stranger.id, CallerRole::User),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn candidates_are_nearest_first_and_exclude_targeted_vendors() {
    let store = Arc::new(MemoryLedgerStore::new());
    let user = seed_user(&store, "asha@example.com").await;
    let user_token = token(user.id, CallerRole::User);
    let project = store.create_project(user.id, "Wedding").await.unwrap();
    let far = seed_vendor(&store, "far@example.com", VendorRole::Caterer, north_of(ORIGIN, 12.0)).await;
    let near = seed_vendor(&store, "near@example.com", VendorRole::Caterer, north_of(ORIGIN, 3.0)).await;
    let mid = seed_vendor(&store, "mid@example.com", VendorRole::Caterer, north_of(ORIGIN, 7.0)).await;
    seed_vendor(&store, "distant@example.com", VendorRole::Caterer, north_of(ORIGIN, 60.0)).await;
    seed_vendor(&store, "lens@example.com", VendorRole::Photographer, ORIGIN).await;
    let app = || common::build_test_app(Arc::clone(&store));

    let response = get_auth(app(), &candidates_uri(project.id, ""), &user_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let ids: Vec<i64> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![near.id, mid.id, far.id]);
    let distance = json["data"][0]["distance_km"].as_f64().unwrap();
    assert!((distance - 3.0).abs() < 1e-6, "got {distance}");

    // Target the nearest caterer; it drops out of the next search.
    let response = post_json_auth(
        app(),
        "/api/v1/requests",
        json!({
            "project_id": project.id,
            "vendor_ids": [near.id],
            "role": "caterer",
            "location": { "longitude": ORIGIN.longitude, "latitude": ORIGIN.latitude },
            "start_at": "2025-06-01T17:00:00Z",
            "end_at": "2025-06-01T23:00:00Z",
            "description": "Reception dinner",
        }),
        &user_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = get_auth(app(), &candidates_uri(project.id, "&radius_km=10"), &user_token).await;
    let json = body_json(response).await;
    let ids: Vec<i64> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![mid.id]);

    let response = get_auth(
        app(),
        &format!("/api/v1/projects/{}/roles/ongoing", project.id),
        &user_token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"], json!(["caterer"]));
}

#[tokio::test]
async fn oversized_radius_is_rejected() {
    let store = Arc::new(MemoryLedgerStore::new());
    let user = seed_user(&store, "asha@example.com").await;
    let project = store.create_project(user.id, "Wedding").await.unwrap();

    let response = get_auth(
        common::build_test_app(Arc::clone(&store)),
        &candidates_uri(project.id, "&radius_km=5000"),
        &token(user.id, CallerRole::User),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn purge_unaccepted_removes_open_requests_for_the_role() {
    let store = Arc::new(MemoryLedgerStore::new());
    let user = seed_user(&store, "asha@example.com").await;
    let user_token = token(user.id, CallerRole::User);
    let project = store.create_project(user.id, "Wedding").await.unwrap();
    let a = seed_vendor(&store, "a@example.com", VendorRole::Caterer, ORIGIN).await;
    let b = seed_vendor(&store, "b@example.com", VendorRole::Caterer, ORIGIN).await;
    let app = || common::build_test_app(Arc::clone(&store));

    let response = post_json_auth(
        app(),
        "/api/v1/requests",
        json!({
            "project_id": project.id,
            "vendor_ids": [a.id, b.id],
            "role": "caterer",
            "location": { "longitude": ORIGIN.longitude, "latitude": ORIGIN.latitude },
            "start_at": "2025-06-01T17:00:00Z",
            "end_at": "2025-06-01T23:00:00Z",
            "description": "Reception dinner",
        }),
        &user_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = delete_auth(
        app(),
        &format!("/api/v1/projects/{}/roles/caterer/pending", project.id),
        &user_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["deleted"], 2);
    assert!(json["data"]["failed"].as_array().unwrap().is_empty());

    let response = get_auth(
        app(),
        &format!("/api/v1/projects/{}/requests", project.id),
        &user_token,
    )
    .await;
    let json = body_json(response).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}
