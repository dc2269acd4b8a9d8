// tests/http_tests.rs

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use giftshop_core::http::router;
use giftshop_core::telegram::INIT_DATA_HEADER;
use giftshop_core::test_utils::{memory_app_state, sample_gift, MemoryStore};
use giftshop_core::ShopConfig;

fn app() -> (Arc<MemoryStore>, Router) {
    let store = Arc::new(MemoryStore::new());
    let app = router(memory_app_state(store.clone(), ShopConfig::default()));
    (store, app)
}

/// `user={"id":..,"first_name":"Bob"}` url-encoded the way Telegram sends it.
fn init_data(telegram_id: i64) -> String {
    let user = json!({ "id": telegram_id, "first_name": "Bob" }).to_string();
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("query_id", "AAE")
        .append_pair("user", &user)
        .append_pair("auth_date", "1700000000")
        .append_pair("hash", "abc")
        .finish()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_req(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (_, app) = app();
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_gift_edit_page_for_unknown_id_is_404() {
    let (_, app) = app();
    let (status, body) = send(&app, get(&format!("/api/admin/gifts/{}", Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_create_gift_validation_envelope() {
    let (_, app) = app();
    let (status, body) = send(
        &app,
        json_req("POST", "/api/admin/gifts", json!({ "name": "Rose", "price": "0" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["fieldErrors"]["price"], "must be at least 1");
    assert!(body["fieldErrors"]["media_url"].is_string());
}

#[tokio::test]
async fn test_create_then_fetch_gift() {
    let (_, app) = app();
    let form = json!({
        "name": "Rose",
        "media_url": "/media/rose.webp",
        "price": 12,
        "quantity": "3",
        "backdrop_variant": "yellow",
        "tags": "flowers"
    });
    let (status, body) = send(&app, json_req("POST", "/api/admin/gifts", form)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, get(&format!("/api/gifts/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["backdrop_variant"], "YELLOW");

    let (_, body) = send(&app, get(&format!("/api/admin/gifts/{id}"))).await;
    assert_eq!(body["data"]["backdrop_variant"], "yellow");
    assert_eq!(body["data"]["quantity"], 3);
}

#[tokio::test]
async fn test_purchase_requires_telegram_user() {
    let (store, app) = app();
    let gift = sample_gift("Star", 10, 5);
    store.insert_gift(gift.clone()).await;

    let (status, body) = send(
        &app,
        json_req("POST", "/api/purchases", json!({ "giftId": gift.id })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_purchase_with_init_data() {
    let (store, app) = app();
    let gift = sample_gift("Star", 10, 5);
    store.insert_gift(gift.clone()).await;
    store.insert_user(4242, 15).await;

    let buy = |qty: i32| {
        Request::builder()
            .method("POST")
            .uri("/api/purchases")
            .header("content-type", "application/json")
            .header(INIT_DATA_HEADER, init_data(4242))
            .body(Body::from(json!({ "giftId": gift.id, "quantity": qty }).to_string()))
            .unwrap()
    };

    let (status, body) = send(&app, buy(1)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "PENDING");

    let (status, body) = send(&app, buy(1)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INSUFFICIENT_FUNDS");

    let mine = Request::builder()
        .uri("/api/purchases/mine")
        .header("authorization", format!("tma {}", init_data(4242)))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, mine).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_roulette_save_over_ceiling_is_rejected() {
    let (store, app) = app();
    let gift = sample_gift("Gem", 10, 5);
    store.insert_gift(gift.clone()).await;

    let entries = json!({ "entries": [
        { "giftId": gift.id, "dropChance": 80.0, "color": "red" },
        { "giftId": gift.id, "dropChance": 30.0, "color": "blue" }
    ]});
    let (status, body) = send(&app, json_req("PUT", "/api/admin/roulette/prizes", entries)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fieldErrors"]["entries"].is_string());
    assert!(store.prizes().await.is_empty());

    let entries = json!({ "entries": [
        { "giftId": gift.id, "dropChance": 70.0, "color": "red" },
        { "giftId": gift.id, "dropChance": 30.0, "color": "blue", "isActive": true }
    ]});
    let (status, body) = send(&app, json_req("PUT", "/api/admin/roulette/prizes", entries)).await;
    assert_eq!(status, StatusCode::OK);
    let saved = body["data"].as_array().unwrap();
    assert_eq!(saved.len(), 2);
    assert_ne!(saved[0]["lootBoxPrizeId"], saved[0]["id"]);

    let (_, body) = send(&app, get("/api/roulette/prizes")).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_admin_purchase_filter_rejects_unknown_status() {
    let (_, app) = app();
    let (status, body) = send(&app, get("/api/admin/purchases?status=lost")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fieldErrors"]["status"].is_string());

    let (status, _) = send(&app, get("/api/admin/purchases?status=pending")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_complete_task_over_http() {
    let (_, app) = app();
    let form = json!({
        "task_type": "invite_friends",
        "title": "Bring a friend",
        "reward": 7,
        "friends_required": 1
    });
    let (status, body) = send(&app, json_req("POST", "/api/admin/tasks", form)).await;
    assert_eq!(status, StatusCode::OK);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let complete = || {
        Request::builder()
            .method("POST")
            .uri(format!("/api/tasks/{id}/complete"))
            .header(INIT_DATA_HEADER, init_data(77))
            .body(Body::empty())
            .unwrap()
    };
    let (status, body) = send(&app, complete()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["balance"], 7);

    let (status, body) = send(&app, complete()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_mistyped_form_field_uses_envelope() {
    let (_, app) = app();
    let (status, body) = send(
        &app,
        json_req("POST", "/api/admin/gifts", json!({ "name": "Rose", "price": true })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["fieldErrors"]["price"].is_string());
}

#[tokio::test]
async fn test_unparseable_id_is_404() {
    let (_, app) = app();
    for uri in ["/api/admin/gifts/not-a-uuid", "/api/gifts/not-a-uuid"] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}

#[tokio::test]
async fn test_bad_page_number_uses_envelope() {
    let (_, app) = app();
    let (status, body) = send(&app, get("/api/gifts?page=abc")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fieldErrors"]["query"].is_string());
}
