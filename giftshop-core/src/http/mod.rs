// giftshop-core/src/http/mod.rs
//
// JSON routes for the Mini-App and the admin panel.

pub mod action;
pub mod admin;
pub mod extract;
pub mod public;

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use giftshop_common::models::TelegramUser;

use crate::services::{
    CatalogService, GiftEditorService, LootBoxTaskService, PurchaseService, RouletteService,
    TaskService, UserService,
};
use crate::telegram::InitData;
use crate::Error;

pub use action::{respond, ActionResult, ApiError, ApiResult};

/// Services shared by every route.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub catalog: Arc<CatalogService>,
    pub gift_editor: Arc<GiftEditorService>,
    pub purchases: Arc<PurchaseService>,
    pub tasks: Arc<TaskService>,
    pub lootbox_tasks: Arc<LootBoxTaskService>,
    pub roulette: Arc<RouletteService>,
}

/// The Telegram user behind a request, taken from its init data.
#[derive(Debug, Clone)]
pub struct Buyer(pub TelegramUser);

impl<S: Send + Sync> FromRequestParts<S> for Buyer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        InitData::from_headers(&parts.headers)
            .and_then(|d| d.user)
            .map(Buyer)
            .ok_or_else(|| Error::Unauthorized("open the shop from Telegram to continue".into()).into())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/gifts", get(public::list_gifts))
        .route("/api/gifts/special", get(public::special_offers))
        .route("/api/gifts/search", get(public::search_gifts))
        .route("/api/gifts/{id}", get(public::get_gift))
        .route("/api/purchases", post(public::create_purchase))
        .route("/api/purchases/mine", get(public::my_purchases))
        .route("/api/tasks", get(public::list_tasks))
        .route("/api/tasks/{id}/complete", post(public::complete_task))
        .route("/api/lootbox-tasks", get(public::list_lootbox_tasks))
        .route("/api/roulette/prizes", get(public::roulette_prizes))
        .route("/api/admin/gifts", post(admin::create_gift))
        .route(
            "/api/admin/gifts/{id}",
            get(admin::gift_for_edit)
                .put(admin::update_gift)
                .delete(admin::delete_gift),
        )
        .route(
            "/api/admin/roulette/prizes",
            get(admin::roulette_prizes).put(admin::save_roulette_prizes),
        )
        .route("/api/admin/purchases", get(admin::list_purchases))
        .route("/api/admin/purchases/{id}/sent", post(admin::mark_sent))
        .route("/api/admin/purchases/{id}/cancel", post(admin::cancel_purchase))
        .route("/api/admin/tasks", get(admin::list_tasks).post(admin::create_task))
        .route(
            "/api/admin/tasks/{id}",
            get(admin::get_task)
                .put(admin::update_task)
                .patch(admin::set_task_flags)
                .delete(admin::delete_task),
        )
        .route(
            "/api/admin/lootbox-tasks",
            get(admin::list_lootbox_tasks).post(admin::create_lootbox_task),
        )
        .route(
            "/api/admin/lootbox-tasks/{id}",
            get(admin::get_lootbox_task)
                .put(admin::update_lootbox_task)
                .delete(admin::delete_lootbox_task),
        )
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
