// giftshop-core/src/http/public.rs
//
// Routes the Mini-App calls on behalf of a shopper.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use giftshop_common::models::{ClientPrize, Gift, LootBoxTask, Page, Purchase, Task};

use super::extract::{Json, Path, Query};
use super::{respond, ApiResult, AppState, Buyer};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub gift_id: Uuid,
    #[serde(default = "one")]
    pub quantity: i32,
}

fn one() -> i32 {
    1
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponse {
    pub task_id: Uuid,
    pub balance: i64,
}

pub async fn list_gifts(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> ApiResult<Page<Gift>> {
    respond(state.catalog.list_gifts(q.page, q.page_size).await)
}

pub async fn special_offers(State(state): State<AppState>) -> ApiResult<Vec<Gift>> {
    respond(state.catalog.list_special_offers().await)
}

pub async fn search_gifts(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> ApiResult<Vec<Gift>> {
    respond(state.catalog.search_gifts(&q.q).await)
}

pub async fn get_gift(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Gift> {
    respond(state.catalog.get_gift(id).await)
}

pub async fn create_purchase(
    State(state): State<AppState>,
    Buyer(buyer): Buyer,
    Json(req): Json<PurchaseRequest>,
) -> ApiResult<Purchase> {
    respond(state.purchases.purchase_gift(&buyer, req.gift_id, req.quantity).await)
}

pub async fn my_purchases(State(state): State<AppState>, Buyer(buyer): Buyer) -> ApiResult<Vec<Purchase>> {
    respond(state.purchases.list_user_purchases(&buyer).await)
}

pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Vec<Task>> {
    respond(state.tasks.list_available_tasks().await)
}

pub async fn complete_task(
    State(state): State<AppState>,
    Buyer(buyer): Buyer,
    Path(id): Path<Uuid>,
) -> ApiResult<CompletionResponse> {
    let outcome = state.tasks.complete_task(&buyer, id).await;
    respond(outcome.map(|user| CompletionResponse { task_id: id, balance: user.balance }))
}

pub async fn list_lootbox_tasks(State(state): State<AppState>) -> ApiResult<Vec<LootBoxTask>> {
    respond(state.lootbox_tasks.list_lootbox_tasks(true).await)
}

pub async fn roulette_prizes(State(state): State<AppState>) -> ApiResult<Vec<ClientPrize>> {
    respond(state.roulette.get_playable_prizes().await)
}
