// giftshop-core/src/http/admin.rs
//
// Admin panel routes. Access control sits in front of the service.

use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use giftshop_common::models::{
    ClientPrize, Gift, LootBoxTask, PrizeEntryInput, Purchase, PurchaseStatus, Task,
};

use super::extract::{Json, Path, Query};
use super::{respond, ApiResult, AppState};
use crate::dialect::{DisplayEnum, GiftForm, LootBoxTaskForm, TaskForm};
use crate::Error;

#[derive(Debug, Deserialize)]
pub struct SaveRouletteRequest {
    pub entries: Vec<PrizeEntryInput>,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseNote {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFlags {
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_visible: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_hidden: bool,
}

// ---- gifts ----

pub async fn create_gift(State(state): State<AppState>, Json(form): Json<GiftForm>) -> ApiResult<Gift> {
    respond(state.gift_editor.create_gift(&form).await)
}

/// Loads the edit form. An unknown id is a 404, never a blank form.
pub async fn gift_for_edit(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<GiftForm> {
    respond(state.gift_editor.get_gift_for_edit(id).await)
}

pub async fn update_gift(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<GiftForm>,
) -> ApiResult<Gift> {
    respond(state.gift_editor.update_gift(id, &form).await)
}

pub async fn delete_gift(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Uuid> {
    respond(state.gift_editor.delete_gift(id).await.map(|_| id))
}

// ---- roulette ----

pub async fn roulette_prizes(State(state): State<AppState>) -> ApiResult<Vec<ClientPrize>> {
    respond(state.roulette.get_client_prizes().await)
}

/// Saves the whole configuration and returns it as stored.
pub async fn save_roulette_prizes(
    State(state): State<AppState>,
    Json(req): Json<SaveRouletteRequest>,
) -> ApiResult<Vec<ClientPrize>> {
    if let Err(e) = state.roulette.save_roulette_prizes(&req.entries).await {
        return respond(Err(e));
    }
    respond(state.roulette.get_client_prizes().await)
}

// ---- purchases ----

pub async fn list_purchases(
    State(state): State<AppState>,
    Query(q): Query<StatusQuery>,
) -> ApiResult<Vec<Purchase>> {
    let status = match q.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => None,
        Some(raw) => match PurchaseStatus::from_display(raw) {
            Some(s) => Some(s),
            None => {
                return respond(Err(Error::invalid(
                    "status",
                    format!("must be one of: {}", PurchaseStatus::expected()),
                )))
            }
        },
    };
    respond(state.purchases.list_purchases(status).await)
}

pub async fn mark_sent(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(note): Json<PurchaseNote>,
) -> ApiResult<Purchase> {
    respond(state.purchases.mark_sent(id, note.message_id, note.admin_notes).await)
}

pub async fn cancel_purchase(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(note): Json<PurchaseNote>,
) -> ApiResult<Purchase> {
    respond(state.purchases.cancel_purchase(id, note.admin_notes).await)
}

// ---- tasks ----

pub async fn list_tasks(State(state): State<AppState>, Query(q): Query<ListQuery>) -> ApiResult<Vec<Task>> {
    respond(state.tasks.list_tasks(q.include_hidden).await)
}

pub async fn get_task(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<TaskForm> {
    respond(state.tasks.get_task(id).await.map(|t| TaskForm::from(&t)))
}

pub async fn create_task(State(state): State<AppState>, Json(form): Json<TaskForm>) -> ApiResult<Task> {
    respond(state.tasks.create_task(&form).await)
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<TaskForm>,
) -> ApiResult<Task> {
    respond(state.tasks.update_task(id, &form).await)
}

pub async fn set_task_flags(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(flags): Json<TaskFlags>,
) -> ApiResult<Task> {
    respond(state.tasks.set_task_flags(id, flags.is_active, flags.is_visible).await)
}

pub async fn delete_task(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Uuid> {
    respond(state.tasks.delete_task(id).await.map(|_| id))
}

// ---- lootbox tasks ----

pub async fn list_lootbox_tasks(State(state): State<AppState>) -> ApiResult<Vec<LootBoxTask>> {
    respond(state.lootbox_tasks.list_lootbox_tasks(false).await)
}

pub async fn get_lootbox_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<LootBoxTaskForm> {
    respond(
        state
            .lootbox_tasks
            .get_lootbox_task(id)
            .await
            .map(|t| LootBoxTaskForm::from(&t)),
    )
}

pub async fn create_lootbox_task(
    State(state): State<AppState>,
    Json(form): Json<LootBoxTaskForm>,
) -> ApiResult<LootBoxTask> {
    respond(state.lootbox_tasks.create_lootbox_task(&form).await)
}

pub async fn update_lootbox_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<LootBoxTaskForm>,
) -> ApiResult<LootBoxTask> {
    respond(state.lootbox_tasks.update_lootbox_task(id, &form).await)
}

pub async fn delete_lootbox_task(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Uuid> {
    respond(state.lootbox_tasks.delete_lootbox_task(id).await.map(|_| id))
}
