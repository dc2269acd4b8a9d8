// File: giftshop-core/src/test_utils/mod.rs

pub mod helpers;
pub mod memory;

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use giftshop_common::models::{BackdropVariant, Gift};

use crate::http::AppState;
use crate::services::{
    CatalogService, GiftEditorService, LootBoxTaskService, PurchaseService, RouletteService,
    TaskService, UserService,
};
use crate::ShopConfig;

pub use helpers::{clean_database, create_test_db_pool, setup_test_database};
pub use memory::MemoryStore;

/// Wires every service onto one in-memory store.
pub fn memory_app_state(store: Arc<MemoryStore>, config: ShopConfig) -> AppState {
    let users = Arc::new(UserService::new(store.clone()));
    AppState {
        users: users.clone(),
        catalog: Arc::new(CatalogService::new(store.clone(), config.clone())),
        gift_editor: Arc::new(GiftEditorService::new(store.clone(), store.clone(), store.clone())),
        purchases: Arc::new(PurchaseService::new(store.clone(), store.clone(), users.clone())),
        tasks: Arc::new(TaskService::new(store.clone(), users, config.clone())),
        lootbox_tasks: Arc::new(LootBoxTaskService::new(store.clone())),
        roulette: Arc::new(RouletteService::new(store.clone(), store, config)),
    }
}

/// A stocked gift with sensible defaults.
pub fn sample_gift(name: &str, price: i64, quantity: i32) -> Gift {
    let now = Utc::now();
    Gift {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: Some(format!("{name} gift")),
        media_url: format!("https://cdn.example.com/{}.webp", name.to_lowercase()),
        price,
        quantity,
        sold: 0,
        is_special_offer: false,
        backdrop_variant: BackdropVariant::Yellow,
        tags: vec![],
        created_at: now,
        updated_at: now,
    }
}
