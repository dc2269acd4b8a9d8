//! giftshop-server/src/context.rs
//!
//! Builds the repositories and services the router runs on.

use std::sync::Arc;

use tracing::info;

use giftshop_core::db::Database;
use giftshop_core::http::AppState;
use giftshop_core::repositories::{
    PostgresGiftRepository, PostgresLootBoxTaskRepository, PostgresPrizeRepository,
    PostgresPurchaseRepository, PostgresTaskRepository, PostgresUserRepository,
};
use giftshop_core::services::{
    CatalogService, GiftEditorService, LootBoxTaskService, PurchaseService, RouletteService,
    TaskService, UserService,
};
use giftshop_core::ShopConfig;

pub struct ServerContext {
    pub db: Database,
    pub config: ShopConfig,
    pub state: AppState,
}

impl ServerContext {
    pub fn new(db: Database, config: ShopConfig) -> Self {
        let pool = db.pool().clone();

        let user_repo = Arc::new(PostgresUserRepository::new(pool.clone()));
        let gift_repo = Arc::new(PostgresGiftRepository::new(pool.clone()));
        let prize_repo = Arc::new(PostgresPrizeRepository::new(pool.clone()));
        let purchase_repo = Arc::new(PostgresPurchaseRepository::new(pool.clone()));
        let task_repo = Arc::new(PostgresTaskRepository::new(pool.clone()));
        let lootbox_repo = Arc::new(PostgresLootBoxTaskRepository::new(pool));

        let users = Arc::new(UserService::new(user_repo));
        let state = AppState {
            users: users.clone(),
            catalog: Arc::new(CatalogService::new(gift_repo.clone(), config.clone())),
            gift_editor: Arc::new(GiftEditorService::new(
                gift_repo.clone(),
                prize_repo.clone(),
                purchase_repo.clone(),
            )),
            purchases: Arc::new(PurchaseService::new(gift_repo.clone(), purchase_repo, users.clone())),
            tasks: Arc::new(TaskService::new(task_repo, users, config.clone())),
            lootbox_tasks: Arc::new(LootBoxTaskService::new(lootbox_repo)),
            roulette: Arc::new(RouletteService::new(prize_repo, gift_repo, config.clone())),
        };
        info!("Server context ready: {:?}", config);

        Self { db, config, state }
    }
}
