// src/repositories/mod.rs

pub use giftshop_common::traits::repository_traits::{
    GiftRepository, LootBoxTaskRepository, PrizeRepository, PurchaseRepository, TaskRepository,
    UserRepository,
};

pub use postgres::gift::PostgresGiftRepository;
pub use postgres::lootbox_task::PostgresLootBoxTaskRepository;
pub use postgres::prize::PostgresPrizeRepository;
pub use postgres::purchase::PostgresPurchaseRepository;
pub use postgres::task::PostgresTaskRepository;
pub use postgres::user::PostgresUserRepository;

pub mod postgres;
