// giftshop-core/src/services/mod.rs
//
// One service per storefront area. Each validates input, talks to the
// repository traits and returns display-ready data.

pub mod user_service;
pub mod catalog_service;
pub mod gift_editor_service;
pub mod purchase_service;
pub mod task_service;
pub mod lootbox_task_service;
pub mod roulette_service;

pub use user_service::UserService;
pub use catalog_service::CatalogService;
pub use gift_editor_service::GiftEditorService;
pub use purchase_service::PurchaseService;
pub use task_service::TaskService;
pub use lootbox_task_service::LootBoxTaskService;
pub use roulette_service::{transform_prizes_to_client_format, RouletteService};
