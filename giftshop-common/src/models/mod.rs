// File: giftshop-common/src/models/mod.rs
pub mod user;
pub mod gift;
pub mod prize;
pub mod purchase;
pub mod task;
pub mod lootbox_task;

pub use user::{TelegramUser, User};
pub use gift::{BackdropVariant, Gift, GiftInput, Page};
pub use prize::{ClientPrize, LootBoxPrize, LootBoxPrizeWithGift, PrizeEntryInput};
pub use purchase::{Purchase, PurchaseStatus};
pub use task::{Task, TaskCompletion, TaskDuration, TaskInput, TaskMetadata, TaskType};
pub use lootbox_task::{LootBoxTask, LootBoxTaskInput};
