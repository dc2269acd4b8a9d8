use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Error;
use crate::models::{
    Gift, LootBoxPrize, LootBoxTask, Purchase, PurchaseStatus, Task, TaskCompletion,
    TelegramUser, User,
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, Error>;
    async fn find_user_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>, Error>;

    /// Inserts the user on first sight, otherwise refreshes the names Telegram reported.
    async fn upsert_telegram_user(&self, tg: &TelegramUser) -> Result<User, Error>;
}

#[async_trait]
pub trait GiftRepository: Send + Sync {
    async fn create_gift(&self, gift: &Gift) -> Result<(), Error>;
    async fn get_gift(&self, gift_id: Uuid) -> Result<Option<Gift>, Error>;
    async fn update_gift(&self, gift: &Gift) -> Result<(), Error>;
    async fn delete_gift(&self, gift_id: Uuid) -> Result<(), Error>;

    /// Newest first.
    async fn list_gifts(&self, offset: i64, limit: i64) -> Result<Vec<Gift>, Error>;
    async fn count_gifts(&self) -> Result<i64, Error>;
    async fn list_special_offers(&self) -> Result<Vec<Gift>, Error>;

    /// Case-insensitive match on name, description or tag. An empty query lists the newest gifts.
    async fn search_gifts(&self, query: &str, limit: i64) -> Result<Vec<Gift>, Error>;
}

#[async_trait]
pub trait PrizeRepository: Send + Sync {
    /// Every configured slot with its gift; `None` when the gift row is gone.
    async fn list_prizes(&self) -> Result<Vec<(LootBoxPrize, Option<Gift>)>, Error>;

    /// Replaces the whole configuration. Either every slot is written or none is.
    async fn replace_prizes(&self, prizes: &[LootBoxPrize]) -> Result<(), Error>;

    async fn count_prizes_for_gift(&self, gift_id: Uuid) -> Result<i64, Error>;
}

#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// Atomically reserves stock, debits the buyer and stores the purchase.
    ///
    /// Fails with `OutOfStock`, `InsufficientFunds` or `Conflict` (price moved
    /// since the caller read the gift) without side effects.
    async fn create_purchase(&self, purchase: &Purchase) -> Result<(), Error>;

    async fn get_purchase(&self, purchase_id: Uuid) -> Result<Option<Purchase>, Error>;
    async fn list_purchases_for_user(&self, user_id: Uuid) -> Result<Vec<Purchase>, Error>;
    async fn list_purchases(&self, status: Option<PurchaseStatus>) -> Result<Vec<Purchase>, Error>;

    /// Moves a PENDING purchase to `next`. Cancelling restores stock and refunds
    /// the buyer in the same transaction. `Conflict` if the purchase is no longer pending.
    async fn transition_purchase(
        &self,
        purchase_id: Uuid,
        next: PurchaseStatus,
        admin_notes: Option<String>,
        message_id: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Purchase, Error>;

    /// Purchases in any status that reference the gift.
    async fn count_purchases_for_gift(&self, gift_id: Uuid) -> Result<i64, Error>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create_task(&self, task: &Task) -> Result<(), Error>;
    async fn get_task(&self, task_id: Uuid) -> Result<Option<Task>, Error>;
    async fn update_task(&self, task: &Task) -> Result<(), Error>;
    async fn delete_task(&self, task_id: Uuid) -> Result<(), Error>;
    async fn list_tasks(&self, include_hidden: bool) -> Result<Vec<Task>, Error>;

    /// Stores a completion and credits its reward, in one transaction.
    ///
    /// `Conflict` when the user already completed the task since `window_start`
    /// (`None` = ever), or when `max_completions` is reached.
    async fn record_completion(
        &self,
        completion: &TaskCompletion,
        window_start: Option<DateTime<Utc>>,
        max_completions: Option<i32>,
    ) -> Result<User, Error>;
}

#[async_trait]
pub trait LootBoxTaskRepository: Send + Sync {
    async fn create_lootbox_task(&self, task: &LootBoxTask) -> Result<(), Error>;
    async fn get_lootbox_task(&self, task_id: Uuid) -> Result<Option<LootBoxTask>, Error>;
    async fn update_lootbox_task(&self, task: &LootBoxTask) -> Result<(), Error>;
    async fn delete_lootbox_task(&self, task_id: Uuid) -> Result<(), Error>;

    /// Ordered by `sort_order`, then creation time.
    async fn list_lootbox_tasks(&self, active_only: bool) -> Result<Vec<LootBoxTask>, Error>;
}
