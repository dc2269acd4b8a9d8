// File: giftshop-core/src/test_utils/memory.rs
//
// In-process store implementing every repository trait. One lock guards all
// tables so multi-table writes (purchases, completions) stay atomic, the same
// way a single Postgres transaction does.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use giftshop_common::models::{
    Gift, LootBoxPrize, LootBoxTask, Purchase, PurchaseStatus, Task, TaskCompletion, TelegramUser,
    User,
};
use giftshop_common::traits::repository_traits::{
    GiftRepository, LootBoxTaskRepository, PrizeRepository, PurchaseRepository, TaskRepository,
    UserRepository,
};

use crate::Error;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    gifts: HashMap<Uuid, Gift>,
    prizes: Vec<LootBoxPrize>,
    purchases: HashMap<Uuid, Purchase>,
    tasks: HashMap<Uuid, Task>,
    completions: Vec<TaskCompletion>,
    lootbox_tasks: HashMap<Uuid, LootBoxTask>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following write fail like a dropped connection.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Database(sqlx::Error::PoolClosed));
        }
        Ok(())
    }

    /// Seeds a gift directly, bypassing validation.
    pub async fn insert_gift(&self, gift: Gift) {
        self.tables.lock().await.gifts.insert(gift.id, gift);
    }

    /// Seeds a user with the given balance.
    pub async fn insert_user(&self, telegram_id: i64, balance: i64) -> User {
        let now = Utc::now();
        let user = User {
            user_id: Uuid::new_v4(),
            telegram_id,
            username: None,
            first_name: None,
            balance,
            is_admin: false,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().await.users.insert(user.user_id, user.clone());
        user
    }

    /// Seeds prize slots as stored rows, dangling gift references included.
    pub async fn insert_prizes(&self, prizes: Vec<LootBoxPrize>) {
        self.tables.lock().await.prizes.extend(prizes);
    }

    pub async fn prizes(&self) -> Vec<LootBoxPrize> {
        self.tables.lock().await.prizes.clone()
    }

    pub async fn completions(&self) -> Vec<TaskCompletion> {
        self.tables.lock().await.completions.clone()
    }

    pub async fn user_by_telegram_id(&self, telegram_id: i64) -> Option<User> {
        self.tables
            .lock()
            .await
            .users
            .values()
            .find(|u| u.telegram_id == telegram_id)
            .cloned()
    }
}

fn newest_first<T, F>(items: &mut [T], created: F)
where
    F: Fn(&T) -> DateTime<Utc>,
{
    items.sort_by(|a, b| created(b).cmp(&created(a)));
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, Error> {
        Ok(self.tables.lock().await.users.get(&user_id).cloned())
    }

    async fn find_user_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>, Error> {
        Ok(self.user_by_telegram_id(telegram_id).await)
    }

    async fn upsert_telegram_user(&self, tg: &TelegramUser) -> Result<User, Error> {
        self.check_writable()?;
        let mut t = self.tables.lock().await;
        let now = Utc::now();
        if let Some(user) = t.users.values_mut().find(|u| u.telegram_id == tg.id) {
            user.username = tg.username.clone();
            user.first_name = tg.first_name.clone();
            user.updated_at = now;
            return Ok(user.clone());
        }
        let user = User {
            user_id: Uuid::new_v4(),
            telegram_id: tg.id,
            username: tg.username.clone(),
            first_name: tg.first_name.clone(),
            balance: 0,
            is_admin: false,
            created_at: now,
            updated_at: now,
        };
        t.users.insert(user.user_id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl GiftRepository for MemoryStore {
    async fn create_gift(&self, gift: &Gift) -> Result<(), Error> {
        self.check_writable()?;
        self.tables.lock().await.gifts.insert(gift.id, gift.clone());
        Ok(())
    }

    async fn get_gift(&self, gift_id: Uuid) -> Result<Option<Gift>, Error> {
        Ok(self.tables.lock().await.gifts.get(&gift_id).cloned())
    }

    async fn update_gift(&self, gift: &Gift) -> Result<(), Error> {
        self.check_writable()?;
        let mut t = self.tables.lock().await;
        match t.gifts.get_mut(&gift.id) {
            Some(existing) => {
                *existing = gift.clone();
                Ok(())
            }
            None => Err(Error::NotFound(format!("gift {}", gift.id))),
        }
    }

    async fn delete_gift(&self, gift_id: Uuid) -> Result<(), Error> {
        self.check_writable()?;
        let mut t = self.tables.lock().await;
        let referenced = t.prizes.iter().any(|p| p.gift_id == gift_id)
            || t.purchases.values().any(|p| p.gift_id == gift_id);
        if referenced {
            return Err(Error::Conflict(format!("gift {} is still referenced", gift_id)));
        }
        t.gifts.remove(&gift_id);
        Ok(())
    }

    async fn list_gifts(&self, offset: i64, limit: i64) -> Result<Vec<Gift>, Error> {
        let mut gifts: Vec<Gift> = self.tables.lock().await.gifts.values().cloned().collect();
        newest_first(&mut gifts, |g| g.created_at);
        Ok(gifts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_gifts(&self) -> Result<i64, Error> {
        Ok(self.tables.lock().await.gifts.len() as i64)
    }

    async fn list_special_offers(&self) -> Result<Vec<Gift>, Error> {
        let mut gifts: Vec<Gift> = self
            .tables
            .lock()
            .await
            .gifts
            .values()
            .filter(|g| g.is_special_offer && g.in_stock())
            .cloned()
            .collect();
        newest_first(&mut gifts, |g| g.created_at);
        Ok(gifts)
    }

    async fn search_gifts(&self, query: &str, limit: i64) -> Result<Vec<Gift>, Error> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.list_gifts(0, limit).await;
        }
        let mut gifts: Vec<Gift> = self
            .tables
            .lock()
            .await
            .gifts
            .values()
            .filter(|g| {
                g.name.to_lowercase().contains(&needle)
                    || g.description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
                    || g.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        gifts.sort_by(|a, b| a.name.cmp(&b.name));
        gifts.truncate(limit.max(0) as usize);
        Ok(gifts)
    }
}

#[async_trait]
impl PrizeRepository for MemoryStore {
    async fn list_prizes(&self) -> Result<Vec<(LootBoxPrize, Option<Gift>)>, Error> {
        let t = self.tables.lock().await;
        let mut prizes = t.prizes.clone();
        prizes.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(prizes
            .into_iter()
            .map(|p| {
                let gift = t.gifts.get(&p.gift_id).cloned();
                (p, gift)
            })
            .collect())
    }

    async fn replace_prizes(&self, prizes: &[LootBoxPrize]) -> Result<(), Error> {
        self.check_writable()?;
        self.tables.lock().await.prizes = prizes.to_vec();
        Ok(())
    }

    async fn count_prizes_for_gift(&self, gift_id: Uuid) -> Result<i64, Error> {
        let t = self.tables.lock().await;
        Ok(t.prizes.iter().filter(|p| p.gift_id == gift_id).count() as i64)
    }
}

#[async_trait]
impl PurchaseRepository for MemoryStore {
    async fn create_purchase(&self, p: &Purchase) -> Result<(), Error> {
        self.check_writable()?;
        let mut t = self.tables.lock().await;

        let Some(gift) = t.gifts.get(&p.gift_id) else {
            return Err(Error::NotFound(format!("gift {}", p.gift_id)));
        };
        if gift.price != p.price_per_item {
            return Err(Error::Conflict(format!(
                "price of gift {} changed from {} to {}",
                p.gift_id, p.price_per_item, gift.price
            )));
        }
        if gift.remaining() < p.quantity {
            return Err(Error::OutOfStock(format!(
                "gift {} has {} left, {} requested",
                p.gift_id,
                gift.remaining(),
                p.quantity
            )));
        }
        let Some(user) = t.users.get(&p.user_id) else {
            return Err(Error::NotFound(format!("user {}", p.user_id)));
        };
        if user.balance < p.total_price {
            return Err(Error::InsufficientFunds { needed: p.total_price, available: user.balance });
        }

        if let Some(user) = t.users.get_mut(&p.user_id) {
            user.balance -= p.total_price;
            user.updated_at = p.created_at;
        }
        if let Some(gift) = t.gifts.get_mut(&p.gift_id) {
            gift.sold += p.quantity;
            gift.updated_at = p.created_at;
        }
        t.purchases.insert(p.id, p.clone());
        Ok(())
    }

    async fn get_purchase(&self, purchase_id: Uuid) -> Result<Option<Purchase>, Error> {
        Ok(self.tables.lock().await.purchases.get(&purchase_id).cloned())
    }

    async fn list_purchases_for_user(&self, user_id: Uuid) -> Result<Vec<Purchase>, Error> {
        let mut list: Vec<Purchase> = self
            .tables
            .lock()
            .await
            .purchases
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut list, |p| p.created_at);
        Ok(list)
    }

    async fn list_purchases(&self, status: Option<PurchaseStatus>) -> Result<Vec<Purchase>, Error> {
        let mut list: Vec<Purchase> = self
            .tables
            .lock()
            .await
            .purchases
            .values()
            .filter(|p| status.is_none_or(|s| p.status == s))
            .cloned()
            .collect();
        newest_first(&mut list, |p| p.created_at);
        Ok(list)
    }

    async fn transition_purchase(
        &self,
        purchase_id: Uuid,
        next: PurchaseStatus,
        admin_notes: Option<String>,
        message_id: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Purchase, Error> {
        self.check_writable()?;
        let mut t = self.tables.lock().await;

        let Some(mut purchase) = t.purchases.get(&purchase_id).cloned() else {
            return Err(Error::NotFound(format!("purchase {}", purchase_id)));
        };
        if !purchase.status.can_transition_to(next) {
            return Err(Error::Conflict(format!(
                "purchase {} is {}, cannot become {}",
                purchase_id, purchase.status, next
            )));
        }

        if next == PurchaseStatus::Cancelled {
            if let Some(gift) = t.gifts.get_mut(&purchase.gift_id) {
                gift.sold -= purchase.quantity;
                gift.updated_at = at;
            }
            if let Some(user) = t.users.get_mut(&purchase.user_id) {
                user.balance += purchase.total_price;
                user.updated_at = at;
            }
        }

        purchase.status = next;
        if admin_notes.is_some() {
            purchase.admin_notes = admin_notes;
        }
        if next == PurchaseStatus::Sent {
            purchase.sent_at = Some(at);
            purchase.message_id = message_id;
        }
        purchase.updated_at = at;
        t.purchases.insert(purchase_id, purchase.clone());
        Ok(purchase)
    }

    async fn count_purchases_for_gift(&self, gift_id: Uuid) -> Result<i64, Error> {
        let t = self.tables.lock().await;
        Ok(t.purchases.values().filter(|p| p.gift_id == gift_id).count() as i64)
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn create_task(&self, task: &Task) -> Result<(), Error> {
        self.check_writable()?;
        self.tables.lock().await.tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn get_task(&self, task_id: Uuid) -> Result<Option<Task>, Error> {
        Ok(self.tables.lock().await.tasks.get(&task_id).cloned())
    }

    async fn update_task(&self, task: &Task) -> Result<(), Error> {
        self.check_writable()?;
        let mut t = self.tables.lock().await;
        match t.tasks.get_mut(&task.id) {
            Some(existing) => {
                *existing = task.clone();
                Ok(())
            }
            None => Err(Error::NotFound(format!("task {}", task.id))),
        }
    }

    async fn delete_task(&self, task_id: Uuid) -> Result<(), Error> {
        self.check_writable()?;
        let mut t = self.tables.lock().await;
        t.tasks.remove(&task_id);
        t.completions.retain(|c| c.task_id != task_id);
        Ok(())
    }

    async fn list_tasks(&self, include_hidden: bool) -> Result<Vec<Task>, Error> {
        let mut list: Vec<Task> = self
            .tables
            .lock()
            .await
            .tasks
            .values()
            .filter(|task| include_hidden || task.is_visible)
            .cloned()
            .collect();
        newest_first(&mut list, |task| task.created_at);
        Ok(list)
    }

    async fn record_completion(
        &self,
        completion: &TaskCompletion,
        window_start: Option<DateTime<Utc>>,
        max_completions: Option<i32>,
    ) -> Result<User, Error> {
        self.check_writable()?;
        let mut t = self.tables.lock().await;

        if !t.tasks.contains_key(&completion.task_id) {
            return Err(Error::NotFound(format!("task {}", completion.task_id)));
        }
        let already = t.completions.iter().any(|c| {
            c.task_id == completion.task_id
                && c.user_id == completion.user_id
                && window_start.is_none_or(|ws| c.completed_at >= ws)
        });
        if already {
            return Err(Error::Conflict(format!(
                "task {} already completed for this period",
                completion.task_id
            )));
        }
        if let Some(max) = max_completions {
            let total = t.completions.iter().filter(|c| c.task_id == completion.task_id).count();
            if total as i64 >= i64::from(max) {
                return Err(Error::Conflict(format!(
                    "task {} reached its completion limit",
                    completion.task_id
                )));
            }
        }

        let Some(user) = t.users.get_mut(&completion.user_id) else {
            return Err(Error::NotFound(format!("user {}", completion.user_id)));
        };
        user.balance += completion.reward;
        user.updated_at = completion.completed_at;
        let user = user.clone();
        t.completions.push(completion.clone());
        Ok(user)
    }
}

#[async_trait]
impl LootBoxTaskRepository for MemoryStore {
    async fn create_lootbox_task(&self, task: &LootBoxTask) -> Result<(), Error> {
        self.check_writable()?;
        self.tables.lock().await.lootbox_tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn get_lootbox_task(&self, task_id: Uuid) -> Result<Option<LootBoxTask>, Error> {
        Ok(self.tables.lock().await.lootbox_tasks.get(&task_id).cloned())
    }

    async fn update_lootbox_task(&self, task: &LootBoxTask) -> Result<(), Error> {
        self.check_writable()?;
        let mut t = self.tables.lock().await;
        match t.lootbox_tasks.get_mut(&task.id) {
            Some(existing) => {
                *existing = task.clone();
                Ok(())
            }
            None => Err(Error::NotFound(format!("lootbox task {}", task.id))),
        }
    }

    async fn delete_lootbox_task(&self, task_id: Uuid) -> Result<(), Error> {
        self.check_writable()?;
        self.tables.lock().await.lootbox_tasks.remove(&task_id);
        Ok(())
    }

    async fn list_lootbox_tasks(&self, active_only: bool) -> Result<Vec<LootBoxTask>, Error> {
        let mut list: Vec<LootBoxTask> = self
            .tables
            .lock()
            .await
            .lootbox_tasks
            .values()
            .filter(|task| !active_only || task.is_active)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.created_at.cmp(&b.created_at)));
        Ok(list)
    }
}
