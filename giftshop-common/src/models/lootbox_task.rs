// File: giftshop-common/src/models/lootbox_task.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A channel-subscription task that feeds the lootbox flow.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LootBoxTask {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub icon: Option<String>,
    pub channel_url: String,
    /// Derived from the last path segment of `channel_url`.
    pub channel_id: String,
    pub chat_id: i64,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LootBoxTaskInput {
    pub title: String,
    pub description: String,
    pub icon: Option<String>,
    pub channel_url: String,
    pub channel_id: String,
    pub chat_id: i64,
    pub sort_order: i32,
    pub is_active: bool,
}
