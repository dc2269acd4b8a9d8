// File: giftshop-common/src/models/prize.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::gift::Gift;

/// One weighted slot in the roulette. Its `id` is the slot identity; the same
/// gift may back several slots with different chance or color.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LootBoxPrize {
    pub id: Uuid,
    pub gift_id: Uuid,
    /// Operator-assigned weight, in percent.
    pub drop_chance: f64,
    pub color: String,
    /// `None` means the slot can be won without limit.
    pub max_wins: Option<i32>,
    pub current_wins: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LootBoxPrize {
    pub fn is_exhausted(&self) -> bool {
        matches!(self.max_wins, Some(max) if self.current_wins >= max)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LootBoxPrizeWithGift {
    pub prize: LootBoxPrize,
    pub gift: Gift,
}

/// Flat shape handed to the roulette UI and the admin editor.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientPrize {
    /// Gift id.
    pub id: Uuid,
    pub name: String,
    pub media_url: String,
    pub price: i64,
    pub drop_chance: f64,
    pub color: String,
    pub max_wins: Option<i32>,
    pub current_wins: i32,
    pub is_active: bool,
    /// Prize-slot id, distinct from `id`.
    pub loot_box_prize_id: Uuid,
}

/// One slot as submitted by the editor on save.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrizeEntryInput {
    /// Present when the slot already existed; kept so slot ids survive a re-save.
    #[serde(default)]
    pub loot_box_prize_id: Option<Uuid>,
    pub gift_id: Uuid,
    pub drop_chance: f64,
    pub color: String,
    #[serde(default)]
    pub max_wins: Option<i32>,
    #[serde(default)]
    pub current_wins: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl From<&ClientPrize> for PrizeEntryInput {
    fn from(cp: &ClientPrize) -> Self {
        Self {
            loot_box_prize_id: Some(cp.loot_box_prize_id),
            gift_id: cp.id,
            drop_chance: cp.drop_chance,
            color: cp.color.clone(),
            max_wins: cp.max_wins,
            current_wins: cp.current_wins,
            is_active: cp.is_active,
        }
    }
}
