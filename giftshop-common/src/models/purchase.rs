// File: giftshop-common/src/models/purchase.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum PurchaseStatus {
    Pending,
    Sent,
    Cancelled,
}

impl PurchaseStatus {
    pub const ALL: [PurchaseStatus; 3] =
        [PurchaseStatus::Pending, PurchaseStatus::Sent, PurchaseStatus::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "PENDING",
            PurchaseStatus::Sent => "SENT",
            PurchaseStatus::Cancelled => "CANCELLED",
        }
    }

    /// Only pending purchases may move, and only to a terminal state.
    pub fn can_transition_to(&self, next: PurchaseStatus) -> bool {
        matches!(
            (self, next),
            (PurchaseStatus::Pending, PurchaseStatus::Sent)
                | (PurchaseStatus::Pending, PurchaseStatus::Cancelled)
        )
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PurchaseStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PurchaseStatus::Pending),
            "SENT" => Ok(PurchaseStatus::Sent),
            "CANCELLED" => Ok(PurchaseStatus::Cancelled),
            _ => Err(format!("Unknown purchase status: {}", s)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Purchase {
    pub id: Uuid,
    pub user_id: Uuid,
    pub gift_id: Uuid,
    pub quantity: i32,
    pub total_price: i64,
    /// Unit price at the moment of purchase.
    pub price_per_item: i64,
    pub status: PurchaseStatus,
    pub admin_notes: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    /// Telegram message that delivered the gift, if any.
    pub message_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
