// File: giftshop-common/src/models/gift.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Card background shown behind a gift in the catalog.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum BackdropVariant {
    Yellow,
    Blue,
}

impl BackdropVariant {
    pub const ALL: [BackdropVariant; 2] = [BackdropVariant::Yellow, BackdropVariant::Blue];

    /// Storage form, as written to the `gifts.backdrop_variant` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackdropVariant::Yellow => "YELLOW",
            BackdropVariant::Blue => "BLUE",
        }
    }
}

impl fmt::Display for BackdropVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackdropVariant {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "YELLOW" => Ok(BackdropVariant::Yellow),
            "BLUE" => Ok(BackdropVariant::Blue),
            _ => Err(format!("Unknown backdrop variant: {}", s)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Gift {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub media_url: String,
    /// Unit price in in-app currency, at least 1.
    pub price: i64,
    /// Total stock ever made available, at least 1.
    pub quantity: i32,
    pub sold: i32,
    pub is_special_offer: bool,
    pub backdrop_variant: BackdropVariant,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Gift {
    pub fn remaining(&self) -> i32 {
        (self.quantity - self.sold).max(0)
    }

    pub fn in_stock(&self) -> bool {
        self.remaining() > 0
    }
}

/// Normalized create/edit payload in storage dialect.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GiftInput {
    pub name: String,
    pub description: Option<String>,
    pub media_url: String,
    pub price: i64,
    pub quantity: i32,
    pub is_special_offer: bool,
    pub backdrop_variant: BackdropVariant,
    pub tags: Vec<String>,
}

/// One page of a listing. `page` is 1-based.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 || self.total <= 0 {
            return 0;
        }
        let size = i64::from(self.page_size);
        ((self.total + size - 1) / size) as u32
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backdrop_storage_form_is_uppercase_only() {
        assert_eq!("BLUE".parse::<BackdropVariant>(), Ok(BackdropVariant::Blue));
        assert!("blue".parse::<BackdropVariant>().is_err());
        assert_eq!(serde_json::to_string(&BackdropVariant::Yellow).unwrap(), "\"YELLOW\"");
    }

    #[test]
    fn page_math() {
        let page: Page<u8> = Page { items: vec![], page: 2, page_size: 10, total: 21 };
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());

        let empty: Page<u8> = Page { items: vec![], page: 1, page_size: 10, total: 0 };
        assert_eq!(empty.total_pages(), 0);
        assert!(!empty.has_next());
    }
}
