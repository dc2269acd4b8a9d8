use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use giftshop_common::models::{Purchase, PurchaseStatus, TelegramUser};
use giftshop_common::traits::repository_traits::{GiftRepository, PurchaseRepository};

use crate::services::user_service::UserService;
use crate::Error;

/// Largest quantity a single order may ask for.
pub const MAX_QUANTITY_PER_ORDER: i32 = 100;

pub struct PurchaseService {
    gift_repo: Arc<dyn GiftRepository>,
    purchase_repo: Arc<dyn PurchaseRepository>,
    user_service: Arc<UserService>,
}

impl PurchaseService {
    pub fn new(
        gift_repo: Arc<dyn GiftRepository>,
        purchase_repo: Arc<dyn PurchaseRepository>,
        user_service: Arc<UserService>,
    ) -> Self {
        Self { gift_repo, purchase_repo, user_service }
    }

    /// Validates a buy request and records a PENDING purchase.
    ///
    /// The checks here give precise errors up front; the repository repeats
    /// stock and balance checks inside its transaction.
    pub async fn purchase_gift(
        &self,
        buyer: &TelegramUser,
        gift_id: Uuid,
        quantity: i32,
    ) -> Result<Purchase, Error> {
        if !(1..=MAX_QUANTITY_PER_ORDER).contains(&quantity) {
            return Err(Error::invalid(
                "quantity",
                format!("must be between 1 and {}", MAX_QUANTITY_PER_ORDER),
            ));
        }

        let gift = self
            .gift_repo
            .get_gift(gift_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("gift {}", gift_id)))?;

        if gift.remaining() < quantity {
            return Err(Error::OutOfStock(format!(
                "'{}' has {} left, {} requested",
                gift.name,
                gift.remaining(),
                quantity
            )));
        }

        let total_price = gift
            .price
            .checked_mul(i64::from(quantity))
            .ok_or_else(|| Error::invalid("quantity", "order total is too large"))?;

        let user = self.user_service.get_or_create_user(buyer).await?;
        if user.balance < total_price {
            return Err(Error::InsufficientFunds { needed: total_price, available: user.balance });
        }

        let now = Utc::now();
        let purchase = Purchase {
            id: Uuid::new_v4(),
            user_id: user.user_id,
            gift_id,
            quantity,
            total_price,
            price_per_item: gift.price,
            status: PurchaseStatus::Pending,
            admin_notes: None,
            sent_at: None,
            message_id: None,
            created_at: now,
            updated_at: now,
        };

        self.purchase_repo.create_purchase(&purchase).await?;
        info!(
            "Purchase {} created: user={} gift={} qty={} total={}",
            purchase.id, user.user_id, gift_id, quantity, total_price
        );
        Ok(purchase)
    }

    pub async fn list_user_purchases(&self, buyer: &TelegramUser) -> Result<Vec<Purchase>, Error> {
        let user = self.user_service.find_user_by_telegram_id(buyer.id).await;
        match user {
            Ok(u) => self.purchase_repo.list_purchases_for_user(u.user_id).await,
            // Nobody has bought anything before their first visit.
            Err(Error::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    pub async fn list_purchases(&self, status: Option<PurchaseStatus>) -> Result<Vec<Purchase>, Error> {
        self.purchase_repo.list_purchases(status).await
    }

    pub async fn get_purchase(&self, purchase_id: Uuid) -> Result<Purchase, Error> {
        self.purchase_repo
            .get_purchase(purchase_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("purchase {}", purchase_id)))
    }

    /// Admin: the gift was delivered.
    pub async fn mark_sent(
        &self,
        purchase_id: Uuid,
        message_id: Option<String>,
        admin_notes: Option<String>,
    ) -> Result<Purchase, Error> {
        let p = self
            .purchase_repo
            .transition_purchase(purchase_id, PurchaseStatus::Sent, admin_notes, message_id, Utc::now())
            .await?;
        info!("Purchase {} marked SENT", purchase_id);
        Ok(p)
    }

    /// Admin: cancel, restoring stock and refunding the buyer.
    pub async fn cancel_purchase(
        &self,
        purchase_id: Uuid,
        admin_notes: Option<String>,
    ) -> Result<Purchase, Error> {
        let p = self
            .purchase_repo
            .transition_purchase(purchase_id, PurchaseStatus::Cancelled, admin_notes, None, Utc::now())
            .await?;
        warn!("Purchase {} CANCELLED, refunded {}", purchase_id, p.total_price);
        Ok(p)
    }
}
