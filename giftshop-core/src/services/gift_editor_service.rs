use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use giftshop_common::models::Gift;
use giftshop_common::traits::repository_traits::{GiftRepository, PrizeRepository, PurchaseRepository};

use crate::dialect::GiftForm;
use crate::Error;

/// Admin create/edit workflow for gifts. Forms are normalized through the
/// dialect adapter before anything reaches the repository.
pub struct GiftEditorService {
    gift_repo: Arc<dyn GiftRepository>,
    prize_repo: Arc<dyn PrizeRepository>,
    purchase_repo: Arc<dyn PurchaseRepository>,
}

impl GiftEditorService {
    pub fn new(
        gift_repo: Arc<dyn GiftRepository>,
        prize_repo: Arc<dyn PrizeRepository>,
        purchase_repo: Arc<dyn PurchaseRepository>,
    ) -> Self {
        Self { gift_repo, prize_repo, purchase_repo }
    }

    pub async fn create_gift(&self, form: &GiftForm) -> Result<Gift, Error> {
        let input = form.normalize()?;
        let now = Utc::now();
        let gift = Gift {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            media_url: input.media_url,
            price: input.price,
            quantity: input.quantity,
            sold: 0,
            is_special_offer: input.is_special_offer,
            backdrop_variant: input.backdrop_variant,
            tags: input.tags,
            created_at: now,
            updated_at: now,
        };
        self.gift_repo.create_gift(&gift).await?;
        info!("Created gift '{}' ({})", gift.name, gift.id);
        Ok(gift)
    }

    pub async fn update_gift(&self, gift_id: Uuid, form: &GiftForm) -> Result<Gift, Error> {
        let input = form.normalize()?;
        let mut gift = self.load(gift_id).await?;

        if input.quantity < gift.sold {
            return Err(Error::invalid(
                "quantity",
                format!("cannot be below the {} already sold", gift.sold),
            ));
        }

        gift.name = input.name;
        gift.description = input.description;
        gift.media_url = input.media_url;
        gift.price = input.price;
        gift.quantity = input.quantity;
        gift.is_special_offer = input.is_special_offer;
        gift.backdrop_variant = input.backdrop_variant;
        gift.tags = input.tags;
        gift.updated_at = Utc::now();

        self.gift_repo.update_gift(&gift).await?;
        info!("Updated gift '{}' ({})", gift.name, gift.id);
        Ok(gift)
    }

    /// The edit page's prefilled form. A missing gift is `NotFound`.
    pub async fn get_gift_for_edit(&self, gift_id: Uuid) -> Result<GiftForm, Error> {
        let gift = self.load(gift_id).await?;
        Ok(GiftForm::from(&gift))
    }

    /// Refuses while a roulette slot or any purchase still points at the gift.
    pub async fn delete_gift(&self, gift_id: Uuid) -> Result<(), Error> {
        self.load(gift_id).await?;
        let slots = self.prize_repo.count_prizes_for_gift(gift_id).await?;
        if slots > 0 {
            return Err(Error::Conflict(format!(
                "gift {} is used by {} roulette slot(s)",
                gift_id, slots
            )));
        }
        let purchases = self.purchase_repo.count_purchases_for_gift(gift_id).await?;
        if purchases > 0 {
            return Err(Error::Conflict(format!(
                "gift {} has {} purchase(s) on record",
                gift_id, purchases
            )));
        }
        self.gift_repo.delete_gift(gift_id).await?;
        info!("Deleted gift {}", gift_id);
        Ok(())
    }

    async fn load(&self, gift_id: Uuid) -> Result<Gift, Error> {
        self.gift_repo
            .get_gift(gift_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("gift {}", gift_id)))
    }
}
