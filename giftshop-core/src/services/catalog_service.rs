use std::sync::Arc;

use uuid::Uuid;

use giftshop_common::models::{Gift, Page};
use giftshop_common::traits::repository_traits::GiftRepository;

use crate::{Error, ShopConfig};

/// Read side of the gift catalog.
pub struct CatalogService {
    gift_repo: Arc<dyn GiftRepository>,
    config: ShopConfig,
}

impl CatalogService {
    pub fn new(gift_repo: Arc<dyn GiftRepository>, config: ShopConfig) -> Self {
        Self { gift_repo, config }
    }

    /// `page` is 1-based; 0 is treated as 1.
    pub async fn list_gifts(&self, page: Option<u32>, page_size: Option<u32>) -> Result<Page<Gift>, Error> {
        let page = page.unwrap_or(1).max(1);
        let page_size = self.config.page_size(page_size);
        let offset = i64::from(page - 1) * i64::from(page_size);

        let items = self.gift_repo.list_gifts(offset, i64::from(page_size)).await?;
        let total = self.gift_repo.count_gifts().await?;
        Ok(Page { items, page, page_size, total })
    }

    pub async fn list_special_offers(&self) -> Result<Vec<Gift>, Error> {
        self.gift_repo.list_special_offers().await
    }

    pub async fn get_gift(&self, gift_id: Uuid) -> Result<Gift, Error> {
        self.gift_repo
            .get_gift(gift_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("gift {}", gift_id)))
    }

    pub async fn search_gifts(&self, query: &str) -> Result<Vec<Gift>, Error> {
        self.gift_repo.search_gifts(query, self.config.search_limit).await
    }
}
