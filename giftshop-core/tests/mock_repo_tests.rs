// tests/mock_repo_tests.rs

use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use mockall::predicate::eq;
use uuid::Uuid;

use giftshop_common::models::{Gift, LootBoxPrize, PrizeEntryInput};
use giftshop_common::traits::repository_traits::{GiftRepository, PrizeRepository};
use giftshop_core::services::{CatalogService, GiftEditorService, RouletteService};
use giftshop_core::test_utils::{sample_gift, MemoryStore};
use giftshop_core::{Error, ShopConfig};

mock! {
    GiftRepo {}
    #[async_trait]
    impl GiftRepository for GiftRepo {
        async fn create_gift(&self, gift: &Gift) -> Result<(), Error>;
        async fn get_gift(&self, gift_id: Uuid) -> Result<Option<Gift>, Error>;
        async fn update_gift(&self, gift: &Gift) -> Result<(), Error>;
        async fn delete_gift(&self, gift_id: Uuid) -> Result<(), Error>;
        async fn list_gifts(&self, offset: i64, limit: i64) -> Result<Vec<Gift>, Error>;
        async fn count_gifts(&self) -> Result<i64, Error>;
        async fn list_special_offers(&self) -> Result<Vec<Gift>, Error>;
        async fn search_gifts(&self, query: &str, limit: i64) -> Result<Vec<Gift>, Error>;
    }
}

mock! {
    PrizeRepo {}
    #[async_trait]
    impl PrizeRepository for PrizeRepo {
        async fn list_prizes(&self) -> Result<Vec<(LootBoxPrize, Option<Gift>)>, Error>;
        async fn replace_prizes(&self, prizes: &[LootBoxPrize]) -> Result<(), Error>;
        async fn count_prizes_for_gift(&self, gift_id: Uuid) -> Result<i64, Error>;
    }
}

#[tokio::test]
async fn test_search_uses_configured_limit() -> Result<(), Error> {
    let mut gifts = MockGiftRepo::new();
    gifts
        .expect_search_gifts()
        .with(eq("rose"), eq(7_i64))
        .times(1)
        .returning(|_, _| Ok(vec![sample_gift("Rose", 5, 5)]));

    let config = ShopConfig { search_limit: 7, ..ShopConfig::default() };
    let catalog = CatalogService::new(Arc::new(gifts), config);
    let found = catalog.search_gifts("rose").await?;
    assert_eq!(found.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_store_errors_surface_as_internal() {
    let mut gifts = MockGiftRepo::new();
    gifts
        .expect_list_special_offers()
        .returning(|| Err(Error::Database(sqlx::Error::PoolTimedOut)));

    let catalog = CatalogService::new(Arc::new(gifts), ShopConfig::default());
    let err = catalog.list_special_offers().await.unwrap_err();
    assert!(err.is_internal());
    assert_eq!(err.code(), "INTERNAL_ERROR");
}

#[tokio::test]
async fn test_missing_gift_never_reaches_delete() {
    let mut gifts = MockGiftRepo::new();
    gifts.expect_get_gift().returning(|_| Ok(None));
    gifts.expect_delete_gift().never();
    let mut prizes = MockPrizeRepo::new();
    prizes.expect_count_prizes_for_gift().never();

    let editor = GiftEditorService::new(Arc::new(gifts), Arc::new(prizes), Arc::new(MemoryStore::new()));
    let err = editor.delete_gift(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_invalid_roulette_save_never_writes() {
    let gift = sample_gift("Bear", 5, 5);
    let gift_id = gift.id;

    let mut gifts = MockGiftRepo::new();
    gifts
        .expect_get_gift()
        .with(eq(gift_id))
        .returning(move |_| Ok(Some(gift.clone())));
    let mut prizes = MockPrizeRepo::new();
    prizes.expect_replace_prizes().never();
    prizes.expect_list_prizes().returning(|| Ok(vec![]));

    let roulette = RouletteService::new(Arc::new(prizes), Arc::new(gifts), ShopConfig::default());
    let entry = PrizeEntryInput {
        loot_box_prize_id: None,
        gift_id,
        drop_chance: 101.0,
        color: "red".into(),
        max_wins: None,
        current_wins: 0,
        is_active: true,
    };
    let err = roulette.save_roulette_prizes(&[entry]).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}
