// tests/service_tests.rs

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

use giftshop_common::models::{PurchaseStatus, TaskMetadata, TelegramUser};
use giftshop_core::dialect::{FormNumber, GiftForm, LootBoxTaskForm, TaskForm};
use giftshop_core::http::AppState;
use giftshop_core::test_utils::{memory_app_state, sample_gift, MemoryStore};
use giftshop_core::{Error, ShopConfig};

fn setup() -> (Arc<MemoryStore>, AppState) {
    let store = Arc::new(MemoryStore::new());
    let state = memory_app_state(store.clone(), ShopConfig::default());
    (store, state)
}

fn tg(id: i64) -> TelegramUser {
    TelegramUser {
        id,
        first_name: Some("Ann".into()),
        last_name: None,
        username: Some(format!("user{id}")),
        language_code: Some("en".into()),
    }
}

fn gift_form(name: &str, price: i64, quantity: i64) -> GiftForm {
    GiftForm {
        name: Some(name.into()),
        description: Some("A lovely gift".into()),
        media_url: Some("https://cdn.example.com/g.webp".into()),
        price: Some(FormNumber::from(price)),
        quantity: Some(FormNumber::Text(quantity.to_string())),
        is_special_offer: Some(false),
        backdrop_variant: Some("blue".into()),
        tags: Some("Cute, plush, cute".into()),
    }
}

fn visit_task(starts_at: Option<String>) -> TaskForm {
    TaskForm {
        task_type: Some("visit_link".into()),
        duration: Some("daily".into()),
        title: Some("Visit our site".into()),
        reward: Some(FormNumber::from(15)),
        url: Some("https://example.com".into()),
        starts_at,
        ..TaskForm::default()
    }
}

// ---- gift editor ----

#[tokio::test]
async fn test_create_and_edit_gift_round_trip() -> Result<(), Error> {
    let (_, state) = setup();

    let gift = state.gift_editor.create_gift(&gift_form("Teddy", 20, 5)).await?;
    assert_eq!(gift.quantity, 5);
    assert_eq!(gift.tags, vec!["cute".to_string(), "plush".to_string()]);

    let form = state.gift_editor.get_gift_for_edit(gift.id).await?;
    assert_eq!(form.backdrop_variant.as_deref(), Some("blue"));
    assert_eq!(form.name.as_deref(), Some("Teddy"));

    let mut edited = form.clone();
    edited.price = Some(FormNumber::from(30));
    let updated = state.gift_editor.update_gift(gift.id, &edited).await?;
    assert_eq!(updated.price, 30);
    assert_eq!(updated.created_at, gift.created_at);
    Ok(())
}

#[tokio::test]
async fn test_edit_unknown_gift_is_not_found() {
    let (_, state) = setup();
    let err = state.gift_editor.get_gift_for_edit(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let err = state
        .gift_editor
        .update_gift(Uuid::new_v4(), &gift_form("Ghost", 1, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_invalid_gift_form_reports_every_field() {
    let (_, state) = setup();
    let form = GiftForm {
        name: Some("   ".into()),
        price: Some(FormNumber::Text("abc".into())),
        quantity: Some(FormNumber::from(0)),
        backdrop_variant: Some("green".into()),
        ..GiftForm::default()
    };
    match state.gift_editor.create_gift(&form).await {
        Err(Error::Validation(fields)) => {
            for f in ["name", "media_url", "price", "quantity", "backdrop_variant"] {
                assert!(fields.contains(f), "missing error for {f}");
            }
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    let listed = state.catalog.list_gifts(None, None).await.unwrap();
    assert_eq!(listed.total, 0);
}

#[tokio::test]
async fn test_gift_in_roulette_cannot_be_deleted() -> Result<(), Error> {
    let (_, state) = setup();
    let gift = state.gift_editor.create_gift(&gift_form("Star", 5, 5)).await?;
    state
        .roulette
        .save_roulette_prizes(&[giftshop_common::models::PrizeEntryInput {
            loot_box_prize_id: None,
            gift_id: gift.id,
            drop_chance: 10.0,
            color: "gold".into(),
            max_wins: None,
            current_wins: 0,
            is_active: true,
        }])
        .await?;

    let err = state.gift_editor.delete_gift(gift.id).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    state.roulette.save_roulette_prizes(&[]).await?;
    assert_ok!(state.gift_editor.delete_gift(gift.id).await);
    assert_err!(state.catalog.get_gift(gift.id).await);
    Ok(())
}

#[tokio::test]
async fn test_gift_with_purchases_cannot_be_deleted() -> Result<(), Error> {
    let (store, state) = setup();
    let gift = sample_gift("Cake", 10, 5);
    store.insert_gift(gift.clone()).await;
    store.insert_user(555, 50).await;
    let purchase = state.purchases.purchase_gift(&tg(555), gift.id, 1).await?;

    let err = state.gift_editor.delete_gift(gift.id).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    // Cancelled purchases still keep the history row.
    state.purchases.cancel_purchase(purchase.id, None).await?;
    assert_err!(state.gift_editor.delete_gift(gift.id).await);
    assert_ok!(state.catalog.get_gift(gift.id).await);
    Ok(())
}

// ---- catalog ----

#[tokio::test]
async fn test_catalog_pages_and_special_offers() -> Result<(), Error> {
    let (store, state) = setup();
    for i in 0..5 {
        let mut g = sample_gift(&format!("Gift{i}"), 10, 10);
        g.created_at = Utc::now() - Duration::minutes(i);
        g.is_special_offer = i % 2 == 0;
        store.insert_gift(g).await;
    }

    let page = state.catalog.list_gifts(Some(2), Some(2)).await?;
    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].name, "Gift2");
    assert_eq!(page.total_pages(), 3);
    assert!(page.has_next());

    // Oversized page sizes are clamped.
    let all = state.catalog.list_gifts(None, Some(10_000)).await?;
    assert_eq!(all.page_size, ShopConfig::default().max_page_size);
    assert_eq!(all.items.len(), 5);

    assert_eq!(state.catalog.list_special_offers().await?.len(), 3);
    Ok(())
}

// ---- purchases ----

#[tokio::test]
async fn test_purchase_debits_and_reserves() -> Result<(), Error> {
    let (store, state) = setup();
    let gift = sample_gift("Rose", 10, 3);
    store.insert_gift(gift.clone()).await;
    store.insert_user(1001, 100).await;

    let purchase = state.purchases.purchase_gift(&tg(1001), gift.id, 2).await?;
    assert_eq!(purchase.status, PurchaseStatus::Pending);
    assert_eq!(purchase.total_price, 20);

    let buyer = store.user_by_telegram_id(1001).await.unwrap();
    assert_eq!(buyer.balance, 80);
    assert_eq!(state.catalog.get_gift(gift.id).await?.sold, 2);

    let mine = state.purchases.list_user_purchases(&tg(1001)).await?;
    assert_eq!(mine.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_purchase_refuses_without_stock_or_funds() -> Result<(), Error> {
    let (store, state) = setup();
    let gift = sample_gift("Cake", 40, 1);
    store.insert_gift(gift.clone()).await;
    store.insert_user(7, 30).await;

    let err = state.purchases.purchase_gift(&tg(7), gift.id, 1).await.unwrap_err();
    assert!(matches!(err, Error::InsufficientFunds { needed: 40, available: 30 }));

    let err = state.purchases.purchase_gift(&tg(7), gift.id, 2).await.unwrap_err();
    assert!(matches!(err, Error::OutOfStock(_)));

    let err = state.purchases.purchase_gift(&tg(7), gift.id, 0).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = state.purchases.purchase_gift(&tg(7), Uuid::new_v4(), 1).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    assert_eq!(store.user_by_telegram_id(7).await.unwrap().balance, 30);
    assert_eq!(state.catalog.get_gift(gift.id).await?.sold, 0);
    Ok(())
}

#[tokio::test]
async fn test_cancel_refunds_and_sent_is_final() -> Result<(), Error> {
    let (store, state) = setup();
    let gift = sample_gift("Ring", 25, 4);
    store.insert_gift(gift.clone()).await;
    store.insert_user(55, 100).await;

    let first = state.purchases.purchase_gift(&tg(55), gift.id, 2).await?;
    let second = state.purchases.purchase_gift(&tg(55), gift.id, 1).await?;

    let cancelled = state.purchases.cancel_purchase(first.id, Some("out of season".into())).await?;
    assert_eq!(cancelled.status, PurchaseStatus::Cancelled);
    assert_eq!(store.user_by_telegram_id(55).await.unwrap().balance, 75);
    assert_eq!(state.catalog.get_gift(gift.id).await?.sold, 1);

    let sent = state.purchases.mark_sent(second.id, Some("msg-9".into()), None).await?;
    assert_eq!(sent.status, PurchaseStatus::Sent);
    assert!(sent.sent_at.is_some());

    let err = state.purchases.cancel_purchase(second.id, None).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    let pending = state.purchases.list_purchases(Some(PurchaseStatus::Pending)).await?;
    assert!(pending.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_first_visit_has_no_purchases() -> Result<(), Error> {
    let (_, state) = setup();
    assert!(state.purchases.list_user_purchases(&tg(404)).await?.is_empty());
    Ok(())
}

// ---- tasks ----

#[tokio::test]
async fn test_near_start_time_counts_as_immediate() -> Result<(), Error> {
    let (_, state) = setup();
    let now = Utc::now();

    let soon = (now + Duration::seconds(10)).to_rfc3339();
    let task = state.tasks.create_task_at(&visit_task(Some(soon)), now).await?;
    assert_eq!(task.starts_at, None);
    assert!(task.has_started(now));

    let later_ts = now + Duration::hours(1);
    let later = state
        .tasks
        .create_task_at(&visit_task(Some(later_ts.to_rfc3339())), now)
        .await?;
    assert_eq!(later.starts_at.map(|t| t.timestamp()), Some(later_ts.timestamp()));

    let available = state.tasks.list_available_tasks().await?;
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].id, task.id);
    Ok(())
}

#[tokio::test]
async fn test_complete_task_once_per_period() -> Result<(), Error> {
    let (store, state) = setup();
    store.insert_user(9, 0).await;
    let task = state.tasks.create_task(&visit_task(None)).await?;

    let user = state.tasks.complete_task(&tg(9), task.id).await?;
    assert_eq!(user.balance, 15);

    let err = state.tasks.complete_task(&tg(9), task.id).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    assert_eq!(store.completions().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_hidden_or_future_tasks_cannot_be_completed() -> Result<(), Error> {
    let (_, state) = setup();
    let task = state.tasks.create_task(&visit_task(None)).await?;
    state.tasks.set_task_flags(task.id, None, Some(false)).await?;
    let err = state.tasks.complete_task(&tg(3), task.id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let future = (Utc::now() + Duration::days(1)).to_rfc3339();
    let task = state.tasks.create_task(&visit_task(Some(future))).await?;
    let err = state.tasks.complete_task(&tg(3), task.id).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    Ok(())
}

#[tokio::test]
async fn test_subscription_task_metadata() -> Result<(), Error> {
    let (_, state) = setup();
    let form = TaskForm {
        task_type: Some("telegram_subscription".into()),
        title: Some("Join the channel".into()),
        reward: Some(FormNumber::from(5)),
        channel_url: Some("https://t.me/giftdrops".into()),
        chat_id: Some(FormNumber::Text("-1001234".into())),
        ..TaskForm::default()
    };
    let task = state.tasks.create_task(&form).await?;
    assert_eq!(
        task.metadata,
        TaskMetadata::TelegramSubscription {
            channel_url: "https://t.me/giftdrops".into(),
            chat_id: -1001234,
        }
    );

    let reloaded = TaskForm::from(&state.tasks.get_task(task.id).await?);
    assert_eq!(reloaded.task_type.as_deref(), Some("telegram_subscription"));
    assert_eq!(reloaded.duration.as_deref(), Some("one_time"));
    Ok(())
}

// ---- lootbox tasks ----

#[tokio::test]
async fn test_lootbox_task_channel_id_and_order() -> Result<(), Error> {
    let (_, state) = setup();
    let form = |url: &str, order: i64| LootBoxTaskForm {
        title: Some("Subscribe".into()),
        channel_url: Some(url.into()),
        chat_id: Some(FormNumber::from(-100_i64)),
        sort_order: Some(FormNumber::from(order)),
        ..LootBoxTaskForm::default()
    };

    let b = state.lootbox_tasks.create_lootbox_task(&form("https://t.me/second/", 2)).await?;
    let a = state.lootbox_tasks.create_lootbox_task(&form("t.me/first", 1)).await?;
    assert_eq!(a.channel_id, "first");
    assert_eq!(b.channel_id, "second");

    let listed = state.lootbox_tasks.list_lootbox_tasks(true).await?;
    assert_eq!(listed.iter().map(|t| t.id).collect::<Vec<_>>(), vec![a.id, b.id]);

    match state.lootbox_tasks.create_lootbox_task(&form("https://t.me/", 3)).await {
        Err(Error::Validation(fields)) => assert!(fields.contains("channel_url")),
        other => panic!("expected validation error, got {other:?}"),
    }
    Ok(())
}
