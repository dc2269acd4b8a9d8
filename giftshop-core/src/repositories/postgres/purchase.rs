// File: giftshop-core/src/repositories/postgres/purchase.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use giftshop_common::models::{Purchase, PurchaseStatus};
use giftshop_common::traits::repository_traits::PurchaseRepository;

use super::parse_column;
use crate::Error;

pub struct PostgresPurchaseRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresPurchaseRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

const PURCHASE_COLUMNS: &str = r#"
    id, user_id, gift_id, quantity, total_price, price_per_item, status,
    admin_notes, sent_at, message_id, created_at, updated_at
"#;

fn purchase_from_row(r: &PgRow) -> Result<Purchase, Error> {
    let status: String = r.try_get("status")?;
    Ok(Purchase {
        id: r.try_get("id")?,
        user_id: r.try_get("user_id")?,
        gift_id: r.try_get("gift_id")?,
        quantity: r.try_get("quantity")?,
        total_price: r.try_get("total_price")?,
        price_per_item: r.try_get("price_per_item")?,
        status: parse_column::<PurchaseStatus>("status", &status)?,
        admin_notes: r.try_get("admin_notes")?,
        sent_at: r.try_get("sent_at")?,
        message_id: r.try_get("message_id")?,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}

#[async_trait]
impl PurchaseRepository for PostgresPurchaseRepository {
    async fn create_purchase(&self, p: &Purchase) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        // Lock the gift row so concurrent buyers serialize on stock.
        let gift_row = sqlx::query(
            "SELECT price, quantity, sold FROM gifts WHERE id = $1 FOR UPDATE",
        )
            .bind(p.gift_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(gift_row) = gift_row else {
            return Err(Error::NotFound(format!("gift {}", p.gift_id)));
        };

        let price: i64 = gift_row.try_get("price")?;
        let quantity: i32 = gift_row.try_get("quantity")?;
        let sold: i32 = gift_row.try_get("sold")?;

        if price != p.price_per_item {
            return Err(Error::Conflict(format!(
                "price of gift {} changed from {} to {}",
                p.gift_id, p.price_per_item, price
            )));
        }
        if quantity - sold < p.quantity {
            return Err(Error::OutOfStock(format!(
                "gift {} has {} left, {} requested",
                p.gift_id,
                (quantity - sold).max(0),
                p.quantity
            )));
        }

        let debited = sqlx::query(
            r#"
            UPDATE users
               SET balance = balance - $1, updated_at = $2
             WHERE user_id = $3 AND balance >= $1
            "#,
        )
            .bind(p.total_price)
            .bind(p.created_at)
            .bind(p.user_id)
            .execute(&mut *tx)
            .await?;

        if debited.rows_affected() == 0 {
            let balance: Option<i64> = sqlx::query("SELECT balance FROM users WHERE user_id = $1")
                .bind(p.user_id)
                .fetch_optional(&mut *tx)
                .await?
                .map(|r| r.try_get("balance"))
                .transpose()?;
            return match balance {
                Some(available) => Err(Error::InsufficientFunds { needed: p.total_price, available }),
                None => Err(Error::NotFound(format!("user {}", p.user_id))),
            };
        }

        sqlx::query("UPDATE gifts SET sold = sold + $1, updated_at = $2 WHERE id = $3")
            .bind(p.quantity)
            .bind(p.created_at)
            .bind(p.gift_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO purchases (
                id, user_id, gift_id, quantity, total_price, price_per_item, status,
                admin_notes, sent_at, message_id, created_at, updated_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
            "#,
        )
            .bind(p.id)
            .bind(p.user_id)
            .bind(p.gift_id)
            .bind(p.quantity)
            .bind(p.total_price)
            .bind(p.price_per_item)
            .bind(p.status.as_str())
            .bind(&p.admin_notes)
            .bind(p.sent_at)
            .bind(&p.message_id)
            .bind(p.created_at)
            .bind(p.updated_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_purchase(&self, purchase_id: Uuid) -> Result<Option<Purchase>, Error> {
        let sql = format!("SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(purchase_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(purchase_from_row).transpose()
    }

    async fn list_purchases_for_user(&self, user_id: Uuid) -> Result<Vec<Purchase>, Error> {
        let sql = format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE user_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(purchase_from_row).collect()
    }

    async fn list_purchases(&self, status: Option<PurchaseStatus>) -> Result<Vec<Purchase>, Error> {
        let sql = format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases \
             WHERE ($1::TEXT IS NULL OR status = $1) \
             ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(purchase_from_row).collect()
    }

    async fn transition_purchase(
        &self,
        purchase_id: Uuid,
        next: PurchaseStatus,
        admin_notes: Option<String>,
        message_id: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Purchase, Error> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(purchase_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Err(Error::NotFound(format!("purchase {}", purchase_id)));
        };
        let mut purchase = purchase_from_row(&row)?;

        if !purchase.status.can_transition_to(next) {
            return Err(Error::Conflict(format!(
                "purchase {} is {}, cannot become {}",
                purchase_id, purchase.status, next
            )));
        }

        if next == PurchaseStatus::Cancelled {
            sqlx::query("UPDATE gifts SET sold = sold - $1, updated_at = $2 WHERE id = $3")
                .bind(purchase.quantity)
                .bind(at)
                .bind(purchase.gift_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("UPDATE users SET balance = balance + $1, updated_at = $2 WHERE user_id = $3")
                .bind(purchase.total_price)
                .bind(at)
                .bind(purchase.user_id)
                .execute(&mut *tx)
                .await?;
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

        sqlx::query(
            r#"
            UPDATE purchases
            SET status = $1, admin_notes = $2, sent_at = $3, message_id = $4, updated_at = $5
            WHERE id = $6
            "#,
        )
            .bind(purchase.status.as_str())
            .bind(&purchase.admin_notes)
            .bind(purchase.sent_at)
            .bind(&purchase.message_id)
            .bind(purchase.updated_at)
            .bind(purchase.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(purchase)
    }

    async fn count_purchases_for_gift(&self, gift_id: Uuid) -> Result<i64, Error> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM purchases WHERE gift_id = $1")
            .bind(gift_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }
}
