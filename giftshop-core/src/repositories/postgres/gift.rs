// File: giftshop-core/src/repositories/postgres/gift.rs

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use giftshop_common::models::{BackdropVariant, Gift};
use giftshop_common::traits::repository_traits::GiftRepository;

use super::parse_column;
use crate::Error;

const FOREIGN_KEY_VIOLATION: &str = "23503";

pub struct PostgresGiftRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresGiftRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

pub(crate) const GIFT_COLUMNS: &str = r#"
    id, name, description, media_url, price, quantity, sold, is_special_offer,
    backdrop_variant, tags, created_at, updated_at
"#;

/// Maps a row selected with `GIFT_COLUMNS`, optionally behind a column prefix
/// (`g_` when the gift is joined onto another table).
pub(crate) fn gift_from_row(r: &PgRow, prefix: &str) -> Result<Gift, Error> {
    let col = |name: &str| format!("{prefix}{name}");
    let backdrop: String = r.try_get(col("backdrop_variant").as_str())?;
    Ok(Gift {
        id: r.try_get(col("id").as_str())?,
        name: r.try_get(col("name").as_str())?,
        description: r.try_get(col("description").as_str())?,
        media_url: r.try_get(col("media_url").as_str())?,
        price: r.try_get(col("price").as_str())?,
        quantity: r.try_get(col("quantity").as_str())?,
        sold: r.try_get(col("sold").as_str())?,
        is_special_offer: r.try_get(col("is_special_offer").as_str())?,
        backdrop_variant: parse_column::<BackdropVariant>("backdrop_variant", &backdrop)?,
        tags: r.try_get(col("tags").as_str())?,
        created_at: r.try_get(col("created_at").as_str())?,
        updated_at: r.try_get(col("updated_at").as_str())?,
    })
}

/// Builds an ILIKE pattern that matches `query` literally.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl GiftRepository for PostgresGiftRepository {
    async fn create_gift(&self, gift: &Gift) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO gifts (
                id, name, description, media_url, price, quantity, sold,
                is_special_offer, backdrop_variant, tags, created_at, updated_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
            "#,
        )
            .bind(gift.id)
            .bind(&gift.name)
            .bind(&gift.description)
            .bind(&gift.media_url)
            .bind(gift.price)
            .bind(gift.quantity)
            .bind(gift.sold)
            .bind(gift.is_special_offer)
            .bind(gift.backdrop_variant.as_str())
            .bind(&gift.tags)
            .bind(gift.created_at)
            .bind(gift.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_gift(&self, gift_id: Uuid) -> Result<Option<Gift>, Error> {
        let sql = format!("SELECT {GIFT_COLUMNS} FROM gifts WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(gift_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| gift_from_row(&r, "")).transpose()
    }

    async fn update_gift(&self, gift: &Gift) -> Result<(), Error> {
        let result = sqlx::query(
            r#"
            UPDATE gifts
            SET
              name = $1,
              description = $2,
              media_url = $3,
              price = $4,
              quantity = $5,
              is_special_offer = $6,
              backdrop_variant = $7,
              tags = $8,
              updated_at = $9
            WHERE id = $10
            "#,
        )
            .bind(&gift.name)
            .bind(&gift.description)
            .bind(&gift.media_url)
            .bind(gift.price)
            .bind(gift.quantity)
            .bind(gift.is_special_offer)
            .bind(gift.backdrop_variant.as_str())
            .bind(&gift.tags)
            .bind(gift.updated_at)
            .bind(gift.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("gift {}", gift.id)));
        }
        Ok(())
    }

    async fn delete_gift(&self, gift_id: Uuid) -> Result<(), Error> {
        let result = sqlx::query("DELETE FROM gifts WHERE id = $1")
            .bind(gift_id)
            .execute(&self.pool)
            .await;
        match result {
            Ok(_) => Ok(()),
            // A purchase or slot landed after the caller's reference check.
            Err(e) if e.as_database_error().and_then(|d| d.code()).as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
                Err(Error::Conflict(format!("gift {} is still referenced", gift_id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_gifts(&self, offset: i64, limit: i64) -> Result<Vec<Gift>, Error> {
        let sql = format!(
            "SELECT {GIFT_COLUMNS} FROM gifts ORDER BY created_at DESC, id OFFSET $1 LIMIT $2"
        );
        let rows = sqlx::query(&sql)
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|r| gift_from_row(r, "")).collect()
    }

    async fn count_gifts(&self) -> Result<i64, Error> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM gifts")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }

    async fn list_special_offers(&self) -> Result<Vec<Gift>, Error> {
        let sql = format!(
            "SELECT {GIFT_COLUMNS} FROM gifts \
             WHERE is_special_offer AND sold < quantity \
             ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(|r| gift_from_row(r, "")).collect()
    }

    async fn search_gifts(&self, query: &str, limit: i64) -> Result<Vec<Gift>, Error> {
        let query = query.trim();
        if query.is_empty() {
            return self.list_gifts(0, limit).await;
        }

        let sql = format!(
            r#"
            SELECT {GIFT_COLUMNS}
            FROM gifts
            WHERE name ILIKE $1
               OR description ILIKE $1
               OR EXISTS (SELECT 1 FROM unnest(tags) AS t WHERE t ILIKE $1)
            ORDER BY name ASC
            LIMIT $2
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(like_pattern(query))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|r| gift_from_row(r, "")).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("teddy"), "%teddy%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
