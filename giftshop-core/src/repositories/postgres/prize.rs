// File: giftshop-core/src/repositories/postgres/prize.rs

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use giftshop_common::models::{Gift, LootBoxPrize};
use giftshop_common::traits::repository_traits::PrizeRepository;

use super::gift::gift_from_row;
use crate::Error;

pub struct PostgresPrizeRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresPrizeRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn prize_from_row(r: &PgRow) -> Result<LootBoxPrize, Error> {
    Ok(LootBoxPrize {
        id: r.try_get("id")?,
        gift_id: r.try_get("gift_id")?,
        drop_chance: r.try_get("drop_chance")?,
        color: r.try_get("color")?,
        max_wins: r.try_get("max_wins")?,
        current_wins: r.try_get("current_wins")?,
        is_active: r.try_get("is_active")?,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}

#[async_trait]
impl PrizeRepository for PostgresPrizeRepository {
    async fn list_prizes(&self) -> Result<Vec<(LootBoxPrize, Option<Gift>)>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT
                p.id, p.gift_id, p.drop_chance, p.color, p.max_wins, p.current_wins,
                p.is_active, p.created_at, p.updated_at,
                g.id               AS g_id,
                g.name             AS g_name,
                g.description      AS g_description,
                g.media_url        AS g_media_url,
                g.price            AS g_price,
                g.quantity         AS g_quantity,
                g.sold             AS g_sold,
                g.is_special_offer AS g_is_special_offer,
                g.backdrop_variant AS g_backdrop_variant,
                g.tags             AS g_tags,
                g.created_at       AS g_created_at,
                g.updated_at       AS g_updated_at
            FROM loot_box_prizes p
            LEFT JOIN gifts g ON g.id = p.gift_id
            ORDER BY p.created_at ASC, p.id
            "#,
        )
            .fetch_all(&self.pool)
            .await?;

        let mut list = Vec::with_capacity(rows.len());
        for r in rows {
            let prize = prize_from_row(&r)?;
            let joined: Option<Uuid> = r.try_get("g_id")?;
            let gift = match joined {
                Some(_) => Some(gift_from_row(&r, "g_")?),
                None => None,
            };
            list.push((prize, gift));
        }
        Ok(list)
    }

    async fn replace_prizes(&self, prizes: &[LootBoxPrize]) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM loot_box_prizes")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        for p in prizes {
            sqlx::query(
                r#"
                INSERT INTO loot_box_prizes (
                    id, gift_id, drop_chance, color, max_wins, current_wins,
                    is_active, created_at, updated_at
                )
                VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
                "#,
            )
                .bind(p.id)
                .bind(p.gift_id)
                .bind(p.drop_chance)
                .bind(&p.color)
                .bind(p.max_wins)
                .bind(p.current_wins)
                .bind(p.is_active)
                .bind(p.created_at)
                .bind(p.updated_at)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!("Replaced roulette configuration: removed={} inserted={}", removed, prizes.len());
        Ok(())
    }

    async fn count_prizes_for_gift(&self, gift_id: Uuid) -> Result<i64, Error> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM loot_box_prizes WHERE gift_id = $1")
            .bind(gift_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }
}
