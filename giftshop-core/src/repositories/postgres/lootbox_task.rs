// File: giftshop-core/src/repositories/postgres/lootbox_task.rs

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use giftshop_common::models::LootBoxTask;
use giftshop_common::traits::repository_traits::LootBoxTaskRepository;

use crate::Error;

pub struct PostgresLootBoxTaskRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresLootBoxTaskRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

const LOOTBOX_TASK_COLUMNS: &str = r#"
    id, title, description, icon, channel_url, channel_id, chat_id, sort_order,
    is_active, created_at, updated_at
"#;

fn lootbox_task_from_row(r: &PgRow) -> Result<LootBoxTask, Error> {
    Ok(LootBoxTask {
        id: r.try_get("id")?,
        title: r.try_get("title")?,
        description: r.try_get("description")?,
        icon: r.try_get("icon")?,
        channel_url: r.try_get("channel_url")?,
        channel_id: r.try_get("channel_id")?,
        chat_id: r.try_get("chat_id")?,
        sort_order: r.try_get("sort_order")?,
        is_active: r.try_get("is_active")?,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}

#[async_trait]
impl LootBoxTaskRepository for PostgresLootBoxTaskRepository {
    async fn create_lootbox_task(&self, t: &LootBoxTask) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO lootbox_tasks (
                id, title, description, icon, channel_url, channel_id, chat_id,
                sort_order, is_active, created_at, updated_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
            "#,
        )
            .bind(t.id)
            .bind(&t.title)
            .bind(&t.description)
            .bind(&t.icon)
            .bind(&t.channel_url)
            .bind(&t.channel_id)
            .bind(t.chat_id)
            .bind(t.sort_order)
            .bind(t.is_active)
            .bind(t.created_at)
            .bind(t.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_lootbox_task(&self, task_id: Uuid) -> Result<Option<LootBoxTask>, Error> {
        let sql = format!("SELECT {LOOTBOX_TASK_COLUMNS} FROM lootbox_tasks WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(lootbox_task_from_row).transpose()
    }

    async fn update_lootbox_task(&self, t: &LootBoxTask) -> Result<(), Error> {
        let result = sqlx::query(
            r#"
            UPDATE lootbox_tasks
            SET
              title = $1,
              description = $2,
              icon = $3,
              channel_url = $4,
              channel_id = $5,
              chat_id = $6,
              sort_order = $7,
              is_active = $8,
              updated_at = $9
            WHERE id = $10
            "#,
        )
            .bind(&t.title)
            .bind(&t.description)
            .bind(&t.icon)
            .bind(&t.channel_url)
            .bind(&t.channel_id)
            .bind(t.chat_id)
            .bind(t.sort_order)
            .bind(t.is_active)
            .bind(t.updated_at)
            .bind(t.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("lootbox task {}", t.id)));
        }
        Ok(())
    }

    async fn delete_lootbox_task(&self, task_id: Uuid) -> Result<(), Error> {
        sqlx::query("DELETE FROM lootbox_tasks WHERE id = $1")
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_lootbox_tasks(&self, active_only: bool) -> Result<Vec<LootBoxTask>, Error> {
        let sql = format!(
            "SELECT {LOOTBOX_TASK_COLUMNS} FROM lootbox_tasks \
             WHERE (NOT $1 OR is_active) \
             ORDER BY sort_order ASC, created_at ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(lootbox_task_from_row).collect()
    }
}
