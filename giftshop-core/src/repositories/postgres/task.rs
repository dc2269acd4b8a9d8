// File: giftshop-core/src/repositories/postgres/task.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use giftshop_common::models::{Task, TaskCompletion, TaskDuration, TaskMetadata, TaskType, User};
use giftshop_common::traits::repository_traits::TaskRepository;

use super::parse_column;
use super::user::user_from_row;
use crate::Error;

pub struct PostgresTaskRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresTaskRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

const TASK_COLUMNS: &str = r#"
    id, task_type, duration, title, description, reward, icon, metadata,
    max_completions, starts_at, is_active, is_visible, created_at, updated_at
"#;

fn task_from_row(r: &PgRow) -> Result<Task, Error> {
    let task_type: String = r.try_get("task_type")?;
    let duration: String = r.try_get("duration")?;
    let metadata: serde_json::Value = r.try_get("metadata")?;
    Ok(Task {
        id: r.try_get("id")?,
        task_type: parse_column::<TaskType>("task_type", &task_type)?,
        duration: parse_column::<TaskDuration>("duration", &duration)?,
        title: r.try_get("title")?,
        description: r.try_get("description")?,
        reward: r.try_get("reward")?,
        icon: r.try_get("icon")?,
        metadata: serde_json::from_value::<TaskMetadata>(metadata)?,
        max_completions: r.try_get("max_completions")?,
        starts_at: r.try_get("starts_at")?,
        is_active: r.try_get("is_active")?,
        is_visible: r.try_get("is_visible")?,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn create_task(&self, task: &Task) -> Result<(), Error> {
        let metadata = serde_json::to_value(&task.metadata)?;
        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, task_type, duration, title, description, reward, icon, metadata,
                max_completions, starts_at, is_active, is_visible, created_at, updated_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14)
            "#,
        )
            .bind(task.id)
            .bind(task.task_type.as_str())
            .bind(task.duration.as_str())
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.reward)
            .bind(&task.icon)
            .bind(metadata)
            .bind(task.max_completions)
            .bind(task.starts_at)
            .bind(task.is_active)
            .bind(task.is_visible)
            .bind(task.created_at)
            .bind(task.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_task(&self, task_id: Uuid) -> Result<Option<Task>, Error> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(task_from_row).transpose()
    }

    async fn update_task(&self, task: &Task) -> Result<(), Error> {
        let metadata = serde_json::to_value(&task.metadata)?;
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET
              task_type = $1,
              duration = $2,
              title = $3,
              description = $4,
              reward = $5,
              icon = $6,
              metadata = $7,
              max_completions = $8,
              starts_at = $9,
              is_active = $10,
              is_visible = $11,
              updated_at = $12
            WHERE id = $13
            "#,
        )
            .bind(task.task_type.as_str())
            .bind(task.duration.as_str())
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.reward)
            .bind(&task.icon)
            .bind(metadata)
            .bind(task.max_completions)
            .bind(task.starts_at)
            .bind(task.is_active)
            .bind(task.is_visible)
            .bind(task.updated_at)
            .bind(task.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("task {}", task.id)));
        }
        Ok(())
    }

    async fn delete_task(&self, task_id: Uuid) -> Result<(), Error> {
        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_tasks(&self, include_hidden: bool) -> Result<Vec<Task>, Error> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE ($1 OR is_visible) \
             ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(include_hidden)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(task_from_row).collect()
    }

    async fn record_completion(
        &self,
        completion: &TaskCompletion,
        window_start: Option<DateTime<Utc>>,
        max_completions: Option<i32>,
    ) -> Result<User, Error> {
        let mut tx = self.pool.begin().await?;

        // Serializes completions of the same task.
        let locked = sqlx::query("SELECT id FROM tasks WHERE id = $1 FOR UPDATE")
            .bind(completion.task_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(Error::NotFound(format!("task {}", completion.task_id)));
        }

        let mine: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) AS n FROM task_completions
            WHERE task_id = $1 AND user_id = $2
              AND ($3::TIMESTAMPTZ IS NULL OR completed_at >= $3)
            "#,
        )
            .bind(completion.task_id)
            .bind(completion.user_id)
            .bind(window_start)
            .fetch_one(&mut *tx)
            .await?
            .try_get("n")?;
        if mine > 0 {
            return Err(Error::Conflict(format!(
                "task {} already completed by user {}",
                completion.task_id, completion.user_id
            )));
        }

        if let Some(max) = max_completions {
            let total: i64 = sqlx::query("SELECT COUNT(*) AS n FROM task_completions WHERE task_id = $1")
                .bind(completion.task_id)
                .fetch_one(&mut *tx)
                .await?
                .try_get("n")?;
            if total >= i64::from(max) {
                return Err(Error::Conflict(format!(
                    "task {} reached its completion limit of {}",
                    completion.task_id, max
                )));
            }
        }

        sqlx::query(
            r#"
            INSERT INTO task_completions (id, task_id, user_id, reward, completed_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
            .bind(completion.id)
            .bind(completion.task_id)
            .bind(completion.user_id)
            .bind(completion.reward)
            .bind(completion.completed_at)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query(
            r#"
            UPDATE users
               SET balance = balance + $1, updated_at = $2
             WHERE user_id = $3
            RETURNING user_id, telegram_id, username, first_name, balance, is_admin,
                      created_at, updated_at
            "#,
        )
            .bind(completion.reward)
            .bind(completion.completed_at)
            .bind(completion.user_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Err(Error::NotFound(format!("user {}", completion.user_id)));
        };
        let user = user_from_row(&row)?;

        tx.commit().await?;
        Ok(user)
    }
}
