// File: giftshop-core/src/repositories/postgres/user.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use giftshop_common::models::{TelegramUser, User};
use giftshop_common::traits::repository_traits::UserRepository;

use crate::Error;

pub struct PostgresUserRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

pub(crate) fn user_from_row(r: &PgRow) -> Result<User, Error> {
    Ok(User {
        user_id: r.try_get("user_id")?,
        telegram_id: r.try_get("telegram_id")?,
        username: r.try_get("username")?,
        first_name: r.try_get("first_name")?,
        balance: r.try_get("balance")?,
        is_admin: r.try_get("is_admin")?,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, Error> {
        let row = sqlx::query(
            r#"
            SELECT user_id, telegram_id, username, first_name, balance, is_admin,
                   created_at, updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>, Error> {
        let row = sqlx::query(
            r#"
            SELECT user_id, telegram_id, username, first_name, balance, is_admin,
                   created_at, updated_at
            FROM users
            WHERE telegram_id = $1
            "#,
        )
            .bind(telegram_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn upsert_telegram_user(&self, tg: &TelegramUser) -> Result<User, Error> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO users (
                user_id, telegram_id, username, first_name, balance, is_admin,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, 0, FALSE, $5, $5)
            ON CONFLICT (telegram_id) DO UPDATE
               SET username = EXCLUDED.username,
                   first_name = EXCLUDED.first_name,
                   updated_at = EXCLUDED.updated_at
            RETURNING user_id, telegram_id, username, first_name, balance, is_admin,
                      created_at, updated_at
            "#,
        )
            .bind(Uuid::new_v4())
            .bind(tg.id)
            .bind(&tg.username)
            .bind(&tg.first_name)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        user_from_row(&row)
    }
}
