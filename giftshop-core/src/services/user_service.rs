use std::sync::Arc;

use tracing::debug;

use giftshop_common::models::{TelegramUser, User};
use giftshop_common::traits::repository_traits::UserRepository;

use crate::Error;

pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    /// Resolves the Telegram user behind a request to our own user row,
    /// creating it on first contact.
    pub async fn get_or_create_user(&self, tg: &TelegramUser) -> Result<User, Error> {
        let user = self.user_repo.upsert_telegram_user(tg).await?;
        debug!("Resolved telegram_id={} to user_id={}", tg.id, user.user_id);
        Ok(user)
    }

    pub async fn find_user_by_telegram_id(&self, telegram_id: i64) -> Result<User, Error> {
        self.user_repo
            .find_user_by_telegram_id(telegram_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("user with telegram_id={}", telegram_id)))
    }
}
