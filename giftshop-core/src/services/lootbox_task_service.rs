use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use giftshop_common::models::LootBoxTask;
use giftshop_common::traits::repository_traits::LootBoxTaskRepository;

use crate::dialect::LootBoxTaskForm;
use crate::Error;

pub struct LootBoxTaskService {
    repo: Arc<dyn LootBoxTaskRepository>,
}

impl LootBoxTaskService {
    pub fn new(repo: Arc<dyn LootBoxTaskRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_lootbox_task(&self, form: &LootBoxTaskForm) -> Result<LootBoxTask, Error> {
        let input = form.normalize()?;
        let now = Utc::now();
        let task = LootBoxTask {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            icon: input.icon,
            channel_url: input.channel_url,
            channel_id: input.channel_id,
            chat_id: input.chat_id,
            sort_order: input.sort_order,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        self.repo.create_lootbox_task(&task).await?;
        info!("Created lootbox task '{}' for channel '{}'", task.title, task.channel_id);
        Ok(task)
    }

    pub async fn update_lootbox_task(&self, task_id: Uuid, form: &LootBoxTaskForm) -> Result<LootBoxTask, Error> {
        let input = form.normalize()?;
        let mut task = self.get_lootbox_task(task_id).await?;
        task.title = input.title;
        task.description = input.description;
        task.icon = input.icon;
        task.channel_url = input.channel_url;
        task.channel_id = input.channel_id;
        task.chat_id = input.chat_id;
        task.sort_order = input.sort_order;
        task.is_active = input.is_active;
        task.updated_at = Utc::now();
        self.repo.update_lootbox_task(&task).await?;
        Ok(task)
    }

    pub async fn get_lootbox_task(&self, task_id: Uuid) -> Result<LootBoxTask, Error> {
        self.repo
            .get_lootbox_task(task_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("lootbox task {}", task_id)))
    }

    pub async fn list_lootbox_tasks(&self, active_only: bool) -> Result<Vec<LootBoxTask>, Error> {
        self.repo.list_lootbox_tasks(active_only).await
    }

    pub async fn delete_lootbox_task(&self, task_id: Uuid) -> Result<(), Error> {
        self.get_lootbox_task(task_id).await?;
        self.repo.delete_lootbox_task(task_id).await?;
        info!("Deleted lootbox task {}", task_id);
        Ok(())
    }
}
