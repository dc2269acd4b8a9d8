use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use giftshop_common::models::{Task, TaskCompletion, TaskInput, TelegramUser, User};
use giftshop_common::traits::repository_traits::TaskRepository;

use crate::dialect::TaskForm;
use crate::services::user_service::UserService;
use crate::{Error, ShopConfig};

/// Start times inside `window` from `now` (or in the past) collapse to
/// "immediate", so a task is never briefly scheduled and due at once.
pub fn effective_start(
    requested: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    window: Duration,
) -> Option<DateTime<Utc>> {
    let cutoff = now.checked_add_signed(window)?;
    requested.filter(|ts| *ts > cutoff)
}

pub struct TaskService {
    task_repo: Arc<dyn TaskRepository>,
    user_service: Arc<UserService>,
    config: ShopConfig,
}

impl TaskService {
    pub fn new(task_repo: Arc<dyn TaskRepository>, user_service: Arc<UserService>, config: ShopConfig) -> Self {
        Self { task_repo, user_service, config }
    }

    pub async fn create_task(&self, form: &TaskForm) -> Result<Task, Error> {
        self.create_task_at(form, Utc::now()).await
    }

    pub async fn create_task_at(&self, form: &TaskForm, now: DateTime<Utc>) -> Result<Task, Error> {
        let input = form.normalize()?;
        let task = self.build(Uuid::new_v4(), input, now, now);
        self.task_repo.create_task(&task).await?;
        info!(
            "Created task '{}' ({}) type={} starts_at={:?}",
            task.title, task.id, task.task_type, task.starts_at
        );
        Ok(task)
    }

    pub async fn update_task(&self, task_id: Uuid, form: &TaskForm) -> Result<Task, Error> {
        let input = form.normalize()?;
        let existing = self.get_task(task_id).await?;
        let now = Utc::now();
        let task = self.build(task_id, input, existing.created_at, now);
        self.task_repo.update_task(&task).await?;
        info!("Updated task '{}' ({})", task.title, task.id);
        Ok(task)
    }

    pub async fn get_task(&self, task_id: Uuid) -> Result<Task, Error> {
        self.task_repo
            .get_task(task_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("task {}", task_id)))
    }

    pub async fn list_tasks(&self, include_hidden: bool) -> Result<Vec<Task>, Error> {
        self.task_repo.list_tasks(include_hidden).await
    }

    /// Tasks a user can see right now: visible, active and started.
    pub async fn list_available_tasks(&self) -> Result<Vec<Task>, Error> {
        let now = Utc::now();
        let tasks = self.task_repo.list_tasks(false).await?;
        Ok(tasks
            .into_iter()
            .filter(|t| t.is_active && t.has_started(now))
            .collect())
    }

    pub async fn delete_task(&self, task_id: Uuid) -> Result<(), Error> {
        self.get_task(task_id).await?;
        self.task_repo.delete_task(task_id).await?;
        info!("Deleted task {}", task_id);
        Ok(())
    }

    pub async fn set_task_flags(
        &self,
        task_id: Uuid,
        is_active: Option<bool>,
        is_visible: Option<bool>,
    ) -> Result<Task, Error> {
        let mut task = self.get_task(task_id).await?;
        if let Some(active) = is_active {
            task.is_active = active;
        }
        if let Some(visible) = is_visible {
            task.is_visible = visible;
        }
        task.updated_at = Utc::now();
        self.task_repo.update_task(&task).await?;
        Ok(task)
    }

    /// Records a completion and credits the reward. Returns the buyer's
    /// updated balance record.
    pub async fn complete_task(&self, who: &TelegramUser, task_id: Uuid) -> Result<User, Error> {
        let now = Utc::now();
        let task = self.get_task(task_id).await?;

        if !task.is_active || !task.is_visible {
            return Err(Error::NotFound(format!("task {}", task_id)));
        }
        if !task.has_started(now) {
            return Err(Error::Conflict(format!("task {} has not started yet", task_id)));
        }

        let user = self.user_service.get_or_create_user(who).await?;
        let completion = TaskCompletion {
            id: Uuid::new_v4(),
            task_id,
            user_id: user.user_id,
            reward: task.reward,
            completed_at: now,
        };
        let updated = self
            .task_repo
            .record_completion(&completion, task.duration.window_start(now), task.max_completions)
            .await?;
        debug!(
            "User {} completed task {} (+{}), balance={}",
            user.user_id, task_id, task.reward, updated.balance
        );
        Ok(updated)
    }

    fn build(&self, id: Uuid, input: TaskInput, created_at: DateTime<Utc>, now: DateTime<Utc>) -> Task {
        Task {
            id,
            task_type: input.metadata.task_type(),
            duration: input.duration,
            title: input.title,
            description: input.description,
            reward: input.reward,
            icon: input.icon,
            metadata: input.metadata,
            max_completions: input.max_completions,
            starts_at: effective_start(input.starts_at, now, self.config.immediate_start_window),
            is_active: input.is_active,
            is_visible: input.is_visible,
            created_at,
            updated_at: now,
        }
    }
}
