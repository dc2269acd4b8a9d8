use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use giftshop_common::models::{
    LootBoxTask, LootBoxTaskInput, Task, TaskDuration, TaskInput, TaskMetadata, TaskType,
};
use giftshop_common::{Error, FieldErrors};

use super::{
    fits_i32, optional_int, optional_text, required_enum, required_int, required_text, DisplayEnum,
    FormNumber,
};
use crate::telegram::channel_id_from_url;

/// Task create/edit form. Type-specific fields are flat; only the ones the
/// chosen `task_type` needs are read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskForm {
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub reward: Option<FormNumber>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub channel_url: Option<String>,
    #[serde(default)]
    pub chat_id: Option<FormNumber>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub friends_required: Option<FormNumber>,
    #[serde(default)]
    pub max_completions: Option<FormNumber>,
    /// RFC 3339. Blank means "start now".
    #[serde(default)]
    pub starts_at: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_visible: Option<bool>,
}

impl TaskForm {
    /// Converts to storage dialect. `starts_at` is passed through as submitted;
    /// scheduling policy is applied by the task service.
    pub fn normalize(&self) -> Result<TaskInput, Error> {
        let mut errs = FieldErrors::new();

        let task_type = required_enum::<TaskType>(&mut errs, "task_type", &self.task_type);
        let duration = match self.duration.as_deref().map(str::trim) {
            None | Some("") => Some(TaskDuration::OneTime),
            Some(_) => required_enum::<TaskDuration>(&mut errs, "duration", &self.duration),
        };
        let title = required_text(&mut errs, "title", &self.title);
        let reward = required_int(&mut errs, "reward", &self.reward, 0);
        let max_completions = optional_int(&mut errs, "max_completions", &self.max_completions, 1)
            .and_then(|m| match m {
                Some(n) => fits_i32(&mut errs, "max_completions", n).map(Some),
                None => Some(None),
            });
        let starts_at = parse_starts_at(&mut errs, self.starts_at.as_deref());
        let metadata = task_type.and_then(|t| self.metadata_for(t, &mut errs));

        match (task_type, duration, title, reward, max_completions, starts_at, metadata) {
            (Some(_), Some(duration), Some(title), Some(reward), Some(max_completions), Some(starts_at), Some(metadata))
                if errs.is_empty() =>
            {
                Ok(TaskInput {
                    duration,
                    title,
                    description: optional_text(&self.description).unwrap_or_default(),
                    reward,
                    icon: optional_text(&self.icon),
                    metadata,
                    max_completions,
                    starts_at,
                    is_active: self.is_active.unwrap_or(true),
                    is_visible: self.is_visible.unwrap_or(true),
                })
            }
            _ => Err(Error::Validation(errs)),
        }
    }

    fn metadata_for(&self, task_type: TaskType, errs: &mut FieldErrors) -> Option<TaskMetadata> {
        match task_type {
            TaskType::TelegramSubscription => {
                let channel_url = required_text(errs, "channel_url", &self.channel_url);
                if let Some(url) = channel_url.as_deref() {
                    if channel_id_from_url(url).is_none() {
                        errs.add("channel_url", "must end with the channel name");
                    }
                }
                let chat_id = required_chat_id(errs, &self.chat_id);
                Some(TaskMetadata::TelegramSubscription { channel_url: channel_url?, chat_id: chat_id? })
            }
            TaskType::VisitLink => {
                let url = required_text(errs, "url", &self.url)?;
                if url::Url::parse(&url).is_err() {
                    errs.add("url", "must be an absolute URL");
                    return None;
                }
                Some(TaskMetadata::VisitLink { url })
            }
            TaskType::InviteFriends => {
                let n = required_int(errs, "friends_required", &self.friends_required, 1)?;
                let friends_required = fits_i32(errs, "friends_required", n)?;
                Some(TaskMetadata::InviteFriends { friends_required })
            }
        }
    }
}

impl From<&Task> for TaskForm {
    fn from(t: &Task) -> Self {
        let mut form = TaskForm {
            task_type: Some(t.task_type.display_name()),
            duration: Some(t.duration.display_name()),
            title: Some(t.title.clone()),
            description: Some(t.description.clone()),
            reward: Some(FormNumber::from(t.reward)),
            icon: t.icon.clone(),
            max_completions: t.max_completions.map(FormNumber::from),
            starts_at: t.starts_at.map(|ts| ts.to_rfc3339()),
            is_active: Some(t.is_active),
            is_visible: Some(t.is_visible),
            ..TaskForm::default()
        };
        match &t.metadata {
            TaskMetadata::TelegramSubscription { channel_url, chat_id } => {
                form.channel_url = Some(channel_url.clone());
                form.chat_id = Some(FormNumber::from(*chat_id));
            }
            TaskMetadata::VisitLink { url } => form.url = Some(url.clone()),
            TaskMetadata::InviteFriends { friends_required } => {
                form.friends_required = Some(FormNumber::from(*friends_required));
            }
        }
        form
    }
}

/// Lootbox channel task form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LootBoxTaskForm {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub channel_url: Option<String>,
    #[serde(default)]
    pub chat_id: Option<FormNumber>,
    #[serde(default)]
    pub sort_order: Option<FormNumber>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl LootBoxTaskForm {
    pub fn normalize(&self) -> Result<LootBoxTaskInput, Error> {
        let mut errs = FieldErrors::new();

        let title = required_text(&mut errs, "title", &self.title);
        let channel_url = required_text(&mut errs, "channel_url", &self.channel_url);
        let channel_id = channel_url.as_deref().and_then(|url| {
            let id = channel_id_from_url(url);
            if id.is_none() {
                errs.add("channel_url", "must end with the channel name");
            }
            id
        });
        let chat_id = required_chat_id(&mut errs, &self.chat_id);
        let sort_order = match optional_int(&mut errs, "sort_order", &self.sort_order, i64::from(i32::MIN)) {
            Some(Some(n)) => fits_i32(&mut errs, "sort_order", n),
            Some(None) => Some(0),
            None => None,
        };

        match (title, channel_url, channel_id, chat_id, sort_order) {
            (Some(title), Some(channel_url), Some(channel_id), Some(chat_id), Some(sort_order))
                if errs.is_empty() =>
            {
                Ok(LootBoxTaskInput {
                    title,
                    description: optional_text(&self.description).unwrap_or_default(),
                    icon: optional_text(&self.icon),
                    channel_url,
                    channel_id,
                    chat_id,
                    sort_order,
                    is_active: self.is_active.unwrap_or(true),
                })
            }
            _ => Err(Error::Validation(errs)),
        }
    }
}

impl From<&LootBoxTask> for LootBoxTaskForm {
    fn from(t: &LootBoxTask) -> Self {
        Self {
            title: Some(t.title.clone()),
            description: Some(t.description.clone()),
            icon: t.icon.clone(),
            channel_url: Some(t.channel_url.clone()),
            chat_id: Some(FormNumber::from(t.chat_id)),
            sort_order: Some(FormNumber::from(t.sort_order)),
            is_active: Some(t.is_active),
        }
    }
}

/// Telegram chat ids are negative for channels, so no lower bound applies.
fn required_chat_id(errs: &mut FieldErrors, value: &Option<FormNumber>) -> Option<i64> {
    required_int(errs, "chat_id", value, i64::MIN)
}

/// `Some(None)` for blank input, `None` when the value did not parse.
fn parse_starts_at(errs: &mut FieldErrors, raw: Option<&str>) -> Option<Option<DateTime<Utc>>> {
    match raw.map(str::trim) {
        None | Some("") => Some(None),
        Some(s) => match DateTime::parse_from_rfc3339(s) {
            Ok(ts) => Some(Some(ts.with_timezone(&Utc))),
            Err(_) => {
                errs.add("starts_at", "must be an RFC 3339 timestamp");
                None
            }
        },
    }
}
