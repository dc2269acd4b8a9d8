// File: giftshop-common/src/models/task.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    TelegramSubscription,
    VisitLink,
    InviteFriends,
}

impl TaskType {
    pub const ALL: [TaskType; 3] =
        [TaskType::TelegramSubscription, TaskType::VisitLink, TaskType::InviteFriends];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::TelegramSubscription => "TELEGRAM_SUBSCRIPTION",
            TaskType::VisitLink => "VISIT_LINK",
            TaskType::InviteFriends => "INVITE_FRIENDS",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TELEGRAM_SUBSCRIPTION" => Ok(TaskType::TelegramSubscription),
            "VISIT_LINK" => Ok(TaskType::VisitLink),
            "INVITE_FRIENDS" => Ok(TaskType::InviteFriends),
            _ => Err(format!("Unknown task type: {}", s)),
        }
    }
}

/// How often a single user may complete a task.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskDuration {
    OneTime,
    Daily,
    Weekly,
}

impl TaskDuration {
    pub const ALL: [TaskDuration; 3] = [TaskDuration::OneTime, TaskDuration::Daily, TaskDuration::Weekly];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskDuration::OneTime => "ONE_TIME",
            TaskDuration::Daily => "DAILY",
            TaskDuration::Weekly => "WEEKLY",
        }
    }

    /// Start of the window a repeat completion is counted in. `None` for
    /// one-time tasks, which count every completion ever made.
    pub fn window_start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let midnight = Utc
            .with_ymd_and_hms(now.year(), now.month(), now.day(), 0, 0, 0)
            .single()?;
        match self {
            TaskDuration::OneTime => None,
            TaskDuration::Daily => Some(midnight),
            TaskDuration::Weekly => {
                let days_since_monday = i64::from(now.weekday().num_days_from_monday());
                Some(midnight - Duration::days(days_since_monday))
            }
        }
    }
}

impl fmt::Display for TaskDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskDuration {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONE_TIME" => Ok(TaskDuration::OneTime),
            "DAILY" => Ok(TaskDuration::Daily),
            "WEEKLY" => Ok(TaskDuration::Weekly),
            _ => Err(format!("Unknown task duration: {}", s)),
        }
    }
}

/// Type-specific payload, stored as JSONB.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskMetadata {
    TelegramSubscription { channel_url: String, chat_id: i64 },
    VisitLink { url: String },
    InviteFriends { friends_required: i32 },
}

impl TaskMetadata {
    pub fn task_type(&self) -> TaskType {
        match self {
            TaskMetadata::TelegramSubscription { .. } => TaskType::TelegramSubscription,
            TaskMetadata::VisitLink { .. } => TaskType::VisitLink,
            TaskMetadata::InviteFriends { .. } => TaskType::InviteFriends,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub task_type: TaskType,
    pub duration: TaskDuration,
    pub title: String,
    pub description: String,
    pub reward: i64,
    pub icon: Option<String>,
    pub metadata: TaskMetadata,
    pub max_completions: Option<i32>,
    /// `None` means the task was live from creation.
    pub starts_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.starts_at.map_or(true, |ts| ts <= now)
    }
}

/// Validated create/update payload.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TaskInput {
    pub duration: TaskDuration,
    pub title: String,
    pub description: String,
    pub reward: i64,
    pub icon: Option<String>,
    pub metadata: TaskMetadata,
    pub max_completions: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_visible: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TaskCompletion {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub reward: i64,
    pub completed_at: DateTime<Utc>,
}
