//! Wire types shared across the API surface.
//!
//! Field names follow the backend's camelCase JSON. Optional fields carry
//! `#[serde(default)]` so older backend builds that omit them still parse.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated user profile. Replaced wholesale on every fetch, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub full_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Task priority as the backend spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// An AI-proposed task, editable by the user before approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    /// Estimated duration in minutes.
    #[serde(default)]
    pub estimated_duration: Option<u32>,
}

/// The email an approval was extracted from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRef {
    pub from: String,
    pub subject: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub body: Option<String>,
    pub date: DateTime<Utc>,
}

/// An AI-proposed task pending human accept/reject.
///
/// Lifecycle is pending -> approved | rejected, both terminal; once acted on
/// the item leaves the pending set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    pub id: i64,
    /// Extraction confidence in [0, 1].
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub reasoning: String,
    pub email: EmailRef,
    pub task: TaskDraft,
}

/// A committed task on the user's list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// An inbox email as listed on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    pub id: i64,
    pub from: String,
    pub subject: String,
    #[serde(default)]
    pub snippet: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub unread: bool,
    #[serde(default)]
    pub processed: bool,
}

/// A calendar event in the dashboard's agenda view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub attendees: Vec<String>,
}

/// Aggregate counters for the dashboard header cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub pending_tasks: u32,
    #[serde(default)]
    pub unread_emails: u32,
    #[serde(default)]
    pub events_today: u32,
    #[serde(default)]
    pub pending_approvals: u32,
}

/// One row in the recent-activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    pub id: i64,
    #[serde(default)]
    pub kind: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Successful login or OAuth-callback payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Filters for listing emails.
#[derive(Debug, Clone, Default)]
pub struct EmailQuery {
    pub limit: Option<u32>,
    pub unread: Option<bool>,
}

impl EmailQuery {
    pub(crate) fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(unread) = self.unread {
            params.push(("unread".to_string(), unread.to_string()));
        }
        params
    }
}

/// Filters for listing tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    pub limit: Option<u32>,
    pub priority: Option<Priority>,
    pub status: Option<String>,
}

impl TaskQuery {
    pub(crate) fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(priority) = self.priority {
            params.push(("priority".to_string(), priority.as_str().to_string()));
        }
        if let Some(status) = &self.status {
            params.push(("status".to_string(), status.clone()));
        }
        params
    }
}
