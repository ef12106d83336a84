//! The API surface consumed by the dashboard.
//!
//! One trait, two implementations: [`crate::client::HttpApi`] talks to the
//! backend over HTTP, [`crate::demo::DemoApi`] fabricates responses for
//! offline demos. The implementation is selected once at startup
//! ([`crate::connect`]) instead of branching on a demo flag inside every
//! method.

use async_trait::async_trait;

use crate::error::ClientError;
use crate::types::{
    ActivityItem, Approval, CalendarEvent, DashboardStats, Email, EmailQuery, LoginResponse,
    Notification, Task, TaskDraft, TaskQuery, UserProfile,
};

/// Everything the dashboard needs from the backend.
///
/// All methods are thin calls: endpoint construction and parameter shaping,
/// no caching, no retries. Errors follow the [`ClientError`] taxonomy.
#[async_trait]
pub trait SecretaryApi: Send + Sync {
    // --- Auth ---

    /// Exchange credentials for a bearer token and profile. On success the
    /// session store holds both.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError>;

    /// Clear the session, then tell the backend. The local clear happens
    /// first so a dead backend can never keep the client logged in.
    async fn logout(&self) -> Result<(), ClientError>;

    /// Profile of the authenticated user. Does not re-send credentials.
    async fn current_user(&self) -> Result<UserProfile, ClientError>;

    /// URL to start the Google OAuth consent flow.
    async fn google_auth_url(&self) -> Result<String, ClientError>;

    /// Exchange an OAuth authorization code for a session.
    async fn oauth_callback(&self, code: &str, state: &str)
        -> Result<LoginResponse, ClientError>;

    // --- Approvals ---

    /// Approvals still awaiting a human decision.
    async fn pending_approvals(&self) -> Result<Vec<Approval>, ClientError>;

    /// Accept an approval, committing the (possibly edited) task draft.
    async fn approve_task(&self, id: i64, edits: &TaskDraft) -> Result<(), ClientError>;

    /// Reject an approval with an optional free-text reason.
    async fn reject_task(&self, id: i64, reason: Option<&str>) -> Result<(), ClientError>;

    /// Save draft edits without approving yet.
    async fn update_approval(&self, id: i64, edits: &TaskDraft) -> Result<(), ClientError>;

    // --- Emails ---

    async fn emails(&self, query: &EmailQuery) -> Result<Vec<Email>, ClientError>;

    /// Ask the backend to pull fresh mail from the provider.
    async fn sync_emails(&self) -> Result<(), ClientError>;

    /// Mark an email as worth processing into tasks.
    async fn approve_email(&self, id: i64) -> Result<(), ClientError>;

    /// Dismiss an email from the processing queue.
    async fn reject_email(&self, id: i64) -> Result<(), ClientError>;

    // --- Tasks & calendar ---

    async fn tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, ClientError>;

    async fn complete_task(&self, id: i64) -> Result<(), ClientError>;

    async fn calendar_events(
        &self,
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<CalendarEvent>, ClientError>;

    /// Ask the backend to refresh its calendar mirror.
    async fn sync_calendar(&self) -> Result<(), ClientError>;

    // --- Dashboard ---

    async fn dashboard_stats(&self) -> Result<DashboardStats, ClientError>;

    async fn recent_activity(&self, limit: u32) -> Result<Vec<ActivityItem>, ClientError>;

    async fn notifications(&self) -> Result<Vec<Notification>, ClientError>;
}
