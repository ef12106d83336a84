//! Canned implementation for offline demos.
//!
//! Fabricates every response from in-memory fixture state: no network, no
//! failures. Mutating calls update the fixtures so the approval workflow is
//! demoable end-to-end — approving removes the item from the pending set,
//! completing a task marks it done.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::api::SecretaryApi;
use crate::error::ClientError;
use crate::session::SessionStore;
use crate::types::{
    ActivityItem, Approval, CalendarEvent, DashboardStats, Email, EmailQuery, EmailRef,
    LoginResponse, Notification, Priority, Task, TaskDraft, TaskQuery, UserProfile,
};

const DEMO_TOKEN: &str = "demo-token";
const DEMO_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth?demo=1";

struct DemoState {
    approvals: Vec<Approval>,
    tasks: Vec<Task>,
    emails: Vec<Email>,
    events: Vec<CalendarEvent>,
    notifications: Vec<Notification>,
}

pub struct DemoApi {
    session: Arc<SessionStore>,
    state: Mutex<DemoState>,
}

fn demo_user(email: &str) -> UserProfile {
    UserProfile {
        full_name: "Demo User".to_string(),
        email: email.to_string(),
        avatar_url: None,
    }
}

fn fixtures(now: DateTime<Utc>) -> DemoState {
    let approvals = vec![
        Approval {
            id: 1,
            confidence: 0.82,
            created_at: now,
            reasoning: "Email contains a clear action request and deadline.".to_string(),
            email: EmailRef {
                from: "CEO <ceo@company.com>".to_string(),
                subject: "Prepare board deck".to_string(),
                snippet: "Please prepare the board meeting slides by tomorrow.".to_string(),
                body: Some(
                    "Please prepare the board meeting slides by tomorrow morning.".to_string(),
                ),
                date: now,
            },
            task: TaskDraft {
                title: "Prepare board meeting slides".to_string(),
                description: "Create slides for quarterly board review".to_string(),
                priority: Priority::High,
                deadline: Some(now + Duration::days(1)),
                estimated_duration: Some(120),
            },
        },
        Approval {
            id: 2,
            confidence: 0.65,
            created_at: now,
            reasoning: "Meeting request detected with moderate confidence.".to_string(),
            email: EmailRef {
                from: "Client <client@example.com>".to_string(),
                subject: "Schedule follow-up meeting".to_string(),
                snippet: "Can we schedule a follow-up meeting next week?".to_string(),
                body: Some(
                    "Can we schedule a follow-up meeting sometime next week?".to_string(),
                ),
                date: now,
            },
            task: TaskDraft {
                title: "Schedule client follow-up meeting".to_string(),
                description: "Coordinate availability and schedule meeting".to_string(),
                priority: Priority::Medium,
                deadline: None,
                estimated_duration: Some(30),
            },
        },
    ];

    let tasks = vec![
        Task {
            id: 10,
            title: "Review quarterly numbers".to_string(),
            description: Some("Walk through the Q2 figures before the board call".to_string()),
            priority: Priority::High,
            status: "pending".to_string(),
            deadline: Some(now + Duration::days(1)),
            completed_at: None,
        },
        Task {
            id: 11,
            title: "Book travel for offsite".to_string(),
            description: None,
            priority: Priority::Low,
            status: "pending".to_string(),
            deadline: None,
            completed_at: None,
        },
    ];

    let emails = vec![
        Email {
            id: 100,
            from: "CEO <ceo@company.com>".to_string(),
            subject: "Prepare board deck".to_string(),
            snippet: "Please prepare the board meeting slides by tomorrow.".to_string(),
            date: now,
            unread: true,
            processed: false,
        },
        Email {
            id: 101,
            from: "Client <client@example.com>".to_string(),
            subject: "Schedule follow-up meeting".to_string(),
            snippet: "Can we schedule a follow-up meeting next week?".to_string(),
            date: now - Duration::hours(3),
            unread: true,
            processed: false,
        },
    ];

    let events = vec![CalendarEvent {
        id: "evt-1".to_string(),
        title: "Board meeting".to_string(),
        start: now + Duration::days(1),
        end: now + Duration::days(1) + Duration::hours(2),
        location: Some("Boardroom".to_string()),
        attendees: vec!["ceo@company.com".to_string(), "demo@executive.ai".to_string()],
    }];

    let notifications = vec![Notification {
        id: 1,
        message: "2 new tasks are waiting for your approval".to_string(),
        read: false,
        created_at: now,
    }];

    DemoState {
        approvals,
        tasks,
        emails,
        events,
        notifications,
    }
}

impl DemoApi {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self {
            session,
            state: Mutex::new(fixtures(Utc::now())),
        }
    }
}

#[async_trait]
impl SecretaryApi for DemoApi {
    async fn login(&self, email: &str, _password: &str) -> Result<LoginResponse, ClientError> {
        let user = demo_user(email);
        self.session
            .set_session(DEMO_TOKEN.to_string(), user.clone())?;
        Ok(LoginResponse {
            token: DEMO_TOKEN.to_string(),
            user,
        })
    }

    async fn logout(&self) -> Result<(), ClientError> {
        self.session.clear()
    }

    async fn current_user(&self) -> Result<UserProfile, ClientError> {
        Ok(self
            .session
            .user()
            .unwrap_or_else(|| demo_user("demo@executive.ai")))
    }

    async fn google_auth_url(&self) -> Result<String, ClientError> {
        Ok(DEMO_AUTH_URL.to_string())
    }

    async fn oauth_callback(
        &self,
        _code: &str,
        _state: &str,
    ) -> Result<LoginResponse, ClientError> {
        self.login("demo@executive.ai", "").await
    }

    async fn pending_approvals(&self) -> Result<Vec<Approval>, ClientError> {
        Ok(self.state.lock().approvals.clone())
    }

    async fn approve_task(&self, id: i64, edits: &TaskDraft) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        state.approvals.retain(|a| a.id != id);
        let next_id = state.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        state.tasks.push(Task {
            id: next_id,
            title: edits.title.clone(),
            description: Some(edits.description.clone()),
            priority: edits.priority,
            status: "pending".to_string(),
            deadline: edits.deadline,
            completed_at: None,
        });
        Ok(())
    }

    async fn reject_task(&self, id: i64, _reason: Option<&str>) -> Result<(), ClientError> {
        self.state.lock().approvals.retain(|a| a.id != id);
        Ok(())
    }

    async fn update_approval(&self, id: i64, edits: &TaskDraft) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        if let Some(approval) = state.approvals.iter_mut().find(|a| a.id == id) {
            approval.task = edits.clone();
        }
        Ok(())
    }

    async fn emails(&self, query: &EmailQuery) -> Result<Vec<Email>, ClientError> {
        let state = self.state.lock();
        let mut emails: Vec<Email> = state
            .emails
            .iter()
            .filter(|e| query.unread.map_or(true, |unread| e.unread == unread))
            .cloned()
            .collect();
        if let Some(limit) = query.limit {
            emails.truncate(limit as usize);
        }
        Ok(emails)
    }

    async fn sync_emails(&self) -> Result<(), ClientError> {
        Ok(())
    }

    async fn approve_email(&self, id: i64) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        if let Some(email) = state.emails.iter_mut().find(|e| e.id == id) {
            email.processed = true;
            email.unread = false;
        }
        Ok(())
    }

    async fn reject_email(&self, id: i64) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        if let Some(email) = state.emails.iter_mut().find(|e| e.id == id) {
            email.processed = true;
            email.unread = false;
        }
        Ok(())
    }

    async fn tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, ClientError> {
        let state = self.state.lock();
        let mut tasks: Vec<Task> = state
            .tasks
            .iter()
            .filter(|t| query.priority.map_or(true, |p| t.priority == p))
            .filter(|t| query.status.as_ref().map_or(true, |s| &t.status == s))
            .cloned()
            .collect();
        if let Some(limit) = query.limit {
            tasks.truncate(limit as usize);
        }
        Ok(tasks)
    }

    async fn complete_task(&self, id: i64) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        if let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) {
            task.status = "completed".to_string();
            task.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn calendar_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, ClientError> {
        Ok(self
            .state
            .lock()
            .events
            .iter()
            .filter(|e| e.start < end && e.end > start)
            .cloned()
            .collect())
    }

    async fn sync_calendar(&self) -> Result<(), ClientError> {
        Ok(())
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, ClientError> {
        let state = self.state.lock();
        Ok(DashboardStats {
            pending_tasks: state
                .tasks
                .iter()
                .filter(|t| t.status != "completed")
                .count() as u32,
            unread_emails: state.emails.iter().filter(|e| e.unread).count() as u32,
            events_today: state.events.len() as u32,
            pending_approvals: state.approvals.len() as u32,
        })
    }

    async fn recent_activity(&self, limit: u32) -> Result<Vec<ActivityItem>, ClientError> {
        let now = Utc::now();
        let mut items = vec![
            ActivityItem {
                id: 1,
                kind: "email".to_string(),
                description: "2 emails pulled from the inbox".to_string(),
                timestamp: now - Duration::minutes(10),
            },
            ActivityItem {
                id: 2,
                kind: "approval".to_string(),
                description: "AI proposed 2 tasks for review".to_string(),
                timestamp: now - Duration::minutes(8),
            },
        ];
        items.truncate(limit as usize);
        Ok(items)
    }

    async fn notifications(&self) -> Result<Vec<Notification>, ClientError> {
        Ok(self.state.lock().notifications.clone())
    }
}
