//! Client SDK for the Executive Secretary dashboard backend.
//!
//! The SDK covers the dashboard's non-presentation layer: session/token
//! persistence, the REST API surface, the approval workflow, and a
//! background refresh loop. Rendering, routing and widgets stay with the
//! embedding UI.
//!
//! Construction happens once at startup:
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use execsec::{connect, ClientConfig, SecretaryApi, SessionStore};
//!
//! # async fn start() -> Result<(), execsec::ClientError> {
//! let config = ClientConfig::from_env();
//! let session = Arc::new(SessionStore::file_backed());
//! let api = connect(&config, session)?;
//!
//! let login = api.login("user@example.com", "secret").await?;
//! println!("hello {}", login.user.full_name);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod approvals;
pub mod client;
pub mod config;
pub mod demo;
pub mod error;
pub mod refresh;
pub mod session;
pub mod types;
mod util;

use std::sync::Arc;

pub use api::SecretaryApi;
pub use approvals::{ApprovalWorkflow, ApproveAllOutcome};
pub use client::HttpApi;
pub use config::ClientConfig;
pub use demo::DemoApi;
pub use error::ClientError;
pub use refresh::{fetch_snapshot, run_refresh_loop, DashboardSnapshot};
pub use session::{FileStorage, MemoryStorage, Session, SessionStore, TokenStorage};
pub use types::{
    ActivityItem, Approval, CalendarEvent, DashboardStats, Email, EmailQuery, EmailRef,
    LoginResponse, Notification, Priority, Task, TaskDraft, TaskQuery, UserProfile,
};

/// Build the API surface the configuration asks for: the HTTP client
/// normally, the canned demo client when `config.demo` is set. The choice is
/// made exactly once; nothing downstream branches on the flag again.
pub fn connect(
    config: &ClientConfig,
    session: Arc<SessionStore>,
) -> Result<Arc<dyn SecretaryApi>, ClientError> {
    if config.demo {
        log::info!("demo mode: using canned API client");
        return Ok(Arc::new(DemoApi::new(session)));
    }
    Ok(Arc::new(HttpApi::new(config, session)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_selects_demo_implementation() {
        let config = ClientConfig {
            demo: true,
            ..ClientConfig::default()
        };
        let api = connect(&config, Arc::new(SessionStore::in_memory())).unwrap();

        // Demo surface answers without a backend.
        assert_eq!(api.pending_approvals().await.unwrap().len(), 2);
    }

    #[test]
    fn test_connect_selects_http_implementation() {
        let config = ClientConfig::default();
        assert!(connect(&config, Arc::new(SessionStore::in_memory())).is_ok());
    }
}
