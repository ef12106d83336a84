//! Background refresh loop.
//!
//! Re-fetches dashboard stats and the pending approval set on a fixed
//! interval, publishing whole snapshots through a watch channel. Overlap
//! with user-triggered fetches is tolerated: every publish replaces the
//! previous snapshot entirely, so races resolve to whichever fetch finished
//! last.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Notify};

use crate::api::SecretaryApi;
use crate::error::ClientError;
use crate::types::{Approval, DashboardStats};

/// One full picture of the dashboard, replaced wholesale on each refresh.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub stats: DashboardStats,
    pub pending: Vec<Approval>,
    pub fetched_at: DateTime<Utc>,
}

/// Fetch a fresh snapshot. Used by the loop and by manual refresh paths.
pub async fn fetch_snapshot(
    api: &Arc<dyn SecretaryApi>,
) -> Result<DashboardSnapshot, ClientError> {
    let stats = api.dashboard_stats().await?;
    let pending = api.pending_approvals().await?;
    Ok(DashboardSnapshot {
        stats,
        pending,
        fetched_at: Utc::now(),
    })
}

/// Run the refresh loop until the watch channel has no receivers left.
///
/// Sleeps `interval` between rounds, or wakes early when `wake` is notified
/// (manual refresh button). Fetch errors are logged and the loop carries on;
/// an auth failure has already cleared the session by the time it is seen
/// here, so the loop keeps idling until a login produces data again.
pub async fn run_refresh_loop(
    api: Arc<dyn SecretaryApi>,
    interval: Duration,
    wake: Arc<Notify>,
    tx: watch::Sender<Option<DashboardSnapshot>>,
) {
    loop {
        match fetch_snapshot(&api).await {
            Ok(snapshot) => {
                let pending = snapshot.pending.len();
                if tx.send(Some(snapshot)).is_err() {
                    log::info!("refresh loop: no receivers left, stopping");
                    return;
                }
                log::info!("refresh loop: snapshot published ({pending} pending approvals)");
            }
            Err(err) => {
                log::warn!("refresh loop: fetch failed: {err}");
                if tx.is_closed() {
                    return;
                }
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {},
            _ = wake.notified() => {
                log::info!("refresh loop: woken by manual refresh");
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::DemoApi;
    use crate::session::SessionStore;

    fn demo_api() -> Arc<dyn SecretaryApi> {
        Arc::new(DemoApi::new(Arc::new(SessionStore::in_memory())))
    }

    #[tokio::test]
    async fn test_fetch_snapshot_over_demo_backend() {
        let api = demo_api();
        let snapshot = fetch_snapshot(&api).await.unwrap();
        assert_eq!(snapshot.stats.pending_approvals, 2);
        assert_eq!(snapshot.pending.len(), 2);
    }

    #[tokio::test]
    async fn test_snapshot_replaced_wholesale() {
        let api = demo_api();

        let first = fetch_snapshot(&api).await.unwrap();
        let draft = first.pending[0].task.clone();
        api.approve_task(first.pending[0].id, &draft).await.unwrap();

        let second = fetch_snapshot(&api).await.unwrap();
        assert_eq!(second.pending.len(), 1);
        assert_eq!(second.stats.pending_approvals, 1);
        assert!(second.fetched_at >= first.fetched_at);
    }

    #[tokio::test]
    async fn test_loop_publishes_and_stops_without_receivers() {
        let api = demo_api();
        let wake = Arc::new(Notify::new());
        let (tx, mut rx) = watch::channel(None);

        let handle = tokio::spawn(run_refresh_loop(
            api,
            Duration::from_secs(3600),
            wake.clone(),
            tx,
        ));

        // First publish lands immediately.
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_some());

        // Dropping every receiver ends the loop on its next publish.
        drop(rx);
        wake.notify_one();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("loop should stop once receivers are gone")
            .unwrap();
    }
}
