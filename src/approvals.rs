//! Approval workflow over the API surface.
//!
//! Each approval is pending until the user accepts or rejects it; both
//! outcomes are terminal and remove the item from the pending set. The
//! manager mirrors the backend's pending list locally so the UI can render
//! counts without a round trip; `refresh` replaces the mirror wholesale.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::api::SecretaryApi;
use crate::error::ClientError;
use crate::types::{Approval, TaskDraft};

/// Result of a bulk approve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApproveAllOutcome {
    /// Number of approvals accepted.
    Approved(usize),
    /// The pending set was empty; no network call was made.
    NothingPending,
}

pub struct ApprovalWorkflow {
    api: Arc<dyn SecretaryApi>,
    pending: RwLock<Vec<Approval>>,
}

impl ApprovalWorkflow {
    pub fn new(api: Arc<dyn SecretaryApi>) -> Self {
        Self {
            api,
            pending: RwLock::new(Vec::new()),
        }
    }

    /// Replace the local pending set from the backend.
    pub async fn refresh(&self) -> Result<usize, ClientError> {
        let approvals = self.api.pending_approvals().await?;
        let count = approvals.len();
        *self.pending.write() = approvals;
        Ok(count)
    }

    /// Snapshot of the local pending set.
    pub fn pending(&self) -> Vec<Approval> {
        self.pending.read().clone()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.read().len()
    }

    fn draft_for(&self, id: i64) -> Option<TaskDraft> {
        self.pending
            .read()
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.task.clone())
    }

    fn remove_local(&self, id: i64) {
        self.pending.write().retain(|a| a.id != id);
    }

    /// Accept an approval. `edits` overrides the stored draft; `None` sends
    /// the draft as last seen. On success the item leaves the pending set.
    pub async fn approve(
        &self,
        id: i64,
        edits: Option<&TaskDraft>,
    ) -> Result<(), ClientError> {
        let draft = match edits {
            Some(edits) => edits.clone(),
            None => self
                .draft_for(id)
                .ok_or(ClientError::UnknownApproval(id))?,
        };
        self.api.approve_task(id, &draft).await?;
        self.remove_local(id);
        log::info!("approval {id} accepted");
        Ok(())
    }

    /// Reject an approval with an optional reason. Terminal.
    pub async fn reject(&self, id: i64, reason: Option<&str>) -> Result<(), ClientError> {
        self.api.reject_task(id, reason).await?;
        self.remove_local(id);
        log::info!("approval {id} rejected");
        Ok(())
    }

    /// Save draft edits on a pending approval without deciding it.
    pub async fn save_edits(&self, id: i64, edits: &TaskDraft) -> Result<(), ClientError> {
        self.api.update_approval(id, edits).await?;
        let mut pending = self.pending.write();
        if let Some(approval) = pending.iter_mut().find(|a| a.id == id) {
            approval.task = edits.clone();
        }
        Ok(())
    }

    /// Accept every pending approval, each with its stored draft.
    ///
    /// An empty pending set short-circuits with [`ApproveAllOutcome::NothingPending`]
    /// and never contacts the backend. There are no partial-batch semantics:
    /// a mid-batch failure returns the error with the earlier approvals
    /// already committed and removed — treat the state as unknown and call
    /// [`Self::refresh`].
    pub async fn approve_all(&self) -> Result<ApproveAllOutcome, ClientError> {
        let snapshot = self.pending();
        if snapshot.is_empty() {
            return Ok(ApproveAllOutcome::NothingPending);
        }

        let mut approved = 0;
        for approval in snapshot {
            self.api.approve_task(approval.id, &approval.task).await?;
            self.remove_local(approval.id);
            approved += 1;
        }
        log::info!("approved all: {approved} approvals accepted");
        Ok(ApproveAllOutcome::Approved(approved))
    }
}
