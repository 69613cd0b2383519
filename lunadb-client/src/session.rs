//! A client's working copy of one document
//!
//! The session keeps three things: the base (the last state confirmed by the
//! server, with its version), the pending delta (local edits the server has
//! not acknowledged) and the view (base with pending replayed). Callers read
//! and edit the view; syncing moves pending edits into the base.

use crate::errors::{ClientError, ClientResult};
use chrono::Utc;
use lunadb_core::{
    apply_operation, rebase_delta, Delta, DeltaRebase, Document, Operation, RebaseOptions,
    RejectedOperation, SyncResponse, Transaction,
};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct Session {
    document: Document,
    pending: Delta,
    view: Value,
    options: RebaseOptions,
}

impl Session {
    pub fn new(document: Document, options: RebaseOptions) -> Self {
        let view = document.content.clone();
        Self {
            document,
            pending: Delta::new(),
            view,
            options,
        }
    }

    /// The document as this client sees it, pending edits included.
    pub fn view(&self) -> &Value {
        &self.view
    }

    /// The server-confirmed base.
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn pending(&self) -> &Delta {
        &self.pending
    }

    pub fn hlc(&self) -> &str {
        &self.document.hlc
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Apply `operation` to the view and queue it for the next sync.
    pub fn edit(&mut self, operation: Operation) -> ClientResult<()> {
        apply_operation(&operation, &mut self.view)?;
        self.pending.push(operation);
        Ok(())
    }

    pub fn begin(&self) -> Transaction {
        Transaction::new(self.document.hlc.clone())
    }

    /// Edit every operation of `transaction` in order. Operations that fail
    /// to apply are returned; the rest stay queued.
    pub fn commit(&mut self, transaction: Transaction) -> ClientResult<Vec<RejectedOperation>> {
        if transaction.hlc != self.document.hlc {
            return Err(ClientError::VersionMismatch {
                expected: self.document.hlc.clone(),
                actual: transaction.hlc,
            });
        }

        let mut rejected = Vec::new();
        for (position, operation) in transaction.changes.into_iter().enumerate() {
            if let Err(error) = apply_operation(&operation, &mut self.view) {
                tracing::warn!(position, pointer = operation.pointer(), %error, "Rejected local edit");
                rejected.push(RejectedOperation {
                    position,
                    operation,
                    error,
                });
                continue;
            }
            self.pending.push(operation);
        }
        Ok(rejected)
    }

    /// The pending queue, addressed at the current version, ready to send.
    pub fn transaction(&self) -> Transaction {
        Transaction::with_changes(self.document.hlc.clone(), self.pending.clone())
    }

    /// Move the base past a batch of remote operations, rebasing the pending
    /// queue over it. Pending operations that no longer apply to the new view
    /// are reported as dropped.
    pub fn receive_remote(&mut self, hlc: impl Into<String>, changes: &Delta) -> DeltaRebase {
        let mut rebase = rebase_delta(&self.pending, changes, &mut self.document.content, self.options);
        self.document.hlc = hlc.into();
        self.pending = std::mem::take(&mut rebase.rebased);

        let unapplied = self.rebuild_view();
        rebase.dropped.extend(unapplied);
        rebase.rebased = self.pending.clone();

        tracing::debug!(
            hlc = %self.document.hlc,
            remote = changes.len(),
            pending = self.pending.len(),
            dropped = rebase.dropped.len(),
            "Received remote changes"
        );
        rebase
    }

    /// Handle the server's answer to [`Session::transaction`]: receive the
    /// remote batch, then fold the surviving pending operations into the base,
    /// where the server committed them.
    pub fn acknowledge(&mut self, response: SyncResponse) -> DeltaRebase {
        let rebase = self.receive_remote(response.hlc, &response.changes);

        self.document.content = self.view.clone();
        self.document.last_synced_at = Some(Utc::now());
        self.pending = Delta::new();
        rebase
    }

    /// Replay pending onto a fresh copy of the base. Operations that fail are
    /// removed from the queue and returned.
    fn rebuild_view(&mut self) -> Vec<Operation> {
        let mut view = self.document.content.clone();
        let mut kept = Delta::new();
        let mut unapplied = Vec::new();

        for operation in std::mem::take(&mut self.pending) {
            match apply_operation(&operation, &mut view) {
                Ok(()) => kept.push(operation),
                Err(error) => {
                    tracing::warn!(
                        op = %operation.kind(),
                        pointer = operation.pointer(),
                        %error,
                        "Dropping pending edit that no longer applies"
                    );
                    unapplied.push(operation);
                }
            }
        }

        self.view = view;
        self.pending = kept;
        unapplied
    }
}
