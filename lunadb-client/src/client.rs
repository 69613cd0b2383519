use crate::bridge::DocumentBridge;
use crate::config::ClientConfig;
use crate::errors::ClientResult;
use crate::session::Session;
use lunadb_core::{Document, Operation, Presence, RejectedOperation, SyncRequest};

/// What a sync did to a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    /// Version the session is now at.
    pub hlc: String,
    /// Number of operations from other sessions folded into the base.
    pub remote_applied: usize,
    /// Local operations discarded because a remote change made them moot.
    pub dropped: Vec<Operation>,
    /// Remote operations that failed to apply to the local base.
    pub rejected: Vec<RejectedOperation>,
}

pub struct Client<B> {
    bridge: B,
    config: ClientConfig,
}

impl<B: DocumentBridge> Client<B> {
    pub fn new(bridge: B, config: ClientConfig) -> Self {
        Self { bridge, config }
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn create_document(&self, key: &str) -> ClientResult<()> {
        self.bridge.create_document(key).await?;
        tracing::info!(key, "Created document");
        Ok(())
    }

    pub async fn delete_document(&self, key: &str) -> ClientResult<()> {
        self.bridge.delete_document(key).await?;
        tracing::info!(key, "Deleted document");
        Ok(())
    }

    pub async fn load_document(&self, key: &str) -> ClientResult<Session> {
        let response = self.bridge.load_document(key).await?;
        let document = Document::from_load(key, response);
        tracing::info!(
            key,
            hlc = %document.hlc,
            checksum = %document.checksum(),
            "Loaded document"
        );
        Ok(Session::new(document, self.config.rebase))
    }

    /// Send the session's pending edits and fold in everything committed by
    /// other sessions since its version.
    pub async fn sync(&self, session: &mut Session) -> ClientResult<SyncOutcome> {
        let key = session.document().id.clone();
        let request = self.sync_request(session);
        let sent = request.transaction.changes.len();

        let response = self.bridge.sync_document(&key, &request).await?;
        let remote_applied = response.changes.len();
        let rebase = session.acknowledge(response);

        tracing::info!(
            key = %key,
            hlc = %session.hlc(),
            sent,
            remote_applied,
            dropped = rebase.dropped.len(),
            rejected = rebase.rejected.len(),
            checksum = %session.document().checksum(),
            "Synced document"
        );

        Ok(SyncOutcome {
            hlc: session.hlc().to_string(),
            remote_applied,
            dropped: rebase.dropped,
            rejected: rebase.rejected,
        })
    }

    fn sync_request(&self, session: &Session) -> SyncRequest {
        let mut request = SyncRequest::new(session.transaction());
        request.presence = Some(Presence {
            id: Some(self.config.session_id.to_string()),
            metadata: self.config.session_metadata.clone(),
        });
        request.fetch_all_presence_data = self.config.fetch_all_presence_data;
        request.exclude_presence = self.config.exclude_presence;
        request
    }
}
