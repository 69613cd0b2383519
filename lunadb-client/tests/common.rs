use lunadb_client::{ClientError, ClientResult, DocumentBridge};
use lunadb_core::{
    apply_operation, rebase_delta, Delta, LoadResponse, Operation, RebaseOptions, SyncRequest, SyncResponse,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Routes test logs through the test writer; `RUST_LOG` selects the level.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off")))
        .with_test_writer()
        .try_init();
}

/// Committed history of one document. `states[n]` is the tree after the
/// first `n` operations of `log`, so the version string is `log.len()`.
struct StoredDocument {
    log: Vec<Operation>,
    states: Vec<Value>,
}

impl StoredDocument {
    fn new(content: Value) -> Self {
        Self {
            log: Vec::new(),
            states: vec![content],
        }
    }

    fn hlc(&self) -> String {
        self.log.len().to_string()
    }

    fn current(&self) -> &Value {
        &self.states[self.states.len() - 1]
    }
}

/// In-memory authoritative server.
#[derive(Default)]
pub struct MemoryBridge {
    documents: Mutex<HashMap<String, StoredDocument>>,
    requests: Mutex<Vec<SyncRequest>>,
}

#[allow(dead_code)]
impl MemoryBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document with initial content at version "0".
    pub fn seed(&self, key: &str, content: Value) {
        self.documents
            .lock()
            .unwrap()
            .insert(key.to_string(), StoredDocument::new(content));
    }

    pub fn contents(&self, key: &str) -> Option<Value> {
        self.documents.lock().unwrap().get(key).map(|doc| doc.current().clone())
    }

    pub fn log(&self, key: &str) -> Vec<Operation> {
        self.documents
            .lock()
            .unwrap()
            .get(key)
            .map(|doc| doc.log.clone())
            .unwrap_or_default()
    }

    pub fn last_request(&self) -> Option<SyncRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl DocumentBridge for MemoryBridge {
    async fn create_document(&self, key: &str) -> ClientResult<()> {
        let mut documents = self.documents.lock().unwrap();
        if documents.contains_key(key) {
            return Err(ClientError::Bridge {
                status: 409,
                message: format!("document {} already exists", key),
            });
        }
        documents.insert(key.to_string(), StoredDocument::new(json!({})));
        Ok(())
    }

    async fn delete_document(&self, key: &str) -> ClientResult<()> {
        match self.documents.lock().unwrap().remove(key) {
            Some(_) => Ok(()),
            None => Err(ClientError::DocumentNotFound(key.to_string())),
        }
    }

    async fn load_document(&self, key: &str) -> ClientResult<LoadResponse> {
        let documents = self.documents.lock().unwrap();
        let doc = documents
            .get(key)
            .ok_or_else(|| ClientError::DocumentNotFound(key.to_string()))?;
        Ok(LoadResponse {
            contents: doc.current().clone(),
            hlc: doc.hlc(),
        })
    }

    async fn sync_document(&self, key: &str, request: &SyncRequest) -> ClientResult<SyncResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let mut documents = self.documents.lock().unwrap();
        let doc = documents
            .get_mut(key)
            .ok_or_else(|| ClientError::DocumentNotFound(key.to_string()))?;

        let since: usize = request
            .transaction
            .hlc
            .parse()
            .ok()
            .filter(|n| *n <= doc.log.len())
            .ok_or_else(|| ClientError::Bridge {
                status: 400,
                message: format!("unknown version {}", request.transaction.hlc),
            })?;

        let remote = Delta::from(doc.log[since..].to_vec());
        let mut base = doc.states[since].clone();
        let rebase = rebase_delta(&request.transaction.changes, &remote, &mut base, RebaseOptions::default());

        for operation in rebase.rebased {
            let mut next = doc.current().clone();
            if apply_operation(&operation, &mut next).is_ok() {
                doc.log.push(operation);
                doc.states.push(next);
            }
        }

        Ok(SyncResponse {
            hlc: doc.hlc(),
            changes: remote,
        })
    }
}
