//! Request and response bodies exchanged with the document server

use crate::delta::Delta;
use crate::models::Transaction;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDocumentRequest {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadResponse {
    pub contents: Value,
    pub hlc: String,
}

/// Session presence attached to a sync. Passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Presence {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRequest {
    #[serde(flatten)]
    pub transaction: Transaction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence: Option<Presence>,
    #[serde(default)]
    pub fetch_all_presence_data: bool,
    #[serde(default)]
    pub exclude_presence: bool,
}

impl SyncRequest {
    pub fn new(transaction: Transaction) -> Self {
        Self {
            transaction,
            presence: None,
            fetch_all_presence_data: false,
            exclude_presence: false,
        }
    }
}

/// Operations committed by others since the request's version, in server
/// order, and the version that follows them and the request's own changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncResponse {
    pub hlc: String,
    #[serde(default)]
    pub changes: Delta,
}
