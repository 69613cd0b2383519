use crate::delta::{calculate_checksum, Delta, RejectedOperation};
use crate::operations::Operation;
use crate::protocol::LoadResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// A document tree and the server version it reflects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: Value,
    /// Opaque, server-issued version token (a hybrid logical clock string).
    pub hlc: String,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(id: impl Into<String>, content: Value, hlc: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content,
            hlc: hlc.into(),
            last_synced_at: None,
        }
    }

    pub fn from_load(id: impl Into<String>, response: LoadResponse) -> Self {
        Self {
            id: id.into(),
            content: response.contents,
            hlc: response.hlc,
            last_synced_at: Some(Utc::now()),
        }
    }

    pub fn apply_delta(&mut self, delta: &Delta) -> Vec<RejectedOperation> {
        delta.apply(&mut self.content)
    }

    pub fn checksum(&self) -> String {
        calculate_checksum(&self.content)
    }
}

/// A delta together with the version it was authored against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub hlc: String,
    #[serde(default)]
    pub changes: Delta,
}

impl Transaction {
    pub fn new(hlc: impl Into<String>) -> Self {
        Self {
            hlc: hlc.into(),
            changes: Delta::new(),
        }
    }

    pub fn with_changes(hlc: impl Into<String>, changes: Delta) -> Self {
        Self {
            hlc: hlc.into(),
            changes,
        }
    }

    pub fn insert(&mut self, pointer: impl Into<String>, content: Value) -> &mut Self {
        self.changes.push(Operation::insert(pointer, content));
        self
    }

    pub fn delete(&mut self, pointer: impl Into<String>) -> &mut Self {
        self.changes.push(Operation::delete(pointer));
        self
    }

    pub fn replace(&mut self, pointer: impl Into<String>, content: Value) -> &mut Self {
        self.changes.push(Operation::replace(pointer, content));
        self
    }

    pub fn increment(&mut self, pointer: impl Into<String>, diff: impl Into<Number>) -> &mut Self {
        self.changes.push(Operation::increment(pointer, diff));
        self
    }

    pub fn string_insert(&mut self, pointer: impl Into<String>, idx: usize, content: impl Into<String>) -> &mut Self {
        self.changes.push(Operation::string_insert(pointer, idx, content));
        self
    }

    pub fn string_remove(&mut self, pointer: impl Into<String>, idx: usize, len: usize) -> &mut Self {
        self.changes.push(Operation::string_remove(pointer, idx, len));
        self
    }
}
