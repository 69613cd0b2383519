use crate::errors::{ClientError, ClientResult};
use lunadb_core::RebaseOptions;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const SESSION_ID_VAR: &str = "LUNADB_SESSION_ID";
pub const FETCH_ALL_PRESENCE_VAR: &str = "LUNADB_FETCH_ALL_PRESENCE";
pub const EXCLUDE_PRESENCE_VAR: &str = "LUNADB_EXCLUDE_PRESENCE";
pub const DROP_ORPHANED_EDITS_VAR: &str = "LUNADB_DROP_ORPHANED_EDITS";
pub const SESSION_METADATA_VAR: &str = "LUNADB_SESSION_METADATA";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Identifies this client's presence to other sessions.
    pub session_id: Uuid,
    pub session_metadata: Option<Value>,
    pub fetch_all_presence_data: bool,
    pub exclude_presence: bool,
    #[serde(default)]
    pub rebase: RebaseOptions,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            session_metadata: None,
            fetch_all_presence_data: false,
            exclude_presence: false,
            rebase: RebaseOptions::default(),
        }
    }
}

impl ClientConfig {
    /// Build a config from `LUNADB_*` environment variables. Flags are enabled
    /// by the value `"true"`; a missing session id gets a fresh one. Session
    /// metadata, when set, must be JSON.
    pub fn from_env() -> ClientResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> ClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |name: &str| lookup(name).unwrap_or_default() == "true";

        let session_id = match lookup(SESSION_ID_VAR) {
            Some(raw) => Uuid::parse_str(raw.trim())
                .map_err(|e| ClientError::InvalidConfig(format!("{}: {}", SESSION_ID_VAR, e)))?,
            None => Uuid::new_v4(),
        };

        let session_metadata = match lookup(SESSION_METADATA_VAR) {
            Some(raw) => Some(serde_json::from_str::<Value>(&raw)?),
            None => None,
        };

        Ok(Self {
            session_id,
            session_metadata,
            fetch_all_presence_data: flag(FETCH_ALL_PRESENCE_VAR),
            exclude_presence: flag(EXCLUDE_PRESENCE_VAR),
            rebase: RebaseOptions {
                drop_orphaned_edits: flag(DROP_ORPHANED_EDITS_VAR),
            },
        })
    }

    pub fn with_session_metadata(mut self, metadata: Value) -> Self {
        self.session_metadata = Some(metadata);
        self
    }
}
