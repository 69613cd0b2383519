//! LunaDB - Collaborative JSON documents with operational rebase
//!
//! This crate provides a unified API for the LunaDB client and its core types.
//!
//! # Example
//!
//! ```
//! use lunadb::{Delta, Document, Operation, Session, RebaseOptions};
//! use serde_json::json;
//!
//! let document = Document::new("notes", json!({"title": "Hello"}), "0");
//! let mut session = Session::new(document, RebaseOptions::default());
//! session.edit(Operation::string_insert("/title", 5, " world")).unwrap();
//!
//! let remote = Delta::from(vec![Operation::string_insert("/title", 0, ">> ")]);
//! session.receive_remote("1", &remote);
//! assert_eq!(session.view(), &json!({"title": ">> Hello world"}));
//! ```

// Re-export client types
pub use lunadb_client::{Client, ClientConfig, ClientError, ClientResult, DocumentBridge, Session, SyncOutcome};

// Re-export core types that applications need
pub use lunadb_core::delta::{calculate_checksum, rebase_delta, Delta, DeltaRebase, RejectedOperation};
pub use lunadb_core::errors::{ApplyError, PointerError};
pub use lunadb_core::models::{Document, Transaction};
pub use lunadb_core::operations::{apply_operation, Operation, OperationKind};
pub use lunadb_core::pointer::{compile_pointer, parse_pointer};
pub use lunadb_core::protocol::{CreateDocumentRequest, LoadResponse, Presence, SyncRequest, SyncResponse};
pub use lunadb_core::rebase::{rebase, rebase_with, RebaseOptions};
pub use lunadb_core::ApplyResult;
