use crate::errors::ApplyError;
use crate::operations::{apply_operation, Operation};
use crate::rebase::{rebase_with, RebaseOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// An ordered sequence of operations. Order matters: each operation sees the
/// tree as left by the ones before it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Delta(pub Vec<Operation>);

/// An operation the applier refused, with its position in the delta.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedOperation {
    pub position: usize,
    pub operation: Operation,
    pub error: ApplyError,
}

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, operation: Operation) {
        self.0.push(operation);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.0.iter()
    }

    /// Apply every operation in order. Failed operations are skipped and
    /// returned; the rest still apply.
    pub fn apply(&self, tree: &mut Value) -> Vec<RejectedOperation> {
        let mut rejected = Vec::new();
        for (position, operation) in self.0.iter().enumerate() {
            if let Err(error) = apply_operation(operation, tree) {
                tracing::warn!(
                    position,
                    op = %operation.kind(),
                    pointer = operation.pointer(),
                    %error,
                    "Skipping operation that failed to apply"
                );
                rejected.push(RejectedOperation {
                    position,
                    operation: operation.clone(),
                    error,
                });
            }
        }
        rejected
    }
}

impl From<Vec<Operation>> for Delta {
    fn from(operations: Vec<Operation>) -> Self {
        Delta(operations)
    }
}

impl FromIterator<Operation> for Delta {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Delta(iter.into_iter().collect())
    }
}

impl IntoIterator for Delta {
    type Item = Operation;
    type IntoIter = std::vec::IntoIter<Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Delta {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Result of replaying a remote batch underneath a local one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeltaRebase {
    /// Surviving local operations, rewritten to follow the remote batch.
    pub rebased: Delta,
    /// Local operations whose intent vanished.
    pub dropped: Vec<Operation>,
    /// Remote operations the applier refused while advancing `base`.
    pub rejected: Vec<RejectedOperation>,
}

/// Rebase `local` over `remote` and advance `base` through `remote`.
///
/// Every remote operation is taken in order and applied to `base`. Each
/// surviving local operation is then rebased against it using the state from
/// just before it. A remote operation that fails to apply changed nothing, so
/// it is reported and the local operations are left alone.
///
/// # Example
/// ```
/// use lunadb_core::delta::{rebase_delta, Delta};
/// use lunadb_core::operations::Operation;
/// use lunadb_core::rebase::RebaseOptions;
/// use serde_json::json;
///
/// let mut base = json!({"items": ["a", "b"]});
/// let local = Delta::from(vec![Operation::delete("/items/1")]);
/// let remote = Delta::from(vec![Operation::insert("/items/0", json!("z"))]);
///
/// let result = rebase_delta(&local, &remote, &mut base, RebaseOptions::default());
/// assert_eq!(base, json!({"items": ["z", "a", "b"]}));
/// assert_eq!(result.rebased, Delta::from(vec![Operation::delete("/items/2")]));
/// ```
pub fn rebase_delta(local: &Delta, remote: &Delta, base: &mut Value, options: RebaseOptions) -> DeltaRebase {
    let mut pending = local.0.clone();
    let mut dropped = Vec::new();
    let mut rejected = Vec::new();

    for (position, remote_op) in remote.iter().enumerate() {
        let before = base.clone();
        if let Err(error) = apply_operation(remote_op, base) {
            tracing::warn!(
                position,
                op = %remote_op.kind(),
                pointer = remote_op.pointer(),
                %error,
                "Remote operation failed to apply"
            );
            rejected.push(RejectedOperation {
                position,
                operation: remote_op.clone(),
                error,
            });
            continue;
        }

        let mut survivors = Vec::with_capacity(pending.len());
        for local_op in pending {
            match rebase_with(&local_op, remote_op, &before, options) {
                Some(rebased) => survivors.push(rebased),
                None => dropped.push(local_op),
            }
        }
        pending = survivors;
    }

    DeltaRebase {
        rebased: Delta(pending),
        dropped,
        rejected,
    }
}

/// SHA-256 of the compact JSON encoding, hex encoded.
pub fn calculate_checksum(value: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}
