//! Rebasing local operations over already-committed remote operations
//!
//! The remote operation always wins: it has been ordered by the server. A
//! local operation is rewritten so that replaying it after the remote one
//! still does what its author meant, or it is dropped when that intent no
//! longer exists.

use crate::operations::Operation;
use crate::pointer::{compile_pointer, is_descendant, parse_index, parse_pointer, resolve, Slot};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebaseOptions {
    /// Drop local edits below a node that a remote insert, replace or delete
    /// has rewritten. Off by default.
    pub drop_orphaned_edits: bool,
}

/// Rebase `local` over `remote` with default options.
///
/// `before` must be the tree as it was before `remote` was applied. Returns
/// `None` when the local operation must be discarded.
///
/// # Examples
/// ```
/// # use lunadb_core::operations::Operation;
/// # use lunadb_core::rebase::rebase;
/// # use serde_json::json;
/// let before = json!({"arr": ["baz"]});
/// let local = Operation::insert("/arr/1", json!("foo"));
/// let remote = Operation::insert("/arr/1", json!("bar"));
/// assert_eq!(rebase(&local, &remote, &before), Some(Operation::insert("/arr/2", json!("foo"))));
/// ```
pub fn rebase(local: &Operation, remote: &Operation, before: &Value) -> Option<Operation> {
    rebase_with(local, remote, before, RebaseOptions::default())
}

pub fn rebase_with(
    local: &Operation,
    remote: &Operation,
    before: &Value,
    options: RebaseOptions,
) -> Option<Operation> {
    match shift_array_index(local, remote, before) {
        Shift::Moved(op) => {
            tracing::debug!(
                from = local.pointer(),
                to = op.pointer(),
                remote = %remote.kind(),
                "Shifted local operation"
            );
            return Some(op);
        }
        Shift::Removed => {
            tracing::debug!(pointer = local.pointer(), "Local operation targets a removed element");
            return None;
        }
        Shift::Unaffected => {}
    }

    if options.drop_orphaned_edits
        && remote.is_destructive()
        && !remote.pointer().is_empty()
        && is_descendant(local.pointer(), remote.pointer())
    {
        tracing::debug!(
            pointer = local.pointer(),
            ancestor = remote.pointer(),
            "Local operation orphaned by remote rewrite"
        );
        return None;
    }

    if local.pointer() == remote.pointer() {
        return rebase_same_pointer(local, remote);
    }

    Some(local.clone())
}

enum Shift {
    Unaffected,
    Moved(Operation),
    Removed,
}

/// Remote inserts and deletes in an array move every later sibling.
fn shift_array_index(local: &Operation, remote: &Operation, before: &Value) -> Shift {
    if !matches!(remote, Operation::Insert { .. } | Operation::Delete { .. }) {
        return Shift::Unaffected;
    }

    let Ok(remote_tokens) = parse_pointer(remote.pointer()) else {
        return Shift::Unaffected;
    };
    let Ok(Slot::Element { items, index: remote_idx }) = resolve(before, &remote_tokens) else {
        return Shift::Unaffected;
    };
    // A delete at the append position removes nothing
    if matches!(remote, Operation::Delete { .. }) && remote_idx >= items.len() {
        return Shift::Unaffected;
    }
    let Ok(mut local_tokens) = parse_pointer(local.pointer()) else {
        return Shift::Unaffected;
    };

    let depth = remote_tokens.len() - 1;
    if local_tokens.len() <= depth || local_tokens[..depth] != remote_tokens[..depth] {
        return Shift::Unaffected;
    }
    let Some(local_idx) = parse_index(&local_tokens[depth]) else {
        return Shift::Unaffected;
    };

    if local_idx < remote_idx {
        return Shift::Unaffected;
    }

    let shifted = match remote {
        Operation::Insert { .. } => match local_idx.checked_add(1) {
            Some(shifted) => shifted,
            // No array is that long, so the local op cannot apply either way
            None => return Shift::Unaffected,
        },
        _ if local_idx != remote_idx => local_idx - 1,
        _ => return Shift::Removed,
    };
    local_tokens[depth] = shifted.to_string();

    Shift::Moved(local.with_pointer(compile_pointer(&local_tokens)))
}

fn rebase_same_pointer(local: &Operation, remote: &Operation) -> Option<Operation> {
    if remote.is_destructive() && local.is_in_place() {
        return None;
    }

    match (local, remote) {
        // Deleting twice is the same as deleting once
        (Operation::Delete { .. }, Operation::Delete { .. }) => None,
        (
            Operation::StringInsert { pointer, idx, content },
            Operation::StringInsert {
                idx: remote_idx,
                content: remote_content,
                ..
            },
        ) => {
            let idx = if remote_idx <= idx {
                shift_right(*idx, remote_content)
            } else {
                *idx
            };
            Some(Operation::string_insert(pointer.as_str(), idx, content.as_str()))
        }
        (
            Operation::StringRemove { pointer, idx, len },
            Operation::StringInsert {
                idx: remote_idx,
                content: remote_content,
                ..
            },
        ) => {
            let idx = if remote_idx <= idx {
                shift_right(*idx, remote_content)
            } else {
                *idx
            };
            Some(Operation::string_remove(pointer.as_str(), idx, *len))
        }
        (
            Operation::StringInsert { pointer, idx, content },
            Operation::StringRemove {
                idx: remote_idx,
                len: remote_len,
                ..
            },
        ) => {
            let idx = if remote_idx <= idx {
                idx.saturating_sub(*remote_len)
            } else {
                *idx
            };
            Some(Operation::string_insert(pointer.as_str(), idx, content.as_str()))
        }
        (
            Operation::StringRemove { pointer, idx, len },
            Operation::StringRemove {
                idx: remote_idx,
                len: remote_len,
                ..
            },
        ) => rebase_removal(pointer, *idx, *len, *remote_idx, *remote_len),
        _ => Some(local.clone()),
    }
}

/// Move a string offset past remotely inserted text. An offset that would
/// overflow cannot address any string and is left as is.
fn shift_right(idx: usize, inserted: &str) -> usize {
    idx.checked_add(inserted.chars().count()).unwrap_or(idx)
}

/// Interval arithmetic for two removals on the same string. Ranges are
/// inclusive, so a range of length zero ends one before it starts.
fn rebase_removal(
    pointer: &str,
    idx: usize,
    len: usize,
    remote_idx: usize,
    remote_len: usize,
) -> Option<Operation> {
    if remote_len == 0 {
        return Some(Operation::string_remove(pointer, idx, len));
    }

    // i128 holds any usize sum without overflow
    let (idx, len) = (idx as i128, len as i128);
    let (remote_idx, remote_len) = (remote_idx as i128, remote_len as i128);
    let local_max = idx + len - 1;
    let remote_max = remote_idx + remote_len - 1;

    let (idx, len) = if idx > remote_max {
        // Entirely right of the removed range
        (idx - remote_len, len)
    } else if idx >= remote_idx && local_max <= remote_max {
        // Already removed
        return None;
    } else if idx < remote_idx && local_max >= remote_idx {
        // Starts left of the removed range and runs into it: keep the left part
        (idx, remote_idx - idx)
    } else if idx <= remote_idx && local_max >= remote_max {
        // Same start, runs past the removed range
        (idx, len - remote_len)
    } else if idx > remote_idx && local_max > remote_max {
        // Starts inside the removed range and runs past it
        (remote_idx, local_max - remote_max)
    } else {
        (idx, len)
    };

    Some(Operation::string_remove(pointer, idx as usize, len as usize))
}
