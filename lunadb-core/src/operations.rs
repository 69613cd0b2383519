//! The six primitive document operations and the applier that executes them

use crate::errors::ApplyError;
use crate::pointer::{parse_pointer, resolve_mut, SlotMut};
use crate::ApplyResult;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use strum::{AsRefStr, Display, EnumString};

/// A single pointer-addressed edit.
///
/// Serialized with an `op` tag, matching the sync wire format:
/// `{"op": "stringinsert", "pointer": "/title", "idx": 0, "content": "A"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operation {
    /// Array: shift-and-insert at the index. Object: set the key, overwriting.
    Insert { pointer: String, content: Value },
    /// Array: remove and shift left. Object: remove the key.
    Delete { pointer: String },
    /// Overwrite an existing value.
    Replace { pointer: String, content: Value },
    #[serde(rename = "incr")]
    Increment { pointer: String, diff: Number },
    #[serde(rename = "stringinsert")]
    StringInsert {
        pointer: String,
        idx: usize,
        content: String,
    },
    #[serde(rename = "stringremove")]
    StringRemove {
        pointer: String,
        idx: usize,
        len: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum OperationKind {
    Insert,
    Delete,
    Replace,
    #[strum(serialize = "incr")]
    Increment,
    StringInsert,
    StringRemove,
}

impl Operation {
    pub fn insert(pointer: impl Into<String>, content: Value) -> Self {
        Operation::Insert {
            pointer: pointer.into(),
            content,
        }
    }

    pub fn delete(pointer: impl Into<String>) -> Self {
        Operation::Delete {
            pointer: pointer.into(),
        }
    }

    pub fn replace(pointer: impl Into<String>, content: Value) -> Self {
        Operation::Replace {
            pointer: pointer.into(),
            content,
        }
    }

    pub fn increment(pointer: impl Into<String>, diff: impl Into<Number>) -> Self {
        Operation::Increment {
            pointer: pointer.into(),
            diff: diff.into(),
        }
    }

    pub fn string_insert(pointer: impl Into<String>, idx: usize, content: impl Into<String>) -> Self {
        Operation::StringInsert {
            pointer: pointer.into(),
            idx,
            content: content.into(),
        }
    }

    pub fn string_remove(pointer: impl Into<String>, idx: usize, len: usize) -> Self {
        Operation::StringRemove {
            pointer: pointer.into(),
            idx,
            len,
        }
    }

    pub fn pointer(&self) -> &str {
        match self {
            Operation::Insert { pointer, .. }
            | Operation::Delete { pointer }
            | Operation::Replace { pointer, .. }
            | Operation::Increment { pointer, .. }
            | Operation::StringInsert { pointer, .. }
            | Operation::StringRemove { pointer, .. } => pointer,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Insert { .. } => OperationKind::Insert,
            Operation::Delete { .. } => OperationKind::Delete,
            Operation::Replace { .. } => OperationKind::Replace,
            Operation::Increment { .. } => OperationKind::Increment,
            Operation::StringInsert { .. } => OperationKind::StringInsert,
            Operation::StringRemove { .. } => OperationKind::StringRemove,
        }
    }

    /// A copy of this operation addressed at `pointer`.
    pub fn with_pointer(&self, pointer: impl Into<String>) -> Self {
        let mut op = self.clone();
        match &mut op {
            Operation::Insert { pointer: p, .. }
            | Operation::Delete { pointer: p }
            | Operation::Replace { pointer: p, .. }
            | Operation::Increment { pointer: p, .. }
            | Operation::StringInsert { pointer: p, .. }
            | Operation::StringRemove { pointer: p, .. } => *p = pointer.into(),
        }
        op
    }

    /// Insert, Delete and Replace change the identity of their target.
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            Operation::Insert { .. } | Operation::Delete { .. } | Operation::Replace { .. }
        )
    }

    /// Increment and the string edits modify a value without replacing it.
    pub fn is_in_place(&self) -> bool {
        !self.is_destructive()
    }

    pub fn is_string_edit(&self) -> bool {
        matches!(
            self,
            Operation::StringInsert { .. } | Operation::StringRemove { .. }
        )
    }
}

/// Apply one operation to `tree` in place.
///
/// On error the tree is left exactly as it was.
///
/// # Examples
/// ```
/// # use lunadb_core::operations::{apply_operation, Operation};
/// # use serde_json::json;
/// let mut doc = json!({"arr": ["b"]});
/// apply_operation(&Operation::insert("/arr/0", json!("a")), &mut doc).unwrap();
/// assert_eq!(doc, json!({"arr": ["a", "b"]}));
/// ```
pub fn apply_operation(operation: &Operation, tree: &mut Value) -> ApplyResult {
    let pointer = operation.pointer();
    let tokens = parse_pointer(pointer)?;

    if tokens.is_empty() {
        if operation.is_destructive() {
            return Err(ApplyError::RootRewriteDisallowed);
        }
        return update_in_place(operation, tree);
    }

    let slot = resolve_mut(tree, &tokens)?;
    match operation {
        Operation::Insert { content, .. } => {
            match slot {
                SlotMut::Element { items, index } => items.insert(index, content.clone()),
                SlotMut::Property { map, key } => {
                    map.insert(key, content.clone());
                }
            }
            Ok(())
        }
        Operation::Delete { .. } => match slot {
            SlotMut::Element { items, index } => {
                if index >= items.len() {
                    return Err(out_of_range(pointer, index, items.len()));
                }
                items.remove(index);
                Ok(())
            }
            SlotMut::Property { map, key } => match map.remove(&key) {
                Some(_) => Ok(()),
                None => Err(ApplyError::TargetMissing(pointer.to_string())),
            },
        },
        Operation::Replace { content, .. } => {
            *existing_target(slot, pointer)? = content.clone();
            Ok(())
        }
        Operation::Increment { .. }
        | Operation::StringInsert { .. }
        | Operation::StringRemove { .. } => update_in_place(operation, existing_target(slot, pointer)?),
    }
}

fn existing_target<'a>(slot: SlotMut<'a>, pointer: &str) -> ApplyResult<&'a mut Value> {
    match slot {
        SlotMut::Element { items, index } => {
            let len = items.len();
            items
                .get_mut(index)
                .ok_or_else(|| out_of_range(pointer, index, len))
        }
        SlotMut::Property { map, key } => map
            .get_mut(&key)
            .ok_or_else(|| ApplyError::TargetMissing(pointer.to_string())),
    }
}

fn update_in_place(operation: &Operation, target: &mut Value) -> ApplyResult {
    let pointer = operation.pointer();
    match operation {
        Operation::Increment { diff, .. } => {
            let Value::Number(current) = target else {
                return Err(mismatch(pointer, "number"));
            };
            let sum = add_numbers(current, diff).ok_or_else(|| mismatch(pointer, "finite number"))?;
            *target = Value::Number(sum);
            Ok(())
        }
        Operation::StringInsert { idx, content, .. } => {
            let Value::String(text) = target else {
                return Err(mismatch(pointer, "string"));
            };
            let at = byte_offset(text, *idx).ok_or_else(|| out_of_range(pointer, *idx, text.chars().count()))?;
            text.insert_str(at, content);
            Ok(())
        }
        Operation::StringRemove { idx, len, .. } => {
            let Value::String(text) = target else {
                return Err(mismatch(pointer, "string"));
            };
            let start = byte_offset(text, *idx).ok_or_else(|| out_of_range(pointer, *idx, text.chars().count()))?;
            // Removing past the end is clamped
            let end = byte_offset(text, idx.saturating_add(*len)).unwrap_or(text.len());
            text.replace_range(start..end, "");
            Ok(())
        }
        Operation::Insert { .. } | Operation::Delete { .. } | Operation::Replace { .. } => {
            Err(ApplyError::RootRewriteDisallowed)
        }
    }
}

/// Byte position of the `chars`-th character; `None` when past the end.
fn byte_offset(text: &str, chars: usize) -> Option<usize> {
    text.char_indices()
        .map(|(at, _)| at)
        .chain(std::iter::once(text.len()))
        .nth(chars)
}

/// Integer sums stay integral while they fit; anything else is summed as `f64`.
fn add_numbers(current: &Number, diff: &Number) -> Option<Number> {
    if let (Some(a), Some(b)) = (current.as_i64(), diff.as_i64()) {
        if let Some(sum) = a.checked_add(b) {
            return Some(sum.into());
        }
    }
    if let (Some(a), Some(b)) = (current.as_u64(), diff.as_u64()) {
        if let Some(sum) = a.checked_add(b) {
            return Some(sum.into());
        }
    }
    Number::from_f64(current.as_f64()? + diff.as_f64()?)
}

fn out_of_range(pointer: &str, index: usize, len: usize) -> ApplyError {
    ApplyError::IndexOutOfRange {
        pointer: pointer.to_string(),
        index,
        len,
    }
}

fn mismatch(pointer: &str, expected: &'static str) -> ApplyError {
    ApplyError::TypeMismatch {
        pointer: pointer.to_string(),
        expected,
    }
}
