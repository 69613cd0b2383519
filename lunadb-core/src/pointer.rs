//! Pointer parsing and resolution against JSON document trees
//!
//! Pointers are `/`-separated token paths in the RFC 6901 style. A literal `~`
//! inside a token is written `~0` and a literal `/` is written `~1`. The empty
//! pointer addresses the document root.

use crate::errors::{ApplyError, PointerError};
use serde_json::{Map, Value};

/// Parse a pointer string into unescaped tokens
///
/// # Examples
/// ```
/// # use lunadb_core::pointer::parse_pointer;
/// assert_eq!(parse_pointer("/foo/0").unwrap(), vec!["foo", "0"]);
/// assert!(parse_pointer("").unwrap().is_empty());
/// assert!(parse_pointer("foo").is_err());
/// ```
pub fn parse_pointer(pointer: &str) -> Result<Vec<String>, PointerError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }

    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(PointerError::Malformed(pointer.to_string()));
    };

    Ok(rest.split('/').map(unescape_token).collect())
}

/// Compile tokens back into a pointer string
///
/// # Examples
/// ```
/// # use lunadb_core::pointer::compile_pointer;
/// assert_eq!(compile_pointer(&["a/b", "~k"]), "/a~1b/~0k");
/// assert_eq!(compile_pointer::<&str>(&[]), "");
/// ```
pub fn compile_pointer<S: AsRef<str>>(tokens: &[S]) -> String {
    let mut pointer = String::new();
    for token in tokens {
        pointer.push('/');
        pointer.push_str(&escape_token(token.as_ref()));
    }
    pointer
}

/// Decode one token. `~1` goes first so that `~01` decodes to `~1`, not `/`.
pub fn unescape_token(token: &str) -> String {
    if !token.contains('~') {
        return token.to_string();
    }
    token.replace("~1", "/").replace("~0", "~")
}

/// Encode one token. `~` goes first so the `~` of a fresh `~1` is not re-escaped.
pub fn escape_token(token: &str) -> String {
    if !token.contains('~') && !token.contains('/') {
        return token.to_string();
    }
    token.replace('~', "~0").replace('/', "~1")
}

/// Parse an array token. Only plain base-10 digits are accepted.
pub fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// True when `pointer` addresses a node strictly below `ancestor`.
///
/// # Examples
/// ```
/// # use lunadb_core::pointer::is_descendant;
/// assert!(is_descendant("/a/b", "/a"));
/// assert!(!is_descendant("/a", "/a"));
/// assert!(!is_descendant("/ab", "/a"));
/// ```
pub fn is_descendant(pointer: &str, ancestor: &str) -> bool {
    pointer.len() > ancestor.len()
        && pointer.starts_with(ancestor)
        && pointer.as_bytes()[ancestor.len()] == b'/'
}

/// A resolved leaf slot: the parent container plus the candidate key inside it.
///
/// The slot itself may be empty. For arrays `index` may equal the length
/// (the append position).
#[derive(Debug)]
pub enum Slot<'a> {
    Element { items: &'a [Value], index: usize },
    Property { map: &'a Map<String, Value>, key: String },
}

/// Mutable counterpart of [`Slot`].
#[derive(Debug)]
pub enum SlotMut<'a> {
    Element {
        items: &'a mut Vec<Value>,
        index: usize,
    },
    Property {
        map: &'a mut Map<String, Value>,
        key: String,
    },
}

/// Where a token points inside one container.
enum Step {
    Index(usize),
    Key(String),
}

/// Resolve all tokens except the last to an existing container, and the last
/// token to a candidate slot in it.
pub fn resolve<'a>(tree: &'a Value, tokens: &[String]) -> Result<Slot<'a>, ApplyError> {
    let Some((last, path)) = tokens.split_last() else {
        return Err(root_has_no_parent());
    };

    let mut node = tree;
    for (depth, token) in path.iter().enumerate() {
        let step = existing_child(node, token, &tokens[..=depth])?;
        node = match step {
            Step::Index(index) => node.get(index),
            Step::Key(key) => node.get(key.as_str()),
        }
        .ok_or_else(|| not_found(&tokens[..=depth]))?;
    }

    match (node, leaf_step(node, last, tokens)?) {
        (Value::Array(items), Step::Index(index)) => Ok(Slot::Element { items, index }),
        (Value::Object(map), Step::Key(key)) => Ok(Slot::Property { map, key }),
        _ => Err(not_found(tokens)),
    }
}

/// Same walk as [`resolve`], yielding a mutable slot.
pub fn resolve_mut<'a>(tree: &'a mut Value, tokens: &[String]) -> Result<SlotMut<'a>, ApplyError> {
    let Some((last, path)) = tokens.split_last() else {
        return Err(root_has_no_parent());
    };

    let mut node = tree;
    for (depth, token) in path.iter().enumerate() {
        let step = existing_child(node, token, &tokens[..=depth])?;
        node = match step {
            Step::Index(index) => node.get_mut(index),
            Step::Key(key) => node.get_mut(key.as_str()),
        }
        .ok_or_else(|| not_found(&tokens[..=depth]))?;
    }

    let step = leaf_step(node, last, tokens)?;
    match (node, step) {
        (Value::Array(items), Step::Index(index)) => Ok(SlotMut::Element { items, index }),
        (Value::Object(map), Step::Key(key)) => Ok(SlotMut::Property { map, key }),
        _ => Err(not_found(tokens)),
    }
}

/// Intermediate tokens must name something that exists.
fn existing_child(node: &Value, token: &str, prefix: &[String]) -> Result<Step, ApplyError> {
    match node {
        Value::Array(items) => {
            let index = parse_index(token).ok_or_else(|| not_found(prefix))?;
            if index >= items.len() {
                return Err(ApplyError::IndexOutOfRange {
                    pointer: compile_pointer(prefix),
                    index,
                    len: items.len(),
                });
            }
            Ok(Step::Index(index))
        }
        Value::Object(map) if map.contains_key(token) => Ok(Step::Key(token.to_string())),
        _ => Err(not_found(prefix)),
    }
}

/// The last token is only checked for shape; arrays accept `0..=len`.
fn leaf_step(node: &Value, token: &str, tokens: &[String]) -> Result<Step, ApplyError> {
    match node {
        Value::Array(items) => {
            let index = parse_index(token).ok_or_else(|| not_found(tokens))?;
            if index > items.len() {
                return Err(ApplyError::IndexOutOfRange {
                    pointer: compile_pointer(tokens),
                    index,
                    len: items.len(),
                });
            }
            Ok(Step::Index(index))
        }
        Value::Object(_) => Ok(Step::Key(token.to_string())),
        _ => Err(not_found(tokens)),
    }
}

fn not_found(tokens: &[String]) -> ApplyError {
    ApplyError::PathNotFound {
        pointer: compile_pointer(tokens),
    }
}

fn root_has_no_parent() -> ApplyError {
    ApplyError::PathNotFound {
        pointer: String::new(),
    }
}
