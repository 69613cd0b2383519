use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PointerError {
    #[error("Malformed pointer (must be empty or start with /): {0}")]
    Malformed(String),
}

/// Reasons an operation could not be applied to a document tree.
///
/// A failed apply never leaves the tree partially modified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    #[error(transparent)]
    MalformedPointer(#[from] PointerError),

    #[error("Path not found: {pointer}")]
    PathNotFound { pointer: String },

    #[error("Index {index} out of range for length {len} at {pointer}")]
    IndexOutOfRange {
        pointer: String,
        index: usize,
        len: usize,
    },

    #[error("Target does not exist: {0}")]
    TargetMissing(String),

    #[error("Type mismatch at {pointer}: expected {expected}")]
    TypeMismatch {
        pointer: String,
        expected: &'static str,
    },

    #[error("Insert, delete and replace may not target the document root")]
    RootRewriteDisallowed,
}
