pub mod delta;
pub mod errors;
pub mod models;
pub mod operations;
pub mod pointer;
pub mod protocol;
pub mod rebase;

pub use delta::*;
pub use errors::*;
pub use models::*;
pub use operations::*;
pub use pointer::{compile_pointer, parse_pointer, resolve, resolve_mut, Slot, SlotMut};
pub use protocol::*;
pub use rebase::*;

pub type ApplyResult<T = ()> = Result<T, ApplyError>;
