pub mod bridge;
pub mod client;
pub mod config;
pub mod errors;
pub mod session;

pub use bridge::DocumentBridge;
pub use client::{Client, SyncOutcome};
pub use config::ClientConfig;
pub use errors::{ClientError, ClientResult};
pub use session::Session;
