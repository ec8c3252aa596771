//! Async client for the ChefBot backend.
//!
//! - [`engine`]: retrying HTTP engine with fallback base URL
//! - [`session`]: token lifecycle (login, refresh, logout)
//! - [`device`]: per-install device identity
//! - [`storage`]: persistence backends for session state
//! - [`client`]: [`ChefBotClient`] facade over all of the above

pub mod client;
pub mod config;
pub mod device;
pub mod engine;
pub mod error;
pub mod session;
pub mod storage;

pub use client::ChefBotClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use session::{Session, SessionManager, SessionState};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
