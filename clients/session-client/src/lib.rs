//! Device-side session client.
//!
//! Holds the current access/refresh pair, coalesces concurrent refresh
//! attempts into a single network rotation, and wraps outbound API
//! calls with attach-bearer and one refresh-and-retry on rejection.

#![forbid(unsafe_code)]

pub mod cache;
pub mod claims;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod gateway;

pub use cache::{CachedSession, MemoryTokenStore, TokenStore, UserSnapshot};
pub use config::ClientConfig;
pub use coordinator::{RefreshCoordinator, TokenPair};
pub use error::ClientError;
pub use gateway::RequestGateway;
