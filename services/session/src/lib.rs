//! Session service library.
//!
//! Issues paired short-lived access tokens and long-lived rotating
//! refresh tokens, rotates refresh tokens on use, and revokes entire
//! token families when reuse of a superseded token suggests theft.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod http;
pub mod jwt;
pub mod refresh;
pub mod store;

// Re-exports for convenience
pub use config::Config;
pub use error::SessionError;
