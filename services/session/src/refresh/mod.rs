//! Refresh-token lifecycle: issuance, rotation, reuse detection.

pub mod generator;
pub mod issuer;
pub mod record;
pub mod rotator;

pub use issuer::{SessionIssuer, TokenPair};
pub use record::{RefreshTokenRecord, TokenState};
pub use rotator::RotationEngine;
