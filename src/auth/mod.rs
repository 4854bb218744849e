//! Authentication module for monitoring instances
//!
//! Session tokens are obtained by exchanging the configured credentials with
//! each instance and are cached per instance for the life of the process.

pub mod authenticator;
pub mod token_cache;

pub use authenticator::Authenticator;
pub use token_cache::{CachedToken, TokenSlot};
