//! Authentication module for the auction server
//!
//! Credential storage, access/refresh token issuance and validation,
//! and login rate limiting.

pub mod handlers;
mod rate_limit;
mod service;
mod tokens;

pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use service::{AuthService, TokenPair};
pub use tokens::{Claims, TokenIssuer};
