//! Database module for the auction server
//!
//! Connection pooling and data access for user and
//! refresh-token records.

pub mod models;
pub mod operations;

pub use models::{RefreshToken, User, UserRole};
pub use operations::DbOperations;
