//! Authentication module for user sessions.
//!
//! This module provides:
//! - `Session`: the auth store (token + user record), persisted to disk
//! - `AuthService`: login, registration and logout against the `users`
//!   collection, with current-user change notifications
//!
//! Tokens are treated as expired 14 days after login, matching the
//! backend's default auth token duration.

pub mod service;
pub mod session;

pub use service::{AuthOutcome, AuthService};
pub use session::{Session, SessionData};
