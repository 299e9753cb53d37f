//! REST API client module for the PocketBase backend.
//!
//! This module provides the `ApiClient` for listing and creating records,
//! authenticating users, and building file URLs, plus the `RecordSource`
//! seam that the settings cache reads through.
//!
//! Authenticated requests carry the auth token in the `Authorization`
//! header, as the backend expects it (no `Bearer` prefix).

pub mod client;
pub mod error;

pub use client::{ApiClient, AuthResponse, RecordSource};
pub use error::ApiError;
