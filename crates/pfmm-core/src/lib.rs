//! Core library for the pfmm site.
//!
//! Provides the PocketBase API client, authentication and session state,
//! the cached site-settings loader, and the viewport notifier used to
//! trigger view animations.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;
pub mod viewport;

pub use api::{ApiClient, ApiError, RecordSource};
pub use auth::{AuthOutcome, AuthService, Session, SessionData};
pub use cache::{SettingsError, SiteSettingsCache};
pub use config::Config;
pub use models::{Role, SiteSettings, SiteSettingsRecord, User};
pub use viewport::{
    CrossingRecord, Element, ObserverOptions, Threshold, ViewportNotifier,
    ViewportSignal, ViewportTarget,
};
