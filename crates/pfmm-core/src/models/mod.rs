//! Data models for site entities.
//!
//! - `SiteSettings`, `SiteSettingsRecord`: site-wide configuration and its raw
//!   backend record
//! - `User`, `Role`: accounts in the `users` auth collection

pub mod settings;
pub mod user;

pub use settings::{SiteSettings, SiteSettingsRecord, DEFAULT_TWITTER_HANDLE};
pub use user::{Role, User};
