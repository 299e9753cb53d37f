//! In-process caching of site-wide configuration.
//!
//! This module provides the `SiteSettingsCache`, a single-slot cache of the
//! `site_settings` record. It is fetched lazily on first load, served from
//! memory afterwards, and refetched after `invalidate()` or on `reload()`.
//! Failed fetches fall back to the built-in defaults without touching the
//! cached value.

pub mod settings;

pub use settings::{SettingsError, SiteSettingsCache, SETTINGS_COLLECTION};
