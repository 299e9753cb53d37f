use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::api::RecordSource;
use crate::models::{SiteSettings, SiteSettingsRecord};

/// Collection holding the site settings record
pub const SETTINGS_COLLECTION: &str = "site_settings";

/// Newest record first; only the first one is used.
const NEWEST_FIRST: &str = "-created";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to fetch site settings: {0}")]
    FetchFailed(String),
}

#[derive(Debug, Default)]
struct CacheState {
    loaded: bool,
}

/// Single-slot cache of the site settings.
///
/// Owned by the application's composition root and shared by `Arc`.
/// The held value starts as `SiteSettings::default()` and is only ever
/// replaced by a successfully fetched record.
pub struct SiteSettingsCache {
    source: Arc<dyn RecordSource>,
    /// Guards the loaded flag; held across the fetch so concurrent cold
    /// loads share one remote read.
    state: Mutex<CacheState>,
    held: watch::Sender<SiteSettings>,
}

impl SiteSettingsCache {
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        let (held, _) = watch::channel(SiteSettings::default());
        Self {
            source,
            state: Mutex::new(CacheState::default()),
            held,
        }
    }

    /// Return the cached settings, fetching them first if the cache is stale
    /// or `force_reload` is set.
    ///
    /// Never fails: an empty or failed fetch returns the defaults for this call
    /// and leaves the cached value and loaded flag as they were.
    pub async fn load(&self, force_reload: bool) -> SiteSettings {
        let mut state = self.state.lock().await;
        if state.loaded && !force_reload {
            debug!("Serving site settings from cache");
            return self.held.borrow().clone();
        }

        match self.fetch().await {
            Ok(Some(settings)) => {
                self.held.send_replace(settings.clone());
                state.loaded = true;
                info!(id = ?settings.id, site_name = %settings.site_name, "Loaded site settings");
                settings
            }
            Ok(None) => {
                warn!(collection = SETTINGS_COLLECTION, "No site settings record found, using defaults");
                SiteSettings::default()
            }
            Err(e) => {
                warn!(error = %e, "Error loading site settings, using defaults");
                SiteSettings::default()
            }
        }
    }

    /// Refetch regardless of freshness
    pub async fn reload(&self) -> SiteSettings {
        self.load(true).await
    }

    /// Mark the cache stale so the next load refetches.
    /// The last loaded value stays visible until then.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        state.loaded = false;
        debug!("Site settings cache invalidated");
    }

    /// Whether a successful fetch has populated the cache since the last invalidation
    pub async fn is_loaded(&self) -> bool {
        self.state.lock().await.loaded
    }

    /// The currently held value, without any I/O
    pub fn current(&self) -> SiteSettings {
        self.held.borrow().clone()
    }

    /// Watch the held value; receivers are notified on every successful load.
    pub fn subscribe(&self) -> watch::Receiver<SiteSettings> {
        self.held.subscribe()
    }

    async fn fetch(&self) -> Result<Option<SiteSettings>, SettingsError> {
        let records = self
            .source
            .list_records(SETTINGS_COLLECTION, NEWEST_FIRST)
            .await
            .map_err(|e| SettingsError::FetchFailed(e.to_string()))?;

        let Some(newest) = records.into_iter().next() else {
            return Ok(None);
        };

        let record: SiteSettingsRecord = serde_json::from_value(newest)
            .map_err(|e| SettingsError::FetchFailed(format!("Malformed settings record: {}", e)))?;

        Ok(Some(record.to_settings()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use crate::api::ApiError;

    /// Record source that replays scripted responses and counts calls.
    /// Once the script runs out it keeps answering with an empty list.
    #[derive(Default)]
    struct ScriptedSource {
        responses: std::sync::Mutex<VecDeque<Result<Vec<Value>, ApiError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<Vec<Value>, ApiError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: std::sync::Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RecordSource for ScriptedSource {
        async fn list_records(&self, collection: &str, sort: &str) -> Result<Vec<Value>, ApiError> {
            assert_eq!(collection, SETTINGS_COLLECTION);
            assert_eq!(sort, "-created");
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Suspend like a real request would
            tokio::task::yield_now().await;
            let next = self.responses.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn record(site_name: &str) -> Value {
        json!({
            "id": "rec1",
            "site_name": site_name,
            "site_url": "https://pfmm.org",
            "site_description": "",
            "logo_url": "",
            "og_image_url": "",
            "twitter_handle": "@pfmm",
            "facebook_url": "",
            "contact_email": "a@b.com",
            "created": "2024-05-01 08:00:00.000Z"
        })
    }

    fn failure() -> Result<Vec<Value>, ApiError> {
        Err(ApiError::ServerError("boom".to_string()))
    }

    #[tokio::test]
    async fn test_cache_hit_skips_remote_read() {
        let source = ScriptedSource::new(vec![Ok(vec![record("PFMM")])]);
        let cache = SiteSettingsCache::new(source.clone());

        let first = cache.load(false).await;
        let second = cache.load(false).await;

        assert_eq!(first, second);
        assert_eq!(first.site_name, "PFMM");
        assert_eq!(source.calls(), 1);
        assert!(cache.is_loaded().await);
    }

    #[tokio::test]
    async fn test_invalidate_forces_one_refetch() {
        let source = ScriptedSource::new(vec![
            Ok(vec![record("First")]),
            Ok(vec![record("Second")]),
        ]);
        let cache = SiteSettingsCache::new(source.clone());

        cache.load(false).await;
        cache.invalidate().await;
        assert!(!cache.is_loaded().await);
        // Last known value survives invalidation
        assert_eq!(cache.current().site_name, "First");

        let reloaded = cache.load(false).await;
        assert_eq!(reloaded.site_name, "Second");
        assert_eq!(source.calls(), 2);

        cache.load(false).await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_cached_value() {
        let source = ScriptedSource::new(vec![Ok(vec![record("Cached")]), failure()]);
        let cache = SiteSettingsCache::new(source.clone());

        let before = cache.load(false).await;
        let returned = cache.load(true).await;

        assert_eq!(returned, SiteSettings::default());
        assert_eq!(cache.current(), before);
        assert!(cache.is_loaded().await);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_cold_load_stays_stale() {
        let source = ScriptedSource::new(vec![failure(), Ok(vec![record("Later")])]);
        let cache = SiteSettingsCache::new(source.clone());

        assert_eq!(cache.load(false).await, SiteSettings::default());
        assert!(!cache.is_loaded().await);

        assert_eq!(cache.load(false).await.site_name, "Later");
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_merge_precedence() {
        let source = ScriptedSource::new(vec![Ok(vec![record("")])]);
        let cache = SiteSettingsCache::new(source);

        let settings = cache.load(false).await;
        let defaults = SiteSettings::default();
        assert_eq!(settings.site_name, defaults.site_name);
        assert_eq!(settings.site_description, defaults.site_description);
        assert_eq!(settings.site_url, "https://pfmm.org");
        assert_eq!(settings.contact_email.as_deref(), Some("a@b.com"));
        assert_eq!(settings.facebook_url, None);
        assert_eq!(settings.id.as_deref(), Some("rec1"));
    }

    #[tokio::test]
    async fn test_newest_record_wins() {
        let source = ScriptedSource::new(vec![Ok(vec![record("Newest"), record("Older")])]);
        let cache = SiteSettingsCache::new(source);
        assert_eq!(cache.load(false).await.site_name, "Newest");
    }

    #[tokio::test]
    async fn test_empty_result_behaves_like_failure() {
        let source = ScriptedSource::new(vec![Ok(Vec::new())]);
        let cache = SiteSettingsCache::new(source.clone());

        assert_eq!(cache.load(false).await, SiteSettings::default());
        assert!(!cache.is_loaded().await);

        // Still stale, so the next load reads again
        cache.load(false).await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_malformed_record_is_fetch_failure() {
        let source = ScriptedSource::new(vec![Ok(vec![json!({ "site_name": 7 })])]);
        let cache = SiteSettingsCache::new(source);

        assert_eq!(cache.load(false).await, SiteSettings::default());
        assert!(!cache.is_loaded().await);
    }

    #[tokio::test]
    async fn test_reload_always_fetches() {
        let source = ScriptedSource::new(vec![Ok(vec![record("A")]), Ok(vec![record("B")])]);
        let cache = SiteSettingsCache::new(source.clone());

        cache.load(false).await;
        assert_eq!(cache.reload().await.site_name, "B");
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_cold_loads_share_one_read() {
        let source = ScriptedSource::new(vec![Ok(vec![record("Shared")])]);
        let cache = SiteSettingsCache::new(source.clone());

        let (a, b) = futures::join!(cache.load(false), cache.load(false));

        assert_eq!(a.site_name, "Shared");
        assert_eq!(a, b);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_successful_loads_only() {
        let source = ScriptedSource::new(vec![failure(), Ok(vec![record("Seen")])]);
        let cache = SiteSettingsCache::new(source);
        let mut rx = cache.subscribe();

        cache.load(false).await;
        assert!(!rx.has_changed().expect("sender alive"));

        cache.load(false).await;
        assert!(rx.has_changed().expect("sender alive"));
        assert_eq!(rx.borrow_and_update().site_name, "Seen");
    }
}
