use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::User;

/// Session file name in cache directory
const SESSION_FILE: &str = "auth.json";

/// Token expiry time in days.
/// The backend issues record auth tokens valid for 14 days by default.
const TOKEN_EXPIRY_DAYS: i64 = 14;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub user: User,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(token: String, user: User) -> Self {
        Self {
            token,
            user,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        let expiry = self.created_at + Duration::days(TOKEN_EXPIRY_DAYS);
        Utc::now() > expiry
    }

    pub fn time_until_expiry(&self) -> Duration {
        let expiry = self.created_at + Duration::days(TOKEN_EXPIRY_DAYS);
        expiry - Utc::now()
    }
}

/// The auth store: the current token and user record.
pub struct Session {
    cache_dir: PathBuf,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            data: None,
        }
    }

    /// Load session from disk. Expired sessions are ignored.
    pub fn load(&mut self) -> Result<bool> {
        let path = self.session_path();
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .context("Failed to read session file")?;
            let data: SessionData = serde_json::from_str(&contents)
                .context("Failed to parse session file")?;

            if !data.is_expired() {
                self.data = Some(data);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Save session to disk
    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let path = self.session_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(path, contents)?;
        }
        Ok(())
    }

    /// Clear session data
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Update session with new data
    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    /// Get the auth token if a session exists
    pub fn token(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.token.as_str())
    }

    pub fn user(&self) -> Option<&User> {
        self.data.as_ref().map(|d| &d.user)
    }

    /// Check if session is valid (exists, has a token, and not expired)
    pub fn is_valid(&self) -> bool {
        self.data
            .as_ref()
            .map(|d| !d.token.is_empty() && !d.is_expired())
            .unwrap_or(false)
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn user() -> User {
        User {
            id: "u1".to_string(),
            username: "cantor".to_string(),
            email: "cantor@pfmm.com".to_string(),
            role: Role::User,
            avatar: None,
            verified: true,
            created: String::new(),
            updated: String::new(),
        }
    }

    #[test]
    fn test_session_expiry() {
        let fresh = SessionData::new("tok".to_string(), user());
        assert!(!fresh.is_expired());
        assert!(fresh.time_until_expiry() > Duration::days(13));

        let mut old = SessionData::new("tok".to_string(), user());
        old.created_at = Utc::now() - Duration::days(TOKEN_EXPIRY_DAYS + 1);
        assert!(old.is_expired());
    }

    #[test]
    fn test_session_persistence_round_trip() {
        let dir = tempfile::tempdir().expect("temp dir");

        let mut session = Session::new(dir.path().to_path_buf());
        assert!(!session.is_valid());
        session.update(SessionData::new("tok".to_string(), user()));
        session.save().expect("save");

        let mut restored = Session::new(dir.path().to_path_buf());
        assert!(restored.load().expect("load"));
        assert!(restored.is_valid());
        assert_eq!(restored.token(), Some("tok"));
        assert_eq!(restored.user().map(|u| u.id.as_str()), Some("u1"));

        restored.clear().expect("clear");
        assert!(!restored.is_valid());
        assert!(!Session::new(dir.path().to_path_buf()).load().expect("load"));
    }

    #[test]
    fn test_expired_session_not_loaded() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut data = SessionData::new("tok".to_string(), user());
        data.created_at = Utc::now() - Duration::days(TOKEN_EXPIRY_DAYS + 1);

        let mut session = Session::new(dir.path().to_path_buf());
        session.update(data);
        session.save().expect("save");

        let mut restored = Session::new(dir.path().to_path_buf());
        assert!(!restored.load().expect("load"));
        assert!(restored.data.is_none());
    }
}
