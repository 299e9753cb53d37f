//! API client for communicating with the PocketBase REST API.
//!
//! This module provides the `ApiClient` struct for listing and creating
//! records, password authentication, and file URL construction.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::models::User;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Records requested per page when walking a full list.
/// Matches the batch size the backend's own SDK uses for full-list reads.
const FULL_LIST_BATCH_SIZE: usize = 500;

/// Collection holding user accounts
pub const USERS_COLLECTION: &str = "users";

/// One page of a record list: `GET /api/collections/{c}/records`
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    items: Vec<Value>,
}

/// Response of `auth-with-password`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub record: User,
}

#[derive(Debug, Serialize)]
struct PasswordAuthRequest<'a> {
    identity: &'a str,
    password: &'a str,
}

/// Read access to record collections.
///
/// `ApiClient` is the production implementation; the settings cache only
/// depends on this trait. An empty `Ok` and an `Err` are distinct outcomes.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Every record in `collection`, ordered by `sort` (e.g. `-created`).
    async fn list_records(&self, collection: &str, sort: &str) -> Result<Vec<Value>, ApiError>;
}

/// API client for the PocketBase backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for the backend at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a client from the resolved configuration
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(
            &config.base_url(),
            Duration::from_secs(config.request_timeout_secs()),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set the auth token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(token)
                .map_err(|e| ApiError::InvalidResponse(format!("Invalid auth token: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn records_url(&self, collection: &str) -> String {
        format!("{}/api/collections/{}/records", self.base_url, collection)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Read the body and decode it, reporting malformed JSON as an invalid response.
    async fn parse<T: DeserializeOwned>(response: reqwest::Response, url: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T, ApiError> {
        let response = self
            .client
            .get(url)
            .headers(self.auth_headers()?)
            .query(query)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::parse(response, url).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<T, ApiError> {
        let response = self
            .client
            .post(url)
            .headers(self.auth_headers()?)
            .json(body)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::parse(response, url).await
    }

    // ===== Records =====

    /// Fetch every record of a collection, walking pages until a short one.
    pub async fn get_full_list(&self, collection: &str, sort: &str) -> Result<Vec<Value>, ApiError> {
        let url = self.records_url(collection);
        let mut records = Vec::new();
        let mut page = 1usize;

        loop {
            let mut query = vec![
                ("page", page.to_string()),
                ("perPage", FULL_LIST_BATCH_SIZE.to_string()),
                ("skipTotal", "1".to_string()),
            ];
            if !sort.is_empty() {
                query.push(("sort", sort.to_string()));
            }

            let list: ListResponse = self.get(&url, &query).await?;
            let count = list.items.len();
            records.extend(list.items);
            debug!(collection = collection, page = page, count = count, "Fetched record page");

            if count < FULL_LIST_BATCH_SIZE {
                break;
            }
            page += 1;
        }

        Ok(records)
    }

    /// Create a record in `collection`, returning the stored record
    pub async fn create_record<B: Serialize + ?Sized>(&self, collection: &str, body: &B) -> Result<Value, ApiError> {
        let url = self.records_url(collection);
        self.post(&url, body).await
    }

    // ===== Auth =====

    /// Authenticate an auth-collection record with identity (email or username) and password
    pub async fn auth_with_password(
        &self,
        collection: &str,
        identity: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let url = format!(
            "{}/api/collections/{}/auth-with-password",
            self.base_url, collection
        );
        self.post(&url, &PasswordAuthRequest { identity, password })
            .await
    }

    // ===== Files =====

    /// Absolute URL of a file stored on a record.
    /// Returns an empty string when the record id or filename is missing.
    pub fn file_url(&self, collection: &str, record_id: &str, filename: &str) -> String {
        if record_id.is_empty() || filename.is_empty() {
            return String::new();
        }
        format!(
            "{}/api/files/{}/{}/{}",
            self.base_url, collection, record_id, filename
        )
    }
}

#[async_trait]
impl RecordSource for ApiClient {
    async fn list_records(&self, collection: &str, sort: &str) -> Result<Vec<Value>, ApiError> {
        self.get_full_list(collection, sort).await
    }
}
