use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::api::client::USERS_COLLECTION;
use crate::api::{ApiClient, ApiError};
use crate::models::{Role, User};

use super::{Session, SessionData};

/// Result of a login or registration attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Success { user: User },
    Failure { error: String },
}

impl AuthOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success { .. })
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            AuthOutcome::Success { user } => Some(user),
            AuthOutcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            AuthOutcome::Success { .. } => None,
            AuthOutcome::Failure { error } => Some(error),
        }
    }

    fn failure(err: &ApiError, fallback: &str) -> Self {
        let message = err.to_string();
        AuthOutcome::Failure {
            error: if message.is_empty() {
                fallback.to_string()
            } else {
                message
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewUser<'a> {
    email: &'a str,
    password: &'a str,
    password_confirm: &'a str,
    username: &'a str,
    role: Role,
    verified: bool,
}

/// Login, registration and session state for the `users` collection.
///
/// Owns the API client's auth token: every auth change updates the client,
/// the persisted session, and the current-user channel together.
pub struct AuthService {
    client: ApiClient,
    session: Session,
    current_user: watch::Sender<Option<User>>,
}

impl AuthService {
    /// Wrap a client and a (possibly already loaded) session
    pub fn new(mut client: ApiClient, session: Session) -> Self {
        if session.is_valid() {
            if let Some(token) = session.token() {
                client.set_token(token.to_string());
            }
        }
        let (current_user, _) = watch::channel(session.user().cloned());
        Self {
            client,
            session,
            current_user,
        }
    }

    /// Client carrying the current auth token
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub async fn login(&mut self, email: &str, password: &str) -> AuthOutcome {
        match self
            .client
            .auth_with_password(USERS_COLLECTION, email, password)
            .await
        {
            Ok(auth) => {
                info!(user_id = %auth.record.id, "Logged in");
                let user = auth.record.clone();
                self.set_session(SessionData::new(auth.token, auth.record));
                AuthOutcome::Success { user }
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                AuthOutcome::failure(&e, "Login failed")
            }
        }
    }

    /// Create an unverified account, then log in with it.
    ///
    /// The outcome reflects account creation only; a failed follow-up login
    /// is logged and leaves the service logged out.
    pub async fn register(
        &mut self,
        email: &str,
        password: &str,
        password_confirm: &str,
        username: &str,
        role: Role,
    ) -> AuthOutcome {
        let body = NewUser {
            email,
            password,
            password_confirm,
            username,
            role,
            verified: false,
        };

        let user = match self.create_user(&body).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Registration failed");
                return AuthOutcome::failure(&e, "Registration failed");
            }
        };
        info!(user_id = %user.id, "Registered user");

        if let AuthOutcome::Failure { error } = self.login(email, password).await {
            warn!(error = %error, "Login after registration failed");
        }

        AuthOutcome::Success { user }
    }

    async fn create_user(&self, body: &NewUser<'_>) -> Result<User, ApiError> {
        let record = self.client.create_record(USERS_COLLECTION, body).await?;
        serde_json::from_value(record)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse user record: {}", e)))
    }

    pub fn logout(&mut self) {
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to remove persisted session");
        }
        self.client.clear_token();
        self.current_user.send_replace(None);
        info!("Logged out");
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_valid()
    }

    pub fn is_admin(&self) -> bool {
        self.current_user().is_some_and(User::is_admin)
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.user()
    }

    /// Watch the current user; updated on login, registration and logout.
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.current_user.subscribe()
    }

    fn set_session(&mut self, data: SessionData) {
        self.client.set_token(data.token.clone());
        self.current_user.send_replace(Some(data.user.clone()));
        self.session.update(data);
        if let Err(e) = self.session.save() {
            warn!(error = %e, "Failed to persist session");
        }
    }
}
