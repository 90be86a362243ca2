//! Login state persisted alongside the catalog: tokens, a logged-in flag,
//! and the user's profile fields, one plain string per key.

use craftshop_api::{ApiClient, ApiError, AuthResponse, Credentials, SignupRequest, UserProfile};
use craftshop_core::collections::session as keys;
use craftshop_store::Storage;

use crate::error::CatalogError;

/// The signed-in user as remembered locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub email: String,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub user_id: Option<i64>,
    pub date_joined: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Session {
    api: ApiClient,
    storage: Storage,
}

impl Session {
    #[must_use]
    pub fn new(api: ApiClient, storage: Storage) -> Self {
        Self { api, storage }
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::Unauthorized`] for rejected credentials,
    /// [`CatalogError::Api`] for other API failures, or
    /// [`CatalogError::Storage`] if the session cannot be persisted.
    pub async fn login(&self, credentials: &Credentials) -> Result<SessionUser, CatalogError> {
        let auth = self.api.login(credentials).await.map_err(auth_error)?;
        self.store(&auth)?;
        tracing::info!(email = %auth.user.email, "logged in");
        self.user().ok_or_else(|| CatalogError::Invalid("login response had no user".to_string()))
    }

    /// # Errors
    ///
    /// As [`Session::login`]; validation failures carry the per-field
    /// messages.
    pub async fn signup(&self, request: &SignupRequest) -> Result<SessionUser, CatalogError> {
        if request.password != request.confirm_password {
            return Err(CatalogError::Invalid("passwords do not match".to_string()));
        }
        let auth = self.api.signup(request).await.map_err(auth_error)?;
        self.store(&auth)?;
        tracing::info!(email = %auth.user.email, "signed up");
        self.user().ok_or_else(|| CatalogError::Invalid("signup response had no user".to_string()))
    }

    /// Forget every session key.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Storage`] if a key cannot be removed.
    pub fn logout(&self) -> Result<(), CatalogError> {
        for key in keys::ALL {
            self.storage.remove(key)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.storage.get_raw(keys::IS_LOGGED_IN).as_deref() == Some("true")
    }

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.storage
            .get_raw(keys::ACCESS_TOKEN)
            .filter(|t| !t.is_empty())
    }

    /// The stored user, if both email and display name are known.
    #[must_use]
    pub fn user(&self) -> Option<SessionUser> {
        let email = self.storage.get_raw(keys::USER_EMAIL).filter(|s| !s.is_empty())?;
        let full_name = self.storage.get_raw(keys::USER_NAME).filter(|s| !s.is_empty())?;
        Some(SessionUser {
            email,
            full_name,
            first_name: self.storage.get_raw(keys::USER_FIRST_NAME).unwrap_or_default(),
            last_name: self.storage.get_raw(keys::USER_LAST_NAME).unwrap_or_default(),
            user_id: self
                .storage
                .get_raw(keys::USER_ID)
                .and_then(|id| id.trim().parse().ok()),
            date_joined: self
                .storage
                .get_raw(keys::USER_DATE_JOINED)
                .filter(|s| !s.is_empty()),
        })
    }

    /// Exchange the stored refresh token for a new access token. A rejected
    /// refresh token ends the session.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Unauthorized`] when there is no refresh token
    /// or the API rejects it, [`CatalogError::Api`] on transport failures.
    pub async fn refresh(&self) -> Result<String, CatalogError> {
        let refresh = self
            .storage
            .get_raw(keys::REFRESH_TOKEN)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                CatalogError::Unauthorized("No refresh token found. Please log in.".to_string())
            })?;
        match self.api.refresh_token(&refresh).await {
            Ok(access) => {
                self.storage.set_raw(keys::ACCESS_TOKEN, &access)?;
                Ok(access)
            }
            Err(e) if e.is_transport() => Err(e.into()),
            Err(e) => {
                tracing::warn!(error = %e, "token refresh rejected; clearing session");
                self.logout()?;
                Err(CatalogError::Unauthorized(
                    "Token refresh failed. Please log in again.".to_string(),
                ))
            }
        }
    }

    /// Token to attach to a mutating call: the stored access token, or one
    /// obtained by a single refresh when only a refresh token is stored.
    pub async fn token_for_write(&self) -> Option<String> {
        if let Some(token) = self.access_token() {
            return Some(token);
        }
        if self.storage.get_raw(keys::REFRESH_TOKEN).is_none() {
            return None;
        }
        match self.refresh().await {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::debug!(error = %e, "no usable token for write");
                None
            }
        }
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::Unauthorized`] without a token or when the API
    /// answers 401, in which case the session is cleared.
    pub async fn profile(&self) -> Result<UserProfile, CatalogError> {
        let token = self.access_token().ok_or_else(|| {
            CatalogError::Unauthorized("No access token found. Please log in.".to_string())
        })?;
        match self.api.user_profile(&token).await {
            Ok(profile) => Ok(profile),
            Err(e) if e.is_auth() => {
                self.logout()?;
                Err(CatalogError::Unauthorized(
                    "Authentication failed. Please login again.".to_string(),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, auth: &AuthResponse) -> Result<(), CatalogError> {
        let user = &auth.user;
        let entries = [
            (keys::ACCESS_TOKEN, auth.tokens.access.clone()),
            (keys::REFRESH_TOKEN, auth.tokens.refresh.clone()),
            (keys::IS_LOGGED_IN, "true".to_string()),
            (keys::USER_EMAIL, user.email.clone()),
            (keys::USER_NAME, user.full_name()),
            (keys::USER_FIRST_NAME, user.first_name.clone()),
            (keys::USER_LAST_NAME, user.last_name.clone()),
            (keys::USER_ID, user.id.to_string()),
            (keys::USER_DATE_JOINED, user.date_joined.clone()),
        ];
        for (key, value) in entries {
            self.storage.set_raw(key, &value)?;
        }
        Ok(())
    }
}

/// Login and signup show the server's own wording for bad credentials.
fn auth_error(err: ApiError) -> CatalogError {
    match err {
        ApiError::Unauthorized { message, .. } => CatalogError::Unauthorized(message),
        other => CatalogError::Api(other),
    }
}
