//! HTTP client for the storefront product and auth API.
//!
//! Wraps `reqwest` with a request timeout, retry on idempotent reads, and
//! error classification. Non-success bodies are turned into readable
//! messages with [`extract_error_message`].

use std::time::Duration;

use craftshop_core::{AppConfig, ProductDraft, ProductPatch};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{mentions_auth, ApiError};
use crate::message::extract_error_message;
use crate::retry::retry_with_backoff;
use crate::types::{
    AuthResponse, Credentials, ImageUpload, NewReview, RefreshResponse, SignupRequest,
    UploadedImage, UserProfile,
};

const DEFAULT_USER_AGENT: &str = "craftshop/0.1 (storefront-client)";
const MAX_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Client for the remote product API.
///
/// Use [`ApiClient::from_config`] in the application or [`ApiClient::new`]
/// to point at a mock server in tests. Reads are retried on transient
/// failures when [`ApiClient::with_retries`] is set; writes never are.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`ApiError::InvalidBaseUrl`] if `base_url` does not
    /// parse.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, ApiError> {
        let user_agent = if user_agent.trim().is_empty() {
            DEFAULT_USER_AGENT
        } else {
            user_agent
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(
                timeout_secs.min(MAX_CONNECT_TIMEOUT_SECS),
            ))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash, so relative endpoints join under the
        // base path instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// # Errors
    ///
    /// See [`ApiClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        Ok(Self::new(
            &config.api_base_url,
            config.api_timeout_secs,
            &config.api_user_agent,
        )?
        .with_retries(config.api_max_retries, config.api_retry_backoff_base_ms))
    }

    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Raw product records. A 404 from the list endpoint means the backend
    /// has no products route yet and reads as an empty list.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] on network failure or timeout.
    /// - [`ApiError::Rejected`] / [`ApiError::RateLimited`] on error statuses.
    /// - [`ApiError::Deserialize`] if the body is not a JSON array (or a
    ///   paginated object with a `results` array).
    pub async fn list_products(&self) -> Result<Vec<Value>, ApiError> {
        let context = "products/";
        let body = match self.get_json(context, None).await {
            Ok(body) => body,
            Err(ApiError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let body = match body {
            Value::Object(mut map) if map.get("results").is_some_and(Value::is_array) => {
                map.remove("results").unwrap_or_default()
            }
            other => other,
        };
        decode(body, context)
    }

    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown id, otherwise as
    /// [`ApiClient::list_products`].
    pub async fn get_product(&self, id: i64) -> Result<Value, ApiError> {
        self.get_json(&format!("products/{id}/"), None).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when the API refuses the token (or
    /// its absence), [`ApiError::Rejected`] on validation failures, and
    /// [`ApiError::Http`] on network failure.
    pub async fn create_product(
        &self,
        draft: &ProductDraft,
        token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let context = "products/";
        let url = self.endpoint(context)?;
        let request = authorize(self.client.post(url).json(draft), token);
        self.send(request, context).await
    }

    /// Sends only the fields present in `patch`.
    ///
    /// # Errors
    ///
    /// As [`ApiClient::create_product`], plus [`ApiError::NotFound`].
    pub async fn update_product(
        &self,
        id: i64,
        patch: &ProductPatch,
        token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let context = format!("products/{id}/");
        let url = self.endpoint(&context)?;
        let request = authorize(self.client.put(url).json(patch), token);
        self.send(request, &context).await
    }

    /// # Errors
    ///
    /// As [`ApiClient::update_product`].
    pub async fn delete_product(&self, id: i64, token: Option<&str>) -> Result<(), ApiError> {
        let context = format!("products/{id}/");
        let url = self.endpoint(&context)?;
        let request = authorize(self.client.delete(url), token);
        self.send(request, &context).await?;
        Ok(())
    }

    /// Returns the stored review. The server recomputes the product rating.
    ///
    /// # Errors
    ///
    /// As [`ApiClient::update_product`].
    pub async fn add_review(
        &self,
        product_id: i64,
        review: &NewReview,
        token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let context = format!("products/{product_id}/add_review/");
        let url = self.endpoint(&context)?;
        let request = authorize(self.client.post(url).json(review), token);
        self.send(request, &context).await
    }

    /// # Errors
    ///
    /// As [`ApiClient::create_product`]; [`ApiError::Http`] also covers an
    /// invalid MIME type on a file upload.
    pub async fn upload_image(
        &self,
        upload: ImageUpload,
        token: Option<&str>,
    ) -> Result<UploadedImage, ApiError> {
        let context = "upload-image/";
        let url = self.endpoint(context)?;
        let request = match upload {
            ImageUpload::DataUri(uri) => self
                .client
                .post(url)
                .json(&serde_json::json!({ "image": uri })),
            ImageUpload::File {
                file_name,
                bytes,
                mime,
            } => {
                let mut part = Part::bytes(bytes).file_name(file_name);
                if let Some(mime) = mime {
                    part = part.mime_str(&mime)?;
                }
                self.client
                    .post(url)
                    .multipart(Form::new().part("image", part))
            }
        };
        let body = self.send(authorize(request, token), context).await?;
        decode(body, context)
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] or [`ApiError::Rejected`] with the
    /// server's message on bad credentials.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        let context = "auth/login/";
        let url = self.endpoint(context)?;
        let body = self
            .send(self.client.post(url).json(credentials), context)
            .await?;
        decode(body, context)
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] carrying the per-field validation
    /// messages when the signup is refused.
    pub async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, ApiError> {
        let context = "auth/signup/";
        let url = self.endpoint(context)?;
        let body = self.send(self.client.post(url).json(request), context).await?;
        decode(body, context)
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when the refresh token is rejected.
    pub async fn refresh_token(&self, refresh: &str) -> Result<String, ApiError> {
        let context = "auth/token/refresh/";
        let url = self.endpoint(context)?;
        let body = self
            .send(
                self.client
                    .post(url)
                    .json(&serde_json::json!({ "refresh": refresh })),
                context,
            )
            .await?;
        let parsed: RefreshResponse = decode(body, context)?;
        Ok(parsed.access)
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when the token is missing or expired.
    pub async fn user_profile(&self, token: &str) -> Result<UserProfile, ApiError> {
        let context = "auth/profile/";
        let body = self.get_json(context, Some(token)).await?;
        decode(body, context)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })
    }

    async fn get_json(&self, path: &str, token: Option<&str>) -> Result<Value, ApiError> {
        let url = self.endpoint(path)?;
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.send(authorize(self.client.get(url.clone()), token), path)
        })
        .await
    }

    /// Sends the request and parses a successful body as JSON. An empty
    /// success body (e.g. 204) reads as `null`.
    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Value, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            if body.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&body).map_err(|e| ApiError::Deserialize {
                context: context.to_string(),
                source: e,
            });
        }

        let err = classify(status, &body, context);
        tracing::debug!(context, status = status.as_u16(), error = %err, "product API request failed");
        Err(err)
    }
}

fn authorize(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) if !token.is_empty() => request.bearer_auth(token),
        _ => request,
    }
}

fn classify(status: StatusCode, body: &str, context: &str) -> ApiError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
        StatusCode::NOT_FOUND => ApiError::NotFound(context.to_string()),
        _ => {
            let message =
                extract_error_message(status.as_u16(), status.canonical_reason().unwrap_or(""), body);
            let auth = status == StatusCode::UNAUTHORIZED
                || status == StatusCode::FORBIDDEN
                || (status.is_client_error() && mentions_auth(&message));
            if auth {
                ApiError::Unauthorized {
                    status: status.as_u16(),
                    message,
                }
            } else {
                ApiError::Rejected {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }
}

fn decode<T: DeserializeOwned>(body: Value, context: &str) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::Deserialize {
        context: context.to_string(),
        source: e,
    })
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
