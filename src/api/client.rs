//! Token-refreshing request gateway
//!
//! Every backend call goes through [`ApiClient`]: the current access token
//! is attached as a bearer header, and an authorization failure triggers
//! exactly one refresh-and-retry cycle. A failed refresh propagates the
//! original error unchanged; there is no retry loop.

use crate::api::credentials::CredentialStore;
use crate::api::types::{LoginResponse, RefreshResponse, Role, Ticket, TicketPage, TokenPair, UserProfile};
use crate::api::ApiError;
use crate::config::Settings;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client as HttpClient, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Login boundary used by the auth gate.
///
/// A trait seam so the state machine can be exercised in tests without a
/// network behind it.
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Exchanges credentials for a user profile, storing the issued token
    /// pair as a side effect.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` when the backend rejects the credentials or
    /// the call fails.
    async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ApiError>;
}

/// HTTP client for the ticketing backend
pub struct ApiClient {
    http: HttpClient,
    base_url: String,
    creds: Arc<CredentialStore>,
}

impl ApiClient {
    /// Creates a client for the backend named in `settings`, using the
    /// given credential store for bearer tokens.
    #[must_use]
    pub fn new(settings: &Settings, creds: Arc<CredentialStore>) -> Self {
        let http = HttpClient::builder()
            .timeout(settings.http_timeout())
            .build()
            .unwrap_or_else(|_| HttpClient::new());
        Self {
            http,
            base_url: settings.api_url.trim_end_matches('/').to_string(),
            creds,
        }
    }

    /// Logs in with email/password and stores the issued token pair.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` on bad credentials or any transport failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ApiError> {
        let url = format!("{}/auth/login", self.base_url);
        let body = json!({ "email": email, "password": password });
        let resp: LoginResponse = self.request_json(Method::POST, &url, Some(body)).await?;

        self.creds
            .store(TokenPair {
                access: resp.token,
                refresh: resp.refresh_token,
            })
            .await;
        debug!("login succeeded for user {}", resp.user.id);
        Ok(resp.user)
    }

    /// Fetches the tickets visible to `viewer`, device metadata included.
    /// Admins see every ticket; regular users only their own.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` on any backend or transport failure.
    pub async fn list_tickets(&self, viewer: &UserProfile) -> Result<Vec<Ticket>, ApiError> {
        let url = match viewer.role {
            Role::Admin => format!("{}/tickets?includeDevice=true", self.base_url),
            Role::User => format!(
                "{}/tickets?userId={}&includeDevice=true",
                self.base_url, viewer.id
            ),
        };
        let page: TicketPage = self.request_json(Method::GET, &url, None).await?;
        Ok(page.items)
    }

    /// Sends an authorized request, recovering from a 401 with at most one
    /// refresh-and-retry.
    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let stale = self.creds.snapshot().await;
        let resp = self
            .send_authorized(method.clone(), url, body.as_ref(), stale.as_ref())
            .await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return parse_response(resp).await;
        }

        let original = response_error(resp).await;
        // Refresh needs a full pair on hand; otherwise the 401 stands.
        let Some(stale) = stale else {
            return Err(original);
        };
        let fresh = match self
            .creds
            .refresh_with(&stale, |pair| self.exchange_refresh(pair))
            .await
        {
            Ok(fresh) => fresh,
            Err(e) => {
                warn!("token refresh failed: {e}");
                return Err(original);
            }
        };

        let retry = self
            .send_authorized(method, url, body.as_ref(), Some(&fresh))
            .await?;
        parse_response(retry).await
    }

    /// Sends one request with the bearer header attached.
    ///
    /// An absent pair still produces a syntactically valid header
    /// (`Bearer null`); the backend answers 401 and the caller decides
    /// what that means.
    async fn send_authorized(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        pair: Option<&TokenPair>,
    ) -> Result<Response, ApiError> {
        let bearer = pair.map_or("null", |p| p.access.as_str());
        let mut request = self
            .http
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {bearer}"));
        if let Some(body) = body {
            request = request.json(body);
        }
        request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    /// One refresh exchange: old pair in, new pair out.
    async fn exchange_refresh(&self, stale: TokenPair) -> Result<TokenPair, ApiError> {
        let url = format!("{}/auth/refresh", self.base_url);
        let body = json!({ "token": stale.access, "refreshToken": stale.refresh });
        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let parsed: RefreshResponse = parse_response(resp).await?;
        debug!("token pair refreshed");
        Ok(TokenPair {
            access: parsed.token,
            refresh: parsed.refresh_token,
        })
    }
}

#[async_trait]
impl LoginService for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ApiError> {
        self.login(email, password).await
    }
}

/// Maps a response to parsed JSON or the matching `ApiError`.
async fn parse_response<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(response_error(resp).await);
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Api(format!("{status} - {}", truncate_body(&body))));
    }
    resp.json().await.map_err(|e| ApiError::Json(e.to_string()))
}

/// Consumes a 401 response into the error that propagates to callers.
async fn response_error(resp: Response) -> ApiError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    ApiError::Unauthorized(format!("{status} - {}", truncate_body(&body)))
}

/// Keeps error messages readable when the backend returns a large body.
fn truncate_body(body: &str) -> String {
    if body.chars().count() > 500 {
        let head: String = body.chars().take(500).collect();
        format!("{head}... (truncated)")
    } else {
        body.to_string()
    }
}
