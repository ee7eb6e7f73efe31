//! Client-credentials token acquisition for Microsoft Graph.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use url::Url;

use super::schema::{TokenErrorResponse, TokenResponse};
use crate::error::ApiError;

/// Scope requested for app-only Graph access.
pub const GRAPH_DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Tokens are refreshed this long before the issuer says they expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Lifetime assumed when the token response omits `expires_in`.
const DEFAULT_LIFETIME_SECS: i64 = 3600;

/// Tenant-scoped application credentials.
#[derive(Clone)]
pub struct ClientCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
struct CachedToken {
    secret: String,
    expires_at: DateTime<Utc>,
}

impl fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedToken")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

/// Fetches and caches a bearer token for Graph requests.
///
/// The lock is held across the token request so concurrent callers share a
/// single refresh instead of each hitting the token endpoint.
#[derive(Debug)]
pub struct TokenProvider {
    http: reqwest::Client,
    token_url: Url,
    credentials: ClientCredentials,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(
        http: reqwest::Client,
        authority: &Url,
        credentials: ClientCredentials,
    ) -> Result<Self, ApiError> {
        let token_url = token_url(authority, &credentials.tenant_id)?;
        Ok(Self {
            http,
            token_url,
            credentials,
            cached: Mutex::new(None),
        })
    }

    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// Return a valid bearer token, requesting a new one when needed.
    pub async fn bearer(&self) -> Result<String, ApiError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && token.is_fresh(Utc::now())
        {
            return Ok(token.secret.clone());
        }

        let token = self.request_token().await?;
        let secret = token.secret.clone();
        *cached = Some(token);
        Ok(secret)
    }

    async fn request_token(&self) -> Result<CachedToken, ApiError> {
        tracing::debug!(
            url = %self.token_url,
            client_id = %self.credentials.client_id,
            "Requesting access token"
        );

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("scope", GRAPH_DEFAULT_SCOPE),
        ];
        let response = self
            .http
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Auth(describe_token_error(status.as_u16(), &body)));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)?;
        Ok(cached_token_from(parsed, Utc::now()))
    }
}

fn token_url(authority: &Url, tenant_id: &str) -> Result<Url, ApiError> {
    let tenant = tenant_id.trim();
    if tenant.is_empty() {
        return Err(ApiError::Auth("Tenant ID must not be empty".to_string()));
    }
    let mut url = authority.clone();
    url.path_segments_mut()
        .map_err(|_| ApiError::Auth(format!("Cannot use {} as a token authority", authority)))?
        .pop_if_empty()
        .extend([tenant, "oauth2", "v2.0", "token"]);
    Ok(url)
}

fn cached_token_from(response: TokenResponse, now: DateTime<Utc>) -> CachedToken {
    let lifetime = response
        .expires_in
        .unwrap_or(DEFAULT_LIFETIME_SECS)
        .clamp(0, 24 * 3600);
    CachedToken {
        secret: response.access_token,
        expires_at: now + Duration::seconds(lifetime),
    }
}

fn describe_token_error(status: u16, body: &str) -> String {
    match serde_json::from_str::<TokenErrorResponse>(body) {
        Ok(err) => match err.error_description {
            Some(description) => format!("HTTP {}: {} ({})", status, err.error, description),
            None => format!("HTTP {}: {}", status, err.error),
        },
        Err(_) => format!("HTTP {} from token endpoint", status),
    }
}
