// sra-core/src/clients/auth.rs
//! OAuth2 access tokens for the live adapters.
//!
//! Credentials come from a JSON key file supplied at construction time. Two
//! file types are understood: `service_account` keys (a signed JWT assertion
//! is exchanged for a token) and `authorized_user` files (a refresh token is
//! exchanged). A [`TokenSource`] caches the token for the lifetime of the
//! client that owns it and refreshes shortly before expiry.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::clients::http;
use crate::errors::ServiceError;

pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Clone, Deserialize)]
pub struct AuthorizedUser {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credentials {
    ServiceAccount(ServiceAccountKey),
    AuthorizedUser(AuthorizedUser),
}

// Secrets stay out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ServiceAccount(k) => f
                .debug_struct("ServiceAccount")
                .field("client_email", &k.client_email)
                .field("token_uri", &k.token_uri)
                .finish_non_exhaustive(),
            Credentials::AuthorizedUser(u) => f
                .debug_struct("AuthorizedUser")
                .field("client_id", &u.client_id)
                .field("token_uri", &u.token_uri)
                .finish_non_exhaustive(),
        }
    }
}

impl Credentials {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid credentials file {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse credentials JSON")
    }

    pub fn token_uri(&self) -> &str {
        match self {
            Credentials::ServiceAccount(k) => &k.token_uri,
            Credentials::AuthorizedUser(u) => &u.token_uri,
        }
    }

    /// Points the token exchange at a different endpoint.
    pub fn with_token_uri(mut self, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        match &mut self {
            Credentials::ServiceAccount(k) => k.token_uri = uri,
            Credentials::AuthorizedUser(u) => u.token_uri = uri,
        }
        self
    }
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

enum Grant {
    Credentials(Credentials),
    Static(String),
}

/// Hands out bearer tokens, exchanging credentials when the cached one expires.
pub struct TokenSource {
    http: reqwest::Client,
    grant: Grant,
    scope: String,
    cached: Mutex<Option<AccessToken>>,
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.grant {
            Grant::Credentials(c) => format!("{c:?}"),
            Grant::Static(_) => "Static".to_string(),
        };
        f.debug_struct("TokenSource").field("grant", &kind).field("scope", &self.scope).finish()
    }
}

impl TokenSource {
    pub fn new(http: reqwest::Client, credentials: Credentials) -> Self {
        Self {
            http,
            grant: Grant::Credentials(credentials),
            scope: CLOUD_PLATFORM_SCOPE.to_string(),
            cached: Mutex::new(None),
        }
    }

    /// Uses a pre-minted token as is, e.g. one printed by the cloud CLI.
    pub fn fixed(http: reqwest::Client, token: impl Into<String>) -> Self {
        Self {
            http,
            grant: Grant::Static(token.into()),
            scope: CLOUD_PLATFORM_SCOPE.to_string(),
            cached: Mutex::new(None),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Returns a valid bearer token.
    pub async fn token(&self) -> Result<String, ServiceError> {
        let credentials = match &self.grant {
            Grant::Static(token) => return Ok(token.clone()),
            Grant::Credentials(c) => c,
        };

        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.value.clone());
        }

        let fresh = self.exchange(credentials).await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn exchange(&self, credentials: &Credentials) -> Result<AccessToken, ServiceError> {
        let form: Vec<(&str, String)> = match credentials {
            Credentials::ServiceAccount(key) => vec![
                ("grant_type", JWT_BEARER_GRANT.to_string()),
                ("assertion", sign_assertion(key, &self.scope, Utc::now())?),
            ],
            Credentials::AuthorizedUser(user) => vec![
                ("grant_type", "refresh_token".to_string()),
                ("client_id", user.client_id.clone()),
                ("client_secret", user.client_secret.clone()),
                ("refresh_token", user.refresh_token.clone()),
            ],
        };

        debug!("Requesting access token from {}", credentials.token_uri());
        let resp = self
            .http
            .post(credentials.token_uri())
            .form(&form)
            .send()
            .await
            .map_err(http::transport)?;
        let body: TokenResponse = http::json(resp).await.map_err(|e| match e {
            // A rejected grant means the credentials are bad, whatever status the endpoint chose.
            ServiceError::InvalidRequest(msg) => ServiceError::Unauthenticated(msg),
            other => other,
        })?;

        Ok(AccessToken {
            value: body.access_token,
            expires_at: Utc::now() + Duration::seconds(body.expires_in),
        })
    }
}

fn sign_assertion(key: &ServiceAccountKey, scope: &str, now: DateTime<Utc>) -> Result<String, ServiceError> {
    let iat = now.timestamp();
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope,
        aud: &key.token_uri,
        iat,
        exp: iat + ASSERTION_LIFETIME_SECS,
    };
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let encoding = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| ServiceError::Unauthenticated(format!("invalid service account key: {e}")))?;
    jsonwebtoken::encode(&header, &claims, &encoding)
        .map_err(|e| ServiceError::Unauthenticated(format!("failed to sign assertion: {e}")))
}
