// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OAuth2 access tokens for the provider's admin REST API.
//!
//! Three sources, picked once at startup:
//!
//! - a service account key file (`GOOGLE_APPLICATION_CREDENTIALS`), exchanged
//!   through the JWT bearer grant
//! - the GCE metadata server (application default credentials)
//! - a fixed token, used against the Auth emulator

use std::path::Path;
use std::sync::Arc;

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use super::error::ProviderError;

pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

const TOKEN_SCOPES: &str = "https://www.googleapis.com/auth/cloud-platform \
     https://www.googleapis.com/auth/identitytoolkit";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Assertion lifetime accepted by Google's token endpoint.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Refresh cached tokens this long before they expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("cannot read credentials file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("credentials file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported credentials type {0:?} (expected service_account)")]
    UnsupportedType(String),
    #[error("service account private key is not a valid RSA PEM: {0}")]
    InvalidKey(String),
}

/// The fields of a service account key file this service uses.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(default, rename = "type")]
    pub key_type: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CredentialsError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CredentialsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, CredentialsError> {
        let key: ServiceAccountKey = serde_json::from_str(raw)?;
        match key.key_type.as_deref() {
            None | Some("service_account") => Ok(key),
            Some(other) => Err(CredentialsError::UnsupportedType(other.to_string())),
        }
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Where access tokens come from.
#[derive(Clone)]
pub enum TokenSource {
    ServiceAccount {
        key: ServiceAccountKey,
        signer: EncodingKey,
    },
    Metadata {
        url: String,
    },
    Static(String),
}

impl TokenSource {
    /// Service account source; the key is parsed here so a bad file fails
    /// startup instead of the first request.
    pub fn service_account(key: ServiceAccountKey) -> Result<Self, CredentialsError> {
        let signer = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| CredentialsError::InvalidKey(e.to_string()))?;
        Ok(TokenSource::ServiceAccount { key, signer })
    }

    pub fn metadata() -> Self {
        TokenSource::Metadata {
            url: METADATA_TOKEN_URL.to_string(),
        }
    }
}

struct CachedToken {
    value: String,
    expires_at: i64,
}

/// Access token cache over a [`TokenSource`].
#[derive(Clone)]
pub struct AccessTokens {
    source: TokenSource,
    client: reqwest::Client,
    cache: Arc<RwLock<Option<CachedToken>>>,
}

impl AccessTokens {
    pub fn new(source: TokenSource, client: reqwest::Client) -> Self {
        Self {
            source,
            client,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    /// A bearer token valid for at least another minute.
    pub async fn access_token(&self) -> Result<String, ProviderError> {
        if let TokenSource::Static(token) = &self.source {
            return Ok(token.clone());
        }

        let now = chrono::Utc::now().timestamp();
        {
            let cache = self.cache.read().await;
            if let Some(cached) = &*cache {
                if cached.expires_at - EXPIRY_MARGIN_SECS > now {
                    return Ok(cached.value.clone());
                }
            }
        }

        let fetched = self.fetch(now).await?;
        let expires_at = now + fetched.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        let mut cache = self.cache.write().await;
        *cache = Some(CachedToken {
            value: fetched.access_token.clone(),
            expires_at,
        });
        tracing::debug!(expires_at, "access token refreshed");
        Ok(fetched.access_token)
    }

    async fn fetch(&self, now: i64) -> Result<TokenResponse, ProviderError> {
        let request = match &self.source {
            TokenSource::ServiceAccount { key, signer } => {
                let assertion = sign_assertion(key, signer, now)?;
                self.client
                    .post(&key.token_uri)
                    .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            }
            TokenSource::Metadata { url } => {
                self.client.get(url).header("Metadata-Flavor", "Google")
            }
            TokenSource::Static(token) => {
                return Ok(TokenResponse {
                    access_token: token.clone(),
                    expires_in: None,
                })
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("token endpoint: {e}")))?;

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(ProviderError::Unavailable(format!(
                "token endpoint returned HTTP {status}"
            )));
        }
        if !status.is_success() {
            return Err(ProviderError::Internal(format!(
                "token endpoint refused credentials: HTTP {status}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Internal(format!("token response unreadable: {e}")))
    }
}

fn sign_assertion(
    key: &ServiceAccountKey,
    signer: &EncodingKey,
    now: i64,
) -> Result<String, ProviderError> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: TOKEN_SCOPES,
        aud: &key.token_uri,
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };

    encode(&header, &claims, signer)
        .map_err(|e| ProviderError::Internal(format!("cannot sign token assertion: {e}")))
}
