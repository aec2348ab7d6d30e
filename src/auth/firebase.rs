// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Firebase Authentication as the identity provider.
//!
//! ## Calls
//!
//! - ID tokens: RS256, signing key picked by `kid` from Google's JWKS,
//!   `aud` = project id, `iss` = `https://securetoken.google.com/<project>`
//! - `accounts:lookup` and `accounts:update` on the Identity Toolkit REST API,
//!   authorized with an OAuth2 access token (see `credentials.rs`)
//!
//! ## Emulator
//!
//! With `FIREBASE_AUTH_EMULATOR_HOST` set, REST calls go to the emulator with
//! the `owner` token and ID tokens are decoded without a signature check (the
//! emulator does not sign them). Expiry, audience, issuer and subject are
//! still enforced.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

use super::claims::{IdentityRecord, VerifiedToken};
use super::credentials::{AccessTokens, CredentialsError, ServiceAccountKey, TokenSource};
use super::error::ProviderError;
use super::jwks::{JwksManager, FIREBASE_JWKS_URL};
use super::provider::IdentityProvider;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Upper bound on any single provider HTTP call.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Token accepted by the Auth emulator's admin endpoints.
const EMULATOR_ADMIN_TOKEN: &str = "owner";

/// Firebase caps uids at 128 characters.
const MAX_UID_LEN: usize = 128;

#[derive(Debug, Error)]
pub enum FirebaseSetupError {
    #[error("no Firebase project id: set FIREBASE_PROJECT_ID or use a key file with project_id")]
    MissingProjectId,
    #[error(transparent)]
    Credentials(#[from] CredentialsError),
    #[error("cannot build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Inputs needed to reach Firebase, taken from the environment at startup.
#[derive(Debug, Clone, Default)]
pub struct FirebaseSettings {
    pub project_id: Option<String>,
    pub credentials_path: Option<PathBuf>,
    pub emulator_host: Option<String>,
}

/// Firebase ID token payload.
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    #[serde(default)]
    sub: String,
    #[serde(default)]
    iat: i64,
    #[serde(default)]
    exp: i64,
    #[serde(default)]
    aud: String,
    #[serde(default)]
    iss: String,
    #[serde(default)]
    auth_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    /// Custom claims serialized as a JSON string.
    #[serde(default)]
    custom_attributes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
}

pub struct FirebaseProvider {
    project_id: String,
    issuer: String,
    api_base: String,
    jwks: JwksManager,
    tokens: AccessTokens,
    client: reqwest::Client,
    emulator: bool,
}

impl FirebaseProvider {
    /// Build the provider once at process start.
    pub fn from_settings(settings: FirebaseSettings) -> Result<Self, FirebaseSetupError> {
        let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;

        if let Some(host) = settings.emulator_host {
            let project_id = settings
                .project_id
                .ok_or(FirebaseSetupError::MissingProjectId)?;
            tracing::warn!(%host, "using Firebase Auth emulator; ID token signatures are not checked");
            return Ok(Self::emulator(project_id, &host, client));
        }

        let (project_id, source) = match settings.credentials_path {
            Some(path) => {
                let key = ServiceAccountKey::from_file(&path)?;
                let project_id = settings
                    .project_id
                    .or_else(|| key.project_id.clone())
                    .ok_or(FirebaseSetupError::MissingProjectId)?;
                tracing::info!(path = %path.display(), "using service account credentials");
                (project_id, TokenSource::service_account(key)?)
            }
            None => {
                let project_id = settings
                    .project_id
                    .ok_or(FirebaseSetupError::MissingProjectId)?;
                tracing::info!("using application default credentials from the metadata server");
                (project_id, TokenSource::metadata())
            }
        };

        Ok(Self::new(
            project_id,
            IDENTITY_TOOLKIT_URL,
            FIREBASE_JWKS_URL,
            source,
            client,
        ))
    }

    pub fn new(
        project_id: impl Into<String>,
        api_base: impl Into<String>,
        jwks_url: impl Into<String>,
        source: TokenSource,
        client: reqwest::Client,
    ) -> Self {
        let project_id = project_id.into();
        Self {
            issuer: format!("https://securetoken.google.com/{project_id}"),
            project_id,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            jwks: JwksManager::new(jwks_url, client.clone()),
            tokens: AccessTokens::new(source, client.clone()),
            client,
            emulator: false,
        }
    }

    /// Provider talking to the Auth emulator at `host` (`host:port`).
    pub fn emulator(project_id: impl Into<String>, host: &str, client: reqwest::Client) -> Self {
        let mut provider = Self::new(
            project_id,
            format!("http://{host}/identitytoolkit.googleapis.com/v1"),
            FIREBASE_JWKS_URL,
            TokenSource::Static(EMULATOR_ADMIN_TOKEN.to_string()),
            client,
        );
        provider.emulator = true;
        provider
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    async fn verify_signed(&self, token: &str) -> Result<IdTokenClaims, ProviderError> {
        let header = decode_header(token)
            .map_err(|_| ProviderError::Rejected("malformed token header".to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(ProviderError::Rejected(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| ProviderError::Rejected("token has no kid".to_string()))?;

        let decoding_key = self.jwks.get_decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.project_id]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "aud", "sub"]);

        let token_data = decode::<IdTokenClaims>(token, &decoding_key, &validation)
            .map_err(|e| ProviderError::Rejected(format!("{:?}", e.kind())))?;

        Ok(token_data.claims)
    }

    fn decode_emulated(&self, token: &str) -> Result<IdTokenClaims, ProviderError> {
        let claims = decode_unverified(token)?;
        let now = chrono::Utc::now().timestamp();
        let leeway = CLOCK_SKEW_LEEWAY as i64;

        if claims.exp <= 0 || claims.exp < now - leeway {
            return Err(ProviderError::Rejected("token expired".to_string()));
        }
        if claims.aud != self.project_id {
            return Err(ProviderError::Rejected("audience mismatch".to_string()));
        }
        if claims.iss != self.issuer {
            return Err(ProviderError::Rejected("issuer mismatch".to_string()));
        }
        Ok(claims)
    }

    async fn call<T: DeserializeOwned>(&self, action: &str, body: Value) -> Result<T, ProviderError> {
        let url = format!(
            "{}/projects/{}/accounts:{action}",
            self.api_base, self.project_id
        );
        let access_token = self.tokens.access_token().await?;

        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("accounts:{action}: {e}")))?;

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(ProviderError::Unavailable(format!(
                "accounts:{action} returned HTTP {status}"
            )));
        }
        if !status.is_success() {
            let message = response
                .json::<GoogleErrorBody>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_default();
            if message.starts_with("USER_NOT_FOUND") {
                return Err(ProviderError::NotFound);
            }
            return Err(ProviderError::Rejected(format!(
                "accounts:{action} returned HTTP {status}: {message}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Internal(format!("accounts:{action} body unreadable: {e}")))
    }
}

#[async_trait]
impl IdentityProvider for FirebaseProvider {
    async fn verify_id_token(&self, token: &str) -> Result<VerifiedToken, ProviderError> {
        let claims = if self.emulator {
            self.decode_emulated(token)?
        } else {
            self.verify_signed(token).await?
        };

        if claims.sub.is_empty() || claims.sub.chars().count() > MAX_UID_LEN {
            return Err(ProviderError::Rejected("invalid subject".to_string()));
        }

        let latest = chrono::Utc::now().timestamp() + CLOCK_SKEW_LEEWAY as i64;
        if claims.iat > latest || claims.auth_time.is_some_and(|t| t > latest) {
            return Err(ProviderError::Rejected("token issued in the future".to_string()));
        }

        Ok(VerifiedToken {
            uid: claims.sub,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }

    async fn get_user(&self, uid: &str) -> Result<IdentityRecord, ProviderError> {
        let lookup: LookupResponse = self.call("lookup", json!({ "localId": [uid] })).await?;
        let account = lookup
            .users
            .into_iter()
            .find(|account| account.local_id == uid)
            .ok_or(ProviderError::NotFound)?;

        let custom_claims = parse_custom_attributes(&account.local_id, account.custom_attributes);
        Ok(IdentityRecord {
            uid: account.local_id,
            email: account.email,
            display_name: account.display_name,
            custom_claims,
        })
    }

    async fn set_custom_user_claims(
        &self,
        uid: &str,
        claims: Map<String, Value>,
    ) -> Result<(), ProviderError> {
        let attributes = serde_json::to_string(&claims)
            .map_err(|e| ProviderError::Internal(format!("claims not serializable: {e}")))?;
        let _: Value = self
            .call(
                "update",
                json!({ "localId": uid, "customAttributes": attributes }),
            )
            .await?;
        Ok(())
    }

    async fn check_ready(&self) -> Result<(), ProviderError> {
        if self.emulator || self.jwks.is_cached().await {
            return Ok(());
        }
        self.jwks.refresh().await.map(|_| ())
    }
}

/// Decode a JWT payload without checking its signature.
fn decode_unverified(token: &str) -> Result<IdTokenClaims, ProviderError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ProviderError::Rejected("malformed token".to_string()));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| ProviderError::Rejected("malformed token payload".to_string()))?;
    serde_json::from_slice(&bytes)
        .map_err(|_| ProviderError::Rejected("malformed token claims".to_string()))
}

/// Custom claims arrive as a JSON string. Anything that is not a JSON object
/// counts as no claims at all.
fn parse_custom_attributes(uid: &str, raw: Option<String>) -> Map<String, Value> {
    let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
        return Map::new();
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(claims)) => claims,
        _ => {
            tracing::warn!(uid, "ignoring malformed custom claims");
            Map::new()
        }
    }
}
