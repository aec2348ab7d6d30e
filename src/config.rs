// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read once at startup from the environment, after loading
//! an optional `.env` file.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `FIREBASE_PROJECT_ID` | Firebase project; token audience | `GOOGLE_CLOUD_PROJECT` |
//! | `GOOGLE_APPLICATION_CREDENTIALS` | Service account key file | Metadata server |
//! | `GOOGLE_CLOUD_PROJECT` | Fallback project id | - |
//! | `FIREBASE_AUTH_EMULATOR_HOST` | `host:port` of the Auth emulator | Unset |
//! | `IDENTITY_VERIFY_TIMEOUT_MS` | Bound on one token verification | `5000` |
//! | `CORS_ALLOWED_ORIGINS` | Comma-separated origins | Any origin |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::auth::FirebaseSettings;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const FIREBASE_PROJECT_ID_ENV: &str = "FIREBASE_PROJECT_ID";
pub const GOOGLE_CLOUD_PROJECT_ENV: &str = "GOOGLE_CLOUD_PROJECT";
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const EMULATOR_HOST_ENV: &str = "FIREBASE_AUTH_EMULATOR_HOST";
pub const VERIFY_TIMEOUT_ENV: &str = "IDENTITY_VERIFY_TIMEOUT_MS";
pub const CORS_ORIGINS_ENV: &str = "CORS_ALLOWED_ORIGINS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_VERIFY_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub project_id: Option<String>,
    pub credentials_path: Option<PathBuf>,
    pub emulator_host: Option<String>,
    pub verify_timeout: Duration,
    /// Empty means any origin is allowed.
    pub cors_origins: Vec<String>,
    pub log_format: LogFormat,
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match var(PORT_ENV) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| ConfigError::invalid(PORT_ENV, e.to_string()))?,
            None => DEFAULT_PORT,
        };
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|_| ConfigError::invalid(HOST_ENV, format!("{host:?} is not an IP address")))?;

        let verify_timeout_ms = match var(VERIFY_TIMEOUT_ENV) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => return Err(ConfigError::invalid(VERIFY_TIMEOUT_ENV, "must be positive")),
                Ok(ms) => ms,
                Err(e) => return Err(ConfigError::invalid(VERIFY_TIMEOUT_ENV, e.to_string())),
            },
            None => DEFAULT_VERIFY_TIMEOUT_MS,
        };

        let emulator_host = var(EMULATOR_HOST_ENV);
        if let Some(host) = &emulator_host {
            validate_emulator_host(host)?;
        }

        let cors_origins = match var(CORS_ORIGINS_ENV) {
            Some(raw) => parse_origins(&raw)?,
            None => Vec::new(),
        };

        let log_format = match var(LOG_FORMAT_ENV).as_deref() {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Config {
            addr,
            project_id: var(FIREBASE_PROJECT_ID_ENV).or_else(|| var(GOOGLE_CLOUD_PROJECT_ENV)),
            credentials_path: var(CREDENTIALS_ENV).map(PathBuf::from),
            emulator_host,
            verify_timeout: Duration::from_millis(verify_timeout_ms),
            cors_origins,
            log_format,
        })
    }

    pub fn firebase_settings(&self) -> FirebaseSettings {
        FirebaseSettings {
            project_id: self.project_id.clone(),
            credentials_path: self.credentials_path.clone(),
            emulator_host: self.emulator_host.clone(),
        }
    }
}

/// The emulator host is `host:port` without a scheme, as the Firebase SDKs
/// expect it.
fn validate_emulator_host(host: &str) -> Result<(), ConfigError> {
    if host.contains("://") {
        return Err(ConfigError::invalid(EMULATOR_HOST_ENV, "expected host:port without a scheme"));
    }
    let url = Url::parse(&format!("http://{host}"))
        .map_err(|e| ConfigError::invalid(EMULATOR_HOST_ENV, e.to_string()))?;
    if url.host_str().is_none() || url.path() != "/" {
        return Err(ConfigError::invalid(EMULATOR_HOST_ENV, "expected host:port"));
    }
    Ok(())
}

fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|origin| {
            let url = Url::parse(origin)
                .map_err(|e| ConfigError::invalid(CORS_ORIGINS_ENV, format!("{origin}: {e}")))?;
            if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
                return Err(ConfigError::invalid(
                    CORS_ORIGINS_ENV,
                    format!("{origin}: not an http(s) origin"),
                ));
            }
            Ok(origin.trim_end_matches('/').to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.verify_timeout, Duration::from_secs(5));
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.project_id.is_none());
        assert!(config.cors_origins.is_empty());
    }

    #[test]
    fn project_id_falls_back_to_cloud_project() {
        let config = load(&[(GOOGLE_CLOUD_PROJECT_ENV, "gcp-proj")]).unwrap();
        assert_eq!(config.project_id.as_deref(), Some("gcp-proj"));

        let config = load(&[
            (GOOGLE_CLOUD_PROJECT_ENV, "gcp-proj"),
            (FIREBASE_PROJECT_ID_ENV, "fb-proj"),
        ])
        .unwrap();
        assert_eq!(config.project_id.as_deref(), Some("fb-proj"));
    }

    #[test]
    fn blank_values_are_unset() {
        let config = load(&[(FIREBASE_PROJECT_ID_ENV, "  "), (PORT_ENV, "")]).unwrap();
        assert!(config.project_id.is_none());
        assert_eq!(config.addr.port(), 8080);
    }

    #[test]
    fn rejects_bad_port_and_timeout() {
        assert!(load(&[(PORT_ENV, "http")]).is_err());
        assert!(load(&[(VERIFY_TIMEOUT_ENV, "0")]).is_err());
        assert!(load(&[(VERIFY_TIMEOUT_ENV, "soon")]).is_err());
    }

    #[test]
    fn parses_timeout_and_log_format() {
        let config = load(&[(VERIFY_TIMEOUT_ENV, "250"), (LOG_FORMAT_ENV, "JSON")]).unwrap();
        assert_eq!(config.verify_timeout, Duration::from_millis(250));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn cors_origins_are_validated() {
        let config = load(&[(
            CORS_ORIGINS_ENV,
            "https://schools.example.org/, http://localhost:3000",
        )])
        .unwrap();
        assert_eq!(
            config.cors_origins,
            vec!["https://schools.example.org", "http://localhost:3000"]
        );

        assert!(load(&[(CORS_ORIGINS_ENV, "schools.example.org")]).is_err());
        assert!(load(&[(CORS_ORIGINS_ENV, "ftp://schools.example.org")]).is_err());
    }

    #[test]
    fn emulator_host_must_be_host_port() {
        let config = load(&[(EMULATOR_HOST_ENV, "127.0.0.1:9099")]).unwrap();
        assert_eq!(config.firebase_settings().emulator_host.as_deref(), Some("127.0.0.1:9099"));

        assert!(load(&[(EMULATOR_HOST_ENV, "http://127.0.0.1:9099")]).is_err());
        assert!(load(&[(EMULATOR_HOST_ENV, "localhost:9099/auth")]).is_err());
    }

    #[test]
    fn firebase_settings_carry_credentials_path() {
        let config = load(&[
            (FIREBASE_PROJECT_ID_ENV, "fb-proj"),
            (CREDENTIALS_ENV, "/secrets/sa.json"),
        ])
        .unwrap();
        let settings = config.firebase_settings();
        assert_eq!(settings.project_id.as_deref(), Some("fb-proj"));
        assert_eq!(settings.credentials_path, Some(PathBuf::from("/secrets/sa.json")));
    }
}
