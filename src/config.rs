// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup by [`SigninConfig::from_env`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `3200` |
//! | `ETHEREUM_RPC_URL` | JSON-RPC endpoint for chain checks | `http://localhost:8545` |
//! | `WHITELIST_CONTRACT_ADDRESS` | Allow-list contract; unset disables the check | unset |
//! | `MIN_BALANCE_WEI` | Minimum native balance; `0` disables the check | `0` |
//! | `REQUIRE_NETWORK_MATCH` | Compare provider and message chain ids | `true` |
//! | `CHECK_TIMEOUT_MS` | Bound on each check; `0` waits forever | `10000` |
//! | `SESSION_COOKIE_NAME` | Cookie carrying the session id | `connect.sid` |
//! | `SESSION_TTL_SECS` | In-memory session lifetime | `86400` |
//! | `SESSION_CAPACITY` | In-memory session limit | `10000` |
//! | `USER_LOADER` | `none` or `demo` | `none` |
//! | `SIGNIN_SUCCESS_REDIRECT` | Form sign-in success target | `/` |
//! | `SIGNIN_ERROR_REDIRECT` | Form sign-in failure target | `/siwe/auth/error` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files enabling HTTPS | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::time::Duration;

use alloy::primitives::{Address, U256};

use crate::blockchain::parse_address;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// JSON-RPC endpoint queried by the network and balance checks.
pub const ETHEREUM_RPC_URL_ENV: &str = "ETHEREUM_RPC_URL";

/// Allow-list contract exposing `isAddressInList(address) returns (bool)`.
///
/// When unset the whitelist slot always allows.
pub const WHITELIST_CONTRACT_ADDRESS_ENV: &str = "WHITELIST_CONTRACT_ADDRESS";

/// Minimum native balance in wei, inclusive. Negative values count as zero.
pub const MIN_BALANCE_WEI_ENV: &str = "MIN_BALANCE_WEI";

pub const REQUIRE_NETWORK_MATCH_ENV: &str = "REQUIRE_NETWORK_MATCH";
pub const CHECK_TIMEOUT_MS_ENV: &str = "CHECK_TIMEOUT_MS";
pub const SESSION_COOKIE_NAME_ENV: &str = "SESSION_COOKIE_NAME";
pub const SESSION_TTL_SECS_ENV: &str = "SESSION_TTL_SECS";
pub const SESSION_CAPACITY_ENV: &str = "SESSION_CAPACITY";
pub const USER_LOADER_ENV: &str = "USER_LOADER";
pub const SIGNIN_SUCCESS_REDIRECT_ENV: &str = "SIGNIN_SUCCESS_REDIRECT";
pub const SIGNIN_ERROR_REDIRECT_ENV: &str = "SIGNIN_ERROR_REDIRECT";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3200;
pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";
pub const DEFAULT_CHECK_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_SESSION_COOKIE_NAME: &str = "connect.sid";
pub const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_SESSION_CAPACITY: usize = 10_000;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value `{value}`: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} and {1} must be set together")]
    Incomplete(&'static str, &'static str),
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            var,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Which [`UserLoader`](crate::signin::UserLoader) resolves signed-in users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserLoaderKind {
    /// Synthesize the user from the composite id
    #[default]
    None,
    Demo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    pub cert_path: String,
    pub key_path: String,
}

/// Everything the server needs to wire the sign-in service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigninConfig {
    pub host: String,
    pub port: u16,
    pub rpc_url: String,
    pub whitelist_contract: Option<Address>,
    pub minimum_balance: U256,
    pub require_network_match: bool,
    pub check_timeout: Option<Duration>,
    pub session_cookie_name: String,
    pub session_ttl: Duration,
    pub session_capacity: usize,
    pub user_loader: UserLoaderKind,
    pub success_redirect: String,
    pub error_redirect: String,
    pub tls: Option<TlsConfig>,
    pub log_format: LogFormat,
}

impl Default for SigninConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            rpc_url: DEFAULT_RPC_URL.to_string(),
            whitelist_contract: None,
            minimum_balance: U256::ZERO,
            require_network_match: true,
            check_timeout: Some(Duration::from_millis(DEFAULT_CHECK_TIMEOUT_MS)),
            session_cookie_name: DEFAULT_SESSION_COOKIE_NAME.to_string(),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            session_capacity: DEFAULT_SESSION_CAPACITY,
            user_loader: UserLoaderKind::None,
            success_redirect: "/".to_string(),
            error_redirect: "/siwe/auth/error".to_string(),
            tls: None,
            log_format: LogFormat::Pretty,
        }
    }
}

impl SigninConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let port = match get(PORT_ENV) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| ConfigError::invalid(PORT_ENV, &raw, e))?,
            None => defaults.port,
        };

        let rpc_url = get(ETHEREUM_RPC_URL_ENV).unwrap_or(defaults.rpc_url);
        url::Url::parse(&rpc_url)
            .map_err(|e| ConfigError::invalid(ETHEREUM_RPC_URL_ENV, &rpc_url, e))?;

        let whitelist_contract = get(WHITELIST_CONTRACT_ADDRESS_ENV)
            .map(|raw| {
                parse_address(&raw)
                    .map_err(|e| ConfigError::invalid(WHITELIST_CONTRACT_ADDRESS_ENV, &raw, e))
            })
            .transpose()?;

        let minimum_balance = match get(MIN_BALANCE_WEI_ENV) {
            Some(raw) => parse_wei(&raw)?,
            None => U256::ZERO,
        };

        let require_network_match = match get(REQUIRE_NETWORK_MATCH_ENV) {
            Some(raw) => parse_bool(REQUIRE_NETWORK_MATCH_ENV, &raw)?,
            None => defaults.require_network_match,
        };

        let check_timeout = match get(CHECK_TIMEOUT_MS_ENV) {
            Some(raw) => {
                let ms = raw
                    .parse::<u64>()
                    .map_err(|e| ConfigError::invalid(CHECK_TIMEOUT_MS_ENV, &raw, e))?;
                (ms > 0).then(|| Duration::from_millis(ms))
            }
            None => defaults.check_timeout,
        };

        let session_ttl = match get(SESSION_TTL_SECS_ENV) {
            Some(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .map_err(|e| ConfigError::invalid(SESSION_TTL_SECS_ENV, &raw, e))?,
            ),
            None => defaults.session_ttl,
        };

        let session_capacity = match get(SESSION_CAPACITY_ENV) {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                Ok(_) => {
                    return Err(ConfigError::invalid(
                        SESSION_CAPACITY_ENV,
                        &raw,
                        "must be positive",
                    ))
                }
                Err(e) => return Err(ConfigError::invalid(SESSION_CAPACITY_ENV, &raw, e)),
            },
            None => defaults.session_capacity,
        };

        let user_loader = match get(USER_LOADER_ENV).as_deref() {
            None | Some("none") => UserLoaderKind::None,
            Some("demo") => UserLoaderKind::Demo,
            Some(other) => {
                return Err(ConfigError::invalid(
                    USER_LOADER_ENV,
                    other,
                    "expected `none` or `demo`",
                ))
            }
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::invalid(
                    LOG_FORMAT_ENV,
                    other,
                    "expected `json` or `pretty`",
                ))
            }
        };

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert_path), Some(key_path)) => Some(TlsConfig {
                cert_path,
                key_path,
            }),
            (None, None) => None,
            _ => return Err(ConfigError::Incomplete(TLS_CERT_PATH_ENV, TLS_KEY_PATH_ENV)),
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or(defaults.host),
            port,
            rpc_url,
            whitelist_contract,
            minimum_balance,
            require_network_match,
            check_timeout,
            session_cookie_name: get(SESSION_COOKIE_NAME_ENV)
                .unwrap_or(defaults.session_cookie_name),
            session_ttl,
            session_capacity,
            user_loader,
            success_redirect: get(SIGNIN_SUCCESS_REDIRECT_ENV).unwrap_or(defaults.success_redirect),
            error_redirect: get(SIGNIN_ERROR_REDIRECT_ENV).unwrap_or(defaults.error_redirect),
            tls,
            log_format,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(var, raw, "expected a boolean")),
    }
}

/// Decimal wei amount. A leading `-` clamps to zero.
fn parse_wei(raw: &str) -> Result<U256, ConfigError> {
    if let Some(magnitude) = raw.strip_prefix('-') {
        U256::from_str_radix(magnitude, 10)
            .map_err(|e| ConfigError::invalid(MIN_BALANCE_WEI_ENV, raw, e))?;
        tracing::warn!(value = raw, "Negative minimum balance treated as zero");
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(raw, 10).map_err(|e| ConfigError::invalid(MIN_BALANCE_WEI_ENV, raw, e))
}
