// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sign-in outcomes and how they travel back to the caller.
//!
//! - [`Denial`]: a policy decision (bad message, bad signature, a check said no)
//! - [`SigninError`]: an operational failure (collaborator down, no session)
//!
//! Denials explain themselves to the user. Operational failures are logged
//! with their cause but only surface a generic message.

use axum::{
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use super::check::CheckError;
use super::identity::{ResolvedUser, UserLoaderError};
use super::session::{SessionError, SessionStoreError};

const GENERIC_FAILURE: &str = "Sign-in could not be completed. Please try again later.";

/// A sign-in attempt rejected on policy grounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// Raw text is not a structurally valid sign-in message
    InvalidMessage(String),
    /// Signature does not belong to the claimed signer for this text
    InvalidSignature,
    /// A named check returned false
    Check { name: String, message: String },
}

impl Denial {
    pub fn error_code(&self) -> &'static str {
        match self {
            Denial::InvalidMessage(_) => "invalid_message",
            Denial::InvalidSignature => "invalid_signature",
            Denial::Check { .. } => "access_denied",
        }
    }

    /// Identity of the denial: the check name, or the verification failure.
    pub fn identity(&self) -> &str {
        match self {
            Denial::Check { name, .. } => name,
            other => other.error_code(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Denial::InvalidMessage(_) => StatusCode::BAD_REQUEST,
            Denial::InvalidSignature => StatusCode::UNAUTHORIZED,
            Denial::Check { .. } => StatusCode::FORBIDDEN,
        }
    }

    /// Text safe to show the user.
    pub fn user_message(&self) -> String {
        match self {
            Denial::InvalidMessage(reason) => format!("Invalid sign-in message: {reason}"),
            Denial::InvalidSignature => "Invalid signature.".to_string(),
            Denial::Check { message, .. } => message.clone(),
        }
    }

    pub fn to_session_error(&self) -> SessionError {
        SessionError {
            code: self.error_code().to_string(),
            check: match self {
                Denial::Check { name, .. } => Some(name.clone()),
                _ => None,
            },
            message: self.user_message(),
            at: Utc::now(),
        }
    }
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Denial::InvalidMessage(reason) => write!(f, "invalid sign-in message: {reason}"),
            Denial::InvalidSignature => write!(f, "invalid signature"),
            Denial::Check { name, .. } => write!(f, "denied by check `{name}`"),
        }
    }
}

/// A sign-in attempt that could not reach a policy decision.
#[derive(Debug, thiserror::Error)]
pub enum SigninError {
    #[error("check `{check}` failed: {source}")]
    Check {
        check: String,
        #[source]
        source: CheckError,
    },

    #[error("no session backs this sign-in attempt")]
    SessionNotFound,

    #[error(transparent)]
    SessionStore(#[from] SessionStoreError),

    #[error(transparent)]
    UserLoader(#[from] UserLoaderError),
}

impl SigninError {
    /// Classify a predicate failure. A missing session means the attempt
    /// was abandoned, not that a collaborator broke.
    pub fn from_check(check: impl Into<String>, source: CheckError) -> Self {
        match source {
            CheckError::MissingSessionId | CheckError::SessionNotFound(_) => {
                SigninError::SessionNotFound
            }
            source => SigninError::Check {
                check: check.into(),
                source,
            },
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            SigninError::Check { .. } => "check_error",
            SigninError::SessionNotFound => "session_not_found",
            SigninError::SessionStore(_) => "session_store_error",
            SigninError::UserLoader(_) => "user_loader_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            SigninError::Check { .. } | SigninError::SessionStore(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            SigninError::SessionNotFound => StatusCode::PRECONDITION_FAILED,
            SigninError::UserLoader(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            SigninError::SessionNotFound => {
                "Your sign-in session has ended. Request a new nonce and sign again."
            }
            _ => GENERIC_FAILURE,
        }
    }

    /// Persistable form without the operational cause.
    pub fn to_session_error(&self) -> SessionError {
        SessionError {
            code: self.error_code().to_string(),
            check: match self {
                SigninError::Check { check, .. } => Some(check.clone()),
                _ => None,
            },
            message: self.user_message().to_string(),
            at: Utc::now(),
        }
    }
}

/// Terminal state of one sign-in attempt.
#[derive(Debug)]
pub enum SigninOutcome {
    Authenticated(ResolvedUser),
    Denied(Denial),
    Errored(SigninError),
}

impl SigninOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SigninOutcome::Authenticated(_))
    }

    pub fn user(&self) -> Option<&ResolvedUser> {
        match self {
            SigninOutcome::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// Turn the outcome into a response according to `mode`.
    pub fn into_response_with(self, mode: &ResponseMode) -> Response {
        match mode {
            ResponseMode::Json => self.into_response(),
            ResponseMode::Redirect { success, error } => {
                let target = match &self {
                    SigninOutcome::Authenticated(_) => success.clone(),
                    SigninOutcome::Denied(_) => with_error_param(error, "AccessDenied"),
                    SigninOutcome::Errored(_) => with_error_param(error, "SigninFailed"),
                };
                redirect(&target)
            }
        }
    }
}

/// How sign-in outcomes are delivered to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseMode {
    /// JSON body with a status code per outcome
    Json,
    /// `303 See Other` to a success page or an error page
    Redirect { success: String, error: String },
}

#[derive(Serialize, ToSchema)]
pub struct SigninErrorBody {
    /// Human-readable explanation
    pub error: String,
    /// Stable machine-readable code
    pub error_code: String,
    /// Name of the denying check, for check denials
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SigninSuccessBody {
    pub user: ResolvedUser,
}

impl IntoResponse for Denial {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(SigninErrorBody {
            error: self.user_message(),
            error_code: self.error_code().to_string(),
            check: match self {
                Denial::Check { name, .. } => Some(name),
                _ => None,
            },
        });
        (status, body).into_response()
    }
}

impl IntoResponse for SigninError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(SigninErrorBody {
            error: self.user_message().to_string(),
            error_code: self.error_code().to_string(),
            check: None,
        });
        (status, body).into_response()
    }
}

impl IntoResponse for SigninOutcome {
    fn into_response(self) -> Response {
        match self {
            SigninOutcome::Authenticated(user) => {
                (StatusCode::OK, Json(SigninSuccessBody { user })).into_response()
            }
            SigninOutcome::Denied(denial) => denial.into_response(),
            SigninOutcome::Errored(err) => err.into_response(),
        }
    }
}

fn with_error_param(base: &str, error: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}error={error}")
}

fn redirect(target: &str) -> Response {
    (StatusCode::SEE_OTHER, [(LOCATION, target.to_string())]).into_response()
}
