// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the sign-in endpoints. All types derive
//! `ToSchema` for the OpenAPI document.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::signin::{ResolvedUser, SessionError, SessionStatus};

/// Freshly issued sign-in nonce.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct NonceResponse {
    /// Value to embed as `Nonce:` in the message to sign
    pub nonce: String,
}

/// Signed EIP-4361 message.
///
/// Accepted as JSON by `/siwe/signin` and as a form by
/// `/siwe/signin/callback`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SigninRequest {
    /// Exact message text that was signed
    pub message: String,
    /// `0x`-prefixed 65-byte signature
    pub signature: String,
}

/// State of the caller's session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<ResolvedUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SessionError>,
}

impl From<SessionStatus> for SessionStatusResponse {
    fn from(status: SessionStatus) -> Self {
        Self {
            authenticated: status.user.is_some(),
            user: status.user,
            error: status.error,
        }
    }
}

/// Why the last sign-in attempt failed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AuthErrorResponse {
    /// `AccessDenied` or `SigninFailed`, echoed from the redirect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Persisted failure, when the session still holds one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SessionError>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuthErrorQuery {
    /// Failure kind set by the sign-in redirect
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SignoutResponse {
    /// Whether a user was signed in before the call
    pub signed_out: bool,
}
