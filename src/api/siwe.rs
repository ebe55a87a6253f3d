// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sign-in with Ethereum endpoints.
//!
//! The handlers only move data between HTTP and [`SigninService`]; every
//! decision is made there.
//!
//! [`SigninService`]: crate::signin::SigninService

use axum::{
    extract::{Form, Query, State},
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
    Json,
};

use super::session::SessionCookie;
use crate::error::ApiError;
use crate::models::{
    AuthErrorQuery, AuthErrorResponse, NonceResponse, SessionStatusResponse, SigninRequest,
    SignoutResponse,
};
use crate::signin::{
    error::{SigninErrorBody, SigninSuccessBody},
    ResolvedUser, SessionStatus, SigninError,
};
use crate::state::AppState;

/// Issue a nonce for the caller's session, starting one if needed.
#[utoipa::path(
    get,
    path = "/siwe/nonce",
    tag = "SiwE",
    responses(
        (status = 200, description = "Nonce issued", body = NonceResponse),
        (status = 503, description = "Session store unavailable", body = SigninErrorBody)
    )
)]
pub async fn nonce(
    State(state): State<AppState>,
    session: SessionCookie,
) -> Result<Response, SigninError> {
    let (session_id, set_cookie) = session.id_or_issue(&state.http.session_cookie_name);
    let nonce = state.signin.begin_attempt(&session_id).await?;

    let mut response = Json(NonceResponse { nonce }).into_response();
    if let Some(cookie) = set_cookie {
        response.headers_mut().insert(SET_COOKIE, cookie);
    }
    Ok(response)
}

/// Complete a sign-in attempt and answer with JSON.
#[utoipa::path(
    post,
    path = "/siwe/signin",
    tag = "SiwE",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Signed in", body = SigninSuccessBody),
        (status = 400, description = "Malformed sign-in message", body = SigninErrorBody),
        (status = 401, description = "Signature does not match signer", body = SigninErrorBody),
        (status = 403, description = "Denied by a sign-in check", body = SigninErrorBody),
        (status = 412, description = "No session backs this attempt", body = SigninErrorBody),
        (status = 503, description = "A collaborator failed", body = SigninErrorBody)
    )
)]
pub async fn signin(
    State(state): State<AppState>,
    session: SessionCookie,
    Json(request): Json<SigninRequest>,
) -> Response {
    state
        .signin
        .complete_attempt(&request.message, &request.signature, session.id())
        .await
        .into_response()
}

/// Complete a sign-in attempt posted as a form and redirect.
#[utoipa::path(
    post,
    path = "/siwe/signin/callback",
    tag = "SiwE",
    request_body(content = SigninRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to the success or error page")
    )
)]
pub async fn signin_callback(
    State(state): State<AppState>,
    session: SessionCookie,
    Form(request): Form<SigninRequest>,
) -> Response {
    let mode = state.http.redirect_mode();
    state
        .signin
        .complete_attempt(&request.message, &request.signature, session.id())
        .await
        .into_response_with(&mode)
}

/// Explain why the last sign-in attempt failed.
#[utoipa::path(
    get,
    path = "/siwe/auth/error",
    tag = "SiwE",
    params(AuthErrorQuery),
    responses(
        (status = 200, description = "Last recorded failure", body = AuthErrorResponse)
    )
)]
pub async fn auth_error(
    State(state): State<AppState>,
    session: SessionCookie,
    Query(query): Query<AuthErrorQuery>,
) -> Result<Json<AuthErrorResponse>, ApiError> {
    let error = match session.id() {
        Some(id) => state.signin.last_error(id).await?,
        None => None,
    };
    Ok(Json(AuthErrorResponse {
        kind: query.error,
        error,
    }))
}

#[utoipa::path(
    get,
    path = "/siwe/session",
    tag = "SiwE",
    responses(
        (status = 200, description = "Session state", body = SessionStatusResponse)
    )
)]
pub async fn session_status(
    State(state): State<AppState>,
    session: SessionCookie,
) -> Result<Json<SessionStatusResponse>, ApiError> {
    let status = match session.id() {
        Some(id) => state.signin.session_status(id).await?,
        None => SessionStatus::default(),
    };
    Ok(Json(status.into()))
}

#[utoipa::path(
    post,
    path = "/siwe/signout",
    tag = "SiwE",
    responses(
        (status = 200, description = "User cleared from the session", body = SignoutResponse)
    )
)]
pub async fn signout(
    State(state): State<AppState>,
    session: SessionCookie,
) -> Result<Json<SignoutResponse>, ApiError> {
    let signed_out = match session.id() {
        Some(id) => state.signin.sign_out(id).await?,
        None => false,
    };
    Ok(Json(SignoutResponse { signed_out }))
}

/// The signed-in user.
#[utoipa::path(
    get,
    path = "/siwe/me",
    tag = "SiwE",
    responses(
        (status = 200, description = "Signed-in user", body = ResolvedUser),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn me(
    State(state): State<AppState>,
    session: SessionCookie,
) -> Result<Json<ResolvedUser>, ApiError> {
    let id = session
        .id()
        .ok_or_else(|| ApiError::unauthorized("Not signed in"))?;
    state
        .signin
        .current_user(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::unauthorized("Not signed in"))
}
