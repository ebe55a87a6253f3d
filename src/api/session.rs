// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the session cookie.
//!
//! ```rust,ignore
//! async fn my_handler(session: SessionCookie, State(state): State<AppState>) {
//!     let id = session.id(); // None when the request carries no cookie
//! }
//! ```
//!
//! Cookie values may be raw ids or express-style signed values
//! (`s:<id>.<signature>`, usually URL-encoded). The signature part is
//! stripped, not verified: ids are random UUIDs issued by this server.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts, HeaderValue},
};
use uuid::Uuid;

use crate::state::AppState;

/// Session identifier carried by the request, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie(pub Option<String>);

impl SessionCookie {
    pub fn id(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Existing id, or a new one with the `Set-Cookie` header that binds it.
    pub fn id_or_issue(&self, cookie_name: &str) -> (String, Option<HeaderValue>) {
        match &self.0 {
            Some(id) => (id.clone(), None),
            None => {
                let id = Uuid::new_v4().to_string();
                let header = set_cookie_header(cookie_name, &id);
                (id, header)
            }
        }
    }
}

impl FromRequestParts<AppState> for SessionCookie {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let name = state.http.session_cookie_name.as_str();
        let id = parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|header| find_cookie(header, name))
            .and_then(|raw| session_id_from_cookie(&raw));
        Ok(SessionCookie(id))
    }
}

/// Value of cookie `name` in a `Cookie` header.
fn find_cookie(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.trim_matches('"').to_string())
    })
}

/// Session id inside a (possibly signed, possibly URL-encoded) cookie value.
fn session_id_from_cookie(raw: &str) -> Option<String> {
    let decoded = url::form_urlencoded::parse(format!("v={raw}").as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())?;

    let id = match decoded.strip_prefix("s:") {
        Some(signed) => signed
            .rsplit_once('.')
            .map(|(id, _signature)| id)
            .unwrap_or(signed),
        None => decoded.as_str(),
    };

    (!id.is_empty()).then(|| id.to_string())
}

fn set_cookie_header(name: &str, id: &str) -> Option<HeaderValue> {
    match HeaderValue::from_str(&format!("{name}={id}; Path=/; HttpOnly; SameSite=Lax")) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!(error = %e, cookie = name, "Cannot encode session cookie");
            None
        }
    }
}
