// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The sign-in check abstraction.
//!
//! A [`Check`] is a named value holding a predicate closure over one
//! external collaborator. Checks are built once at configuration time and
//! shared by every sign-in attempt, so predicates must be safe to call
//! concurrently.
//!
//! A predicate has three outcomes:
//!
//! - `Ok(true)`: the attempt may proceed
//! - `Ok(false)`: the check denies the attempt
//! - `Err(CheckError)`: the collaborator failed; this is not a denial

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use super::chain::ChainError;
use super::message::SiweMessage;
use super::session::SessionStoreError;

/// Operational failure inside a check predicate.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("request carries no session identifier")]
    MissingSessionId,

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error(transparent)]
    SessionStore(#[from] SessionStoreError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("check did not complete within {0:?}")]
    Timeout(Duration),
}

/// What a predicate sees for one sign-in attempt.
#[derive(Debug, Clone)]
pub struct CheckContext {
    /// The parsed, signature-verified message
    pub message: Arc<SiweMessage>,
    /// Session identifier carried by the request, if any
    pub session_id: Option<String>,
}

impl CheckContext {
    pub fn new(message: SiweMessage, session_id: Option<String>) -> Self {
        Self {
            message: Arc::new(message),
            session_id,
        }
    }
}

pub type CheckFuture = Pin<Box<dyn Future<Output = Result<bool, CheckError>> + Send>>;

type Predicate = Arc<dyn Fn(CheckContext) -> CheckFuture + Send + Sync>;

/// A named unit of sign-in authorization logic.
#[derive(Clone)]
pub struct Check {
    name: String,
    denial_message: String,
    predicate: Predicate,
}

impl Check {
    pub fn new<F, Fut>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(CheckContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, CheckError>> + Send + 'static,
    {
        let name = name.into();
        Self {
            denial_message: format!("Sign-in was denied by the {name} check."),
            name,
            predicate: Arc::new(move |ctx: CheckContext| -> CheckFuture {
                Box::pin(predicate(ctx))
            }),
        }
    }

    /// Replace the default user-facing denial explanation.
    pub fn with_denial_message(mut self, message: impl Into<String>) -> Self {
        self.denial_message = message.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn denial_message(&self) -> &str {
        &self.denial_message
    }

    pub async fn evaluate(&self, ctx: CheckContext) -> Result<bool, CheckError> {
        (self.predicate)(ctx).await
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("name", &self.name)
            .field("denial_message", &self.denial_message)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("a check named `{0}` is already registered")]
pub struct DuplicateCheck(pub String);

/// Ordered set of checks with unique names.
///
/// Registration order is evaluation order.
#[derive(Debug, Clone, Default)]
pub struct CheckRegistry {
    checks: Vec<Check>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, check: Check) -> Result<(), DuplicateCheck> {
        if self.checks.iter().any(|c| c.name == check.name) {
            return Err(DuplicateCheck(check.name));
        }
        self.checks.push(check);
        Ok(())
    }

    pub fn names(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}
