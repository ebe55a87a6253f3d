// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The sign-in pipeline.
//!
//! ```text
//! Verifying ──ok──▶ Checking(0) ──true──▶ … Checking(n-1) ──true──▶ Resolving ──▶ Authenticated
//!     │                  │ false / error
//!     ▼                  ▼
//!  Denied(InvalidMessage | InvalidSignature)   Denied(check) | Errored(cause)
//! ```
//!
//! Checks run strictly one after another in registration order and the
//! first `false` or error ends the attempt, so later (usually more
//! expensive) checks never see a message an earlier check rejected. No
//! state is revisited and nothing is retried.
//!
//! Every terminal state is recorded into the request's session before
//! control returns. The stored nonce is cleared at the same time, so a
//! nonce backs at most one attempt.
//!
//! Two attempts racing under the same session identifier are not
//! serialized: the session store's last write wins.

use std::sync::Arc;
use std::time::Duration;

use super::check::{Check, CheckContext, CheckError, CheckRegistry};
use super::error::{Denial, SigninError, SigninOutcome};
use super::identity::SessionIdentityResolver;
use super::session::{Session, SessionStore, SessionStoreError};
use super::verifier::{SignedMessageVerifier, VerificationError};

/// Verification, ordered checks, and identity resolution for one attempt.
#[derive(Clone)]
pub struct SigninPipeline {
    verifier: SignedMessageVerifier,
    checks: CheckRegistry,
    sessions: Arc<dyn SessionStore>,
    resolver: SessionIdentityResolver,
    check_timeout: Option<Duration>,
}

impl SigninPipeline {
    pub fn new(
        verifier: SignedMessageVerifier,
        checks: CheckRegistry,
        sessions: Arc<dyn SessionStore>,
        resolver: SessionIdentityResolver,
    ) -> Self {
        Self {
            verifier,
            checks,
            sessions,
            resolver,
            check_timeout: None,
        }
    }

    /// Bound each predicate invocation; expiry errors the attempt.
    pub fn with_check_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.check_timeout = timeout;
        self
    }

    pub fn checks(&self) -> &CheckRegistry {
        &self.checks
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Run one attempt to a terminal state and record it in the session.
    pub async fn run(
        &self,
        raw_message: &str,
        signature: &str,
        session_id: Option<&str>,
    ) -> SigninOutcome {
        let outcome = self.evaluate(raw_message, signature, session_id).await;

        match self.record(session_id, &outcome).await {
            Ok(()) => outcome,
            Err(err) if outcome.is_authenticated() => {
                tracing::error!(error = %err, "Failed to persist authenticated session");
                SigninOutcome::Errored(err.into())
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to record sign-in failure in session");
                outcome
            }
        }
    }

    async fn evaluate(
        &self,
        raw_message: &str,
        signature: &str,
        session_id: Option<&str>,
    ) -> SigninOutcome {
        let message = match self.verifier.verify(raw_message, signature).await {
            Ok(message) => message,
            Err(VerificationError::InvalidMessage(e)) => {
                tracing::info!(error = %e, "Rejected malformed sign-in message");
                return SigninOutcome::Denied(Denial::InvalidMessage(e.to_string()));
            }
            Err(VerificationError::InvalidSignature) => {
                tracing::info!("Rejected sign-in message with invalid signature");
                return SigninOutcome::Denied(Denial::InvalidSignature);
            }
        };

        let ctx = CheckContext::new(message, session_id.map(str::to_string));

        for (index, check) in self.checks.iter().enumerate() {
            match self.evaluate_check(check, ctx.clone()).await {
                Ok(true) => {
                    tracing::debug!(check = check.name(), index, "Sign-in check passed");
                }
                Ok(false) => {
                    tracing::info!(
                        check = check.name(),
                        index,
                        address = %ctx.message.address,
                        "Sign-in denied"
                    );
                    return SigninOutcome::Denied(Denial::Check {
                        name: check.name().to_string(),
                        message: check.denial_message().to_string(),
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        check = check.name(),
                        index,
                        error = %err,
                        "Sign-in check failed"
                    );
                    return SigninOutcome::Errored(SigninError::from_check(check.name(), err));
                }
            }
        }

        match self
            .resolver
            .resolve(ctx.message.chain_id, &ctx.message.address)
            .await
        {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Sign-in succeeded");
                SigninOutcome::Authenticated(user)
            }
            Err(err) => {
                tracing::warn!(error = %err, "User resolution failed");
                SigninOutcome::Errored(err.into())
            }
        }
    }

    async fn evaluate_check(&self, check: &Check, ctx: CheckContext) -> Result<bool, CheckError> {
        match self.check_timeout {
            Some(limit) => tokio::time::timeout(limit, check.evaluate(ctx))
                .await
                .map_err(|_| CheckError::Timeout(limit))?,
            None => check.evaluate(ctx).await,
        }
    }

    /// Write the terminal state into the session and consume its nonce.
    ///
    /// Failures are only recorded into sessions that already exist and
    /// leave a signed-in user in place. A success creates the session if
    /// the store has none for the id.
    async fn record(
        &self,
        session_id: Option<&str>,
        outcome: &SigninOutcome,
    ) -> Result<(), SessionStoreError> {
        let Some(session_id) = session_id else {
            return Ok(());
        };

        let mut session = match self.sessions.get(session_id).await? {
            Some(session) => session,
            None if outcome.is_authenticated() => Session::default(),
            None => {
                tracing::debug!(session_id, "No session to record sign-in failure in");
                return Ok(());
            }
        };

        session.nonce = None;
        match outcome {
            SigninOutcome::Authenticated(user) => {
                session.user = Some(user.clone());
                session.error = None;
            }
            SigninOutcome::Denied(denial) => {
                session.error = Some(denial.to_session_error());
            }
            SigninOutcome::Errored(err) => {
                session.error = Some(err.to_session_error());
            }
        }

        self.sessions.set(session_id, session).await
    }
}
