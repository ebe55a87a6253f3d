// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The sign-in boundary consumed by the HTTP layer.
//!
//! A sign-in is two calls against one session identifier:
//!
//! 1. [`SigninService::begin_attempt`] issues a nonce and stores it in the
//!    session.
//! 2. [`SigninService::complete_attempt`] runs the signed message through
//!    the [`SigninPipeline`] and records the outcome in the same session.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::U256;

use super::chain::{ChainProvider, ContractQuery};
use super::check::CheckRegistry;
use super::checks::{
    always_allow, contract_whitelist, minimum_balance, network_match, nonce_binding,
    validity_window, NETWORK_CHECK, WHITELIST_CHECK,
};
use super::error::{SigninError, SigninOutcome};
use super::identity::{ResolvedUser, SessionIdentityResolver};
use super::pipeline::SigninPipeline;
use super::session::{Session, SessionError, SessionStore};
use super::verifier::SignedMessageVerifier;

/// Which built-in checks guard sign-in, and with what parameters.
///
/// The check list always has the same shape:
/// `nonce`, `validity`, `network`, `whitelist`, `balance`.
/// A disabled slot is filled with an always-allow check of the same name.
#[derive(Clone)]
pub struct CheckPolicy {
    pub chain: Arc<dyn ChainProvider>,
    pub require_network_match: bool,
    pub whitelist: Option<Arc<dyn ContractQuery>>,
    pub minimum_balance: U256,
}

impl CheckPolicy {
    /// Cheapest checks first. Nonce and validity are local; the rest hit
    /// the chain.
    pub fn build(&self, sessions: Arc<dyn SessionStore>) -> CheckRegistry {
        let network = if self.require_network_match {
            network_match(Arc::clone(&self.chain))
        } else {
            always_allow(NETWORK_CHECK)
        };
        let whitelist = match &self.whitelist {
            Some(contract) => contract_whitelist(Arc::clone(contract)),
            None => always_allow(WHITELIST_CHECK),
        };

        let mut registry = CheckRegistry::new();
        for check in [
            nonce_binding(sessions),
            validity_window(),
            network,
            whitelist,
            minimum_balance(Arc::clone(&self.chain), self.minimum_balance),
        ] {
            if let Err(e) = registry.register(check) {
                tracing::error!(error = %e, "Skipping duplicate check");
            }
        }
        registry
    }
}

/// Session view returned by [`SigninService::session_status`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStatus {
    pub user: Option<ResolvedUser>,
    pub error: Option<SessionError>,
    pub pending_nonce: bool,
}

#[derive(Clone)]
pub struct SigninService {
    pipeline: SigninPipeline,
    sessions: Arc<dyn SessionStore>,
}

impl SigninService {
    pub fn new(pipeline: SigninPipeline) -> Self {
        Self {
            sessions: Arc::clone(pipeline.sessions()),
            pipeline,
        }
    }

    /// Service with the standard check list for `policy`.
    pub fn with_policy(
        sessions: Arc<dyn SessionStore>,
        policy: &CheckPolicy,
        resolver: SessionIdentityResolver,
        check_timeout: Option<Duration>,
    ) -> Self {
        let pipeline = SigninPipeline::new(
            SignedMessageVerifier::eip191(),
            policy.build(Arc::clone(&sessions)),
            sessions,
            resolver,
        )
        .with_check_timeout(check_timeout);
        Self::new(pipeline)
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn check_names(&self) -> Vec<&str> {
        self.pipeline.checks().names()
    }

    /// Issue a fresh single-use nonce bound to `session_id`.
    ///
    /// Replaces any nonce already pending for the session.
    pub async fn begin_attempt(&self, session_id: &str) -> Result<String, SigninError> {
        let nonce = siwe::generate_nonce();

        let mut session = self.sessions.get(session_id).await?.unwrap_or_default();
        session.nonce = Some(nonce.clone());
        session.error = None;
        self.sessions.set(session_id, session).await?;

        tracing::debug!(session_id, "Issued sign-in nonce");
        Ok(nonce)
    }

    /// Verify, check, and resolve one signed message.
    pub async fn complete_attempt(
        &self,
        raw_message: &str,
        signature: &str,
        session_id: Option<&str>,
    ) -> SigninOutcome {
        self.pipeline.run(raw_message, signature, session_id).await
    }

    pub async fn session_status(&self, session_id: &str) -> Result<SessionStatus, SigninError> {
        let session = self.sessions.get(session_id).await?.unwrap_or_default();
        Ok(SessionStatus {
            pending_nonce: session.nonce.is_some(),
            user: session.user,
            error: session.error,
        })
    }

    /// Signed-in user for `session_id`, if any.
    pub async fn current_user(
        &self,
        session_id: &str,
    ) -> Result<Option<ResolvedUser>, SigninError> {
        Ok(self
            .sessions
            .get(session_id)
            .await?
            .and_then(|session| session.user))
    }

    /// Why the last attempt on `session_id` failed, if it did.
    pub async fn last_error(&self, session_id: &str) -> Result<Option<SessionError>, SigninError> {
        Ok(self
            .sessions
            .get(session_id)
            .await?
            .and_then(|session| session.error))
    }

    /// Drop the signed-in user. Returns whether one was signed in.
    pub async fn sign_out(&self, session_id: &str) -> Result<bool, SigninError> {
        let Some(session) = self.sessions.get(session_id).await? else {
            return Ok(false);
        };
        let was_signed_in = session.user.is_some();

        self.sessions
            .set(
                session_id,
                Session {
                    user: None,
                    nonce: None,
                    ..session
                },
            )
            .await?;

        if was_signed_in {
            tracing::info!(session_id, "Signed out");
        }
        Ok(was_signed_in)
    }

    /// Whether the session store answers.
    pub async fn ready(&self) -> bool {
        self.sessions.get("__readiness_probe__").await.is_ok()
    }
}
