// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Built-in sign-in checks.
//!
//! | Check | Name | Denies when |
//! |-------|------|-------------|
//! | [`nonce_binding`] | `nonce` | stored session nonce is missing or differs |
//! | [`network_match`] | `network` | provider chain id differs from the message |
//! | [`contract_whitelist`] | `whitelist` | `isAddressInList` returns false |
//! | [`minimum_balance`] | `balance` | balance is below the configured minimum |
//! | [`validity_window`] | `validity` | message expired or not yet valid |
//! | [`always_allow`] | caller-chosen | never |
//!
//! Each denial logs the expected and actual values.

use std::sync::Arc;

use alloy::primitives::U256;
use chrono::Utc;

use super::chain::{ChainProvider, ContractQuery};
use super::check::{Check, CheckContext, CheckError};
use super::session::SessionStore;

pub const NONCE_CHECK: &str = "nonce";
pub const NETWORK_CHECK: &str = "network";
pub const WHITELIST_CHECK: &str = "whitelist";
pub const BALANCE_CHECK: &str = "balance";
pub const VALIDITY_CHECK: &str = "validity";

/// Message nonce must equal the nonce stored in the request's session.
///
/// A request without a session identifier, or whose session does not exist,
/// is an error rather than a denial.
pub fn nonce_binding(store: Arc<dyn SessionStore>) -> Check {
    Check::new(NONCE_CHECK, move |ctx| nonce_matches(Arc::clone(&store), ctx))
        .with_denial_message(
            "This sign-in request has expired or was already used. Please try again.",
        )
}

async fn nonce_matches(
    store: Arc<dyn SessionStore>,
    ctx: CheckContext,
) -> Result<bool, CheckError> {
    let session_id = ctx
        .session_id
        .as_deref()
        .ok_or(CheckError::MissingSessionId)?;
    let session = store
        .get(session_id)
        .await?
        .ok_or_else(|| CheckError::SessionNotFound(session_id.to_string()))?;

    match session.nonce.as_deref() {
        Some(expected) if expected == ctx.message.nonce => {
            tracing::debug!(nonce = expected, "Nonce match");
            Ok(true)
        }
        expected => {
            tracing::info!(
                expected = ?expected,
                actual = %ctx.message.nonce,
                "Nonce mismatch"
            );
            Ok(false)
        }
    }
}

/// Provider's chain id must equal the message's chain id.
pub fn network_match(provider: Arc<dyn ChainProvider>) -> Check {
    Check::new(NETWORK_CHECK, move |ctx| {
        same_network(Arc::clone(&provider), ctx)
    })
    .with_denial_message("Please switch your wallet to the supported network and sign in again.")
}

async fn same_network(
    provider: Arc<dyn ChainProvider>,
    ctx: CheckContext,
) -> Result<bool, CheckError> {
    let chain_id = provider.chain_id().await?;
    if chain_id != ctx.message.chain_id {
        tracing::info!(
            expected = chain_id,
            actual = ctx.message.chain_id,
            "Chain ID mismatch"
        );
        return Ok(false);
    }
    Ok(true)
}

/// Signer must be listed in the allow-list contract.
pub fn contract_whitelist(contract: Arc<dyn ContractQuery>) -> Check {
    Check::new(WHITELIST_CHECK, move |ctx| {
        address_listed(Arc::clone(&contract), ctx)
    })
    .with_denial_message("This address has not been granted access.")
}

async fn address_listed(
    contract: Arc<dyn ContractQuery>,
    ctx: CheckContext,
) -> Result<bool, CheckError> {
    let address = ctx.message.address;
    let listed = contract.is_address_in_list(address).await?;
    tracing::info!(
        address = %address,
        contract = %contract.contract_address(),
        chain_id = ctx.message.chain_id,
        listed,
        "Allow-list lookup"
    );
    Ok(listed)
}

/// Signer's native balance must be at least `minimum` wei (inclusive).
///
/// A zero minimum passes without querying the provider.
pub fn minimum_balance(provider: Arc<dyn ChainProvider>, minimum: U256) -> Check {
    Check::new(BALANCE_CHECK, move |ctx| {
        balance_at_least(Arc::clone(&provider), minimum, ctx)
    })
    .with_denial_message("This address does not hold enough funds to sign in.")
}

async fn balance_at_least(
    provider: Arc<dyn ChainProvider>,
    minimum: U256,
    ctx: CheckContext,
) -> Result<bool, CheckError> {
    if minimum.is_zero() {
        return Ok(true);
    }

    let balance = provider.balance(ctx.message.address).await?;
    if balance < minimum {
        tracing::info!(
            address = %ctx.message.address,
            expected_min = %minimum,
            actual = %balance,
            "Balance below minimum"
        );
        return Ok(false);
    }
    Ok(true)
}

/// Message must be inside its `Not Before` / `Expiration Time` window.
pub fn validity_window() -> Check {
    Check::new(VALIDITY_CHECK, within_validity_window)
        .with_denial_message("This sign-in message is outside its validity window.")
}

async fn within_validity_window(ctx: CheckContext) -> Result<bool, CheckError> {
    let now = Utc::now();
    if ctx.message.is_expired_at(now) {
        tracing::info!(
            expiration_time = ?ctx.message.expiration_time,
            now = %now,
            "Message expired"
        );
        return Ok(false);
    }
    if ctx.message.is_not_yet_valid_at(now) {
        tracing::info!(
            not_before = ?ctx.message.not_before,
            now = %now,
            "Message not yet valid"
        );
        return Ok(false);
    }
    Ok(true)
}

/// Placeholder for a disabled slot in a fixed-shape pipeline.
pub fn always_allow(name: impl Into<String>) -> Check {
    Check::new(name, allow)
}

async fn allow(_ctx: CheckContext) -> Result<bool, CheckError> {
    Ok(true)
}
