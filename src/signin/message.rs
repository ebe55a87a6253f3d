// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Parsed Sign-in with Ethereum message.
//!
//! The EIP-4361 text grammar is handled by the `siwe` crate. This module
//! converts its output into the immutable value the sign-in pipeline and
//! checks consume.

use std::str::FromStr;

use alloy::primitives::Address;
use chrono::{DateTime, Utc};

/// Errors raised while turning raw text into a [`SiweMessage`].
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("sign-in message is empty")]
    Empty,

    #[error("malformed sign-in message: {0}")]
    Malformed(String),

    #[error("invalid sign-in message field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// A parsed, structurally valid SiwE message.
///
/// Immutable once parsed. Domain, statement, URI and resources are carried
/// through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiweMessage {
    pub domain: String,
    pub address: Address,
    pub statement: Option<String>,
    pub uri: String,
    pub version: String,
    pub chain_id: u64,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
    pub expiration_time: Option<DateTime<Utc>>,
    pub not_before: Option<DateTime<Utc>>,
    pub request_id: Option<String>,
    pub resources: Vec<String>,
}

impl SiweMessage {
    /// Parse EIP-4361 message text.
    pub fn parse(raw: &str) -> Result<Self, MessageError> {
        if raw.trim().is_empty() {
            return Err(MessageError::Empty);
        }

        let parsed =
            siwe::Message::from_str(raw).map_err(|e| MessageError::Malformed(e.to_string()))?;

        Ok(Self {
            domain: parsed.domain.to_string(),
            address: Address::from(parsed.address),
            statement: parsed.statement.clone(),
            uri: parsed.uri.to_string(),
            version: match parsed.version {
                siwe::Version::V1 => "1".to_string(),
            },
            chain_id: parsed.chain_id,
            nonce: parsed.nonce.clone(),
            issued_at: parse_timestamp("Issued At", &parsed.issued_at.to_string())?,
            expiration_time: parsed
                .expiration_time
                .as_ref()
                .map(|t| parse_timestamp("Expiration Time", &t.to_string()))
                .transpose()?,
            not_before: parsed
                .not_before
                .as_ref()
                .map(|t| parse_timestamp("Not Before", &t.to_string()))
                .transpose()?,
            request_id: parsed.request_id.clone(),
            resources: parsed.resources.iter().map(|r| r.to_string()).collect(),
        })
    }

    /// Composite identifier `"{chainId}:{address}"` used as the user id.
    pub fn composite_id(&self) -> String {
        composite_id(self.chain_id, &self.address)
    }

    /// Whether `Expiration Time` lies before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration_time.is_some_and(|exp| exp <= now)
    }

    /// Whether `Not Before` lies after `now`.
    pub fn is_not_yet_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.not_before.is_some_and(|nbf| nbf > now)
    }
}

/// Build the composite identifier for a signer on a chain.
pub fn composite_id(chain_id: u64, address: &Address) -> String {
    format!("{chain_id}:{}", address.to_checksum(None))
}

fn parse_timestamp(field: &'static str, raw: &str) -> Result<DateTime<Utc>, MessageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| MessageError::InvalidField {
            field,
            reason: e.to_string(),
        })
}
