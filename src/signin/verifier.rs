// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed-message verification.
//!
//! [`SignedMessageVerifier`] is the first stage of every sign-in attempt:
//! it turns `(message, signature)` into a [`SiweMessage`] or fails with
//! [`VerificationError`]. It never touches the session store or the chain.

use std::sync::Arc;

use alloy::primitives::{Address, Signature};
use async_trait::async_trait;

use super::message::{MessageError, SiweMessage};

/// Parsing and signature-authenticity capability.
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    /// Parse raw message text into a structurally valid message.
    fn parse(&self, raw_message: &str) -> Result<SiweMessage, MessageError>;

    /// Whether `signature` was produced by `claimed` over exactly
    /// `raw_message`.
    async fn verify(&self, raw_message: &str, claimed: Address, signature: &str) -> bool;
}

/// EIP-191 `personal_sign` verification for externally owned accounts.
#[derive(Debug, Default, Clone, Copy)]
pub struct Eip191Verifier;

#[async_trait]
impl SignatureVerifier for Eip191Verifier {
    fn parse(&self, raw_message: &str) -> Result<SiweMessage, MessageError> {
        SiweMessage::parse(raw_message)
    }

    async fn verify(&self, raw_message: &str, claimed: Address, signature: &str) -> bool {
        let bytes = match alloy::hex::decode(signature.trim()) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(error = %e, "Signature is not valid hex");
                return false;
            }
        };

        let signature = match Signature::try_from(bytes.as_slice()) {
            Ok(signature) => signature,
            Err(e) => {
                tracing::debug!(error = %e, "Signature has an invalid encoding");
                return false;
            }
        };

        match signature.recover_address_from_msg(raw_message.as_bytes()) {
            Ok(recovered) => {
                if recovered != claimed {
                    tracing::debug!(
                        claimed = %claimed,
                        recovered = %recovered,
                        "Signature recovers to a different address"
                    );
                }
                recovered == claimed
            }
            Err(e) => {
                tracing::debug!(error = %e, "Signature recovery failed");
                false
            }
        }
    }
}

/// Why a raw `(message, signature)` pair was rejected.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error(transparent)]
    InvalidMessage(#[from] MessageError),

    #[error("signature does not match the message signer")]
    InvalidSignature,
}

/// Validates message structure, then signature authenticity.
///
/// Idempotent and side-effect free.
#[derive(Clone)]
pub struct SignedMessageVerifier {
    verifier: Arc<dyn SignatureVerifier>,
}

impl SignedMessageVerifier {
    pub fn new(verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self { verifier }
    }

    /// Verifier backed by [`Eip191Verifier`].
    pub fn eip191() -> Self {
        Self::new(Arc::new(Eip191Verifier))
    }

    pub async fn verify(
        &self,
        raw_message: &str,
        signature: &str,
    ) -> Result<SiweMessage, VerificationError> {
        let message = self.verifier.parse(raw_message)?;

        if !self
            .verifier
            .verify(raw_message, message.address, signature)
            .await
        {
            return Err(VerificationError::InvalidSignature);
        }

        Ok(message)
    }
}

impl Default for SignedMessageVerifier {
    fn default() -> Self {
        Self::eip191()
    }
}
