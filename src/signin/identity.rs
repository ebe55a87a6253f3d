// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Mapping a verified signer to a user record.

use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::message::composite_id;

/// Identity established by a successful sign-in.
///
/// Built fresh per sign-in and only ever replaced, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResolvedUser {
    /// Composite `"{chainId}:{address}"` identifier (unless a loader overrides it)
    pub id: String,
    pub name: String,
    pub email: String,
}

impl ResolvedUser {
    /// Placeholder identity with every field set to the composite id.
    pub fn synthetic(composite_id: impl Into<String>) -> Self {
        let id = composite_id.into();
        Self {
            name: id.clone(),
            email: id.clone(),
            id,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("user loader `{loader}` failed for {id}: {reason}")]
pub struct UserLoaderError {
    pub loader: String,
    pub id: String,
    pub reason: String,
}

/// External lookup of a user by composite id.
#[async_trait]
pub trait UserLoader: Send + Sync {
    fn name(&self) -> &str;

    async fn load(&self, composite_id: &str) -> Result<ResolvedUser, UserLoaderError>;
}

/// Loader that fabricates a plausible profile from the address.
///
/// `name` is the hex part of the address after `0x`, and `email` is
/// `{name}@example.com`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DemoUserLoader;

#[async_trait]
impl UserLoader for DemoUserLoader {
    fn name(&self) -> &str {
        "demo"
    }

    async fn load(&self, composite_id: &str) -> Result<ResolvedUser, UserLoaderError> {
        let name = composite_id
            .split_once("0x")
            .map(|(_, hex)| hex)
            .filter(|hex| !hex.is_empty())
            .ok_or_else(|| UserLoaderError {
                loader: self.name().to_string(),
                id: composite_id.to_string(),
                reason: "identifier does not contain an address".to_string(),
            })?;

        Ok(ResolvedUser {
            id: composite_id.to_string(),
            name: name.to_string(),
            email: format!("{name}@example.com"),
        })
    }
}

/// Resolves the session user for a verified signer.
#[derive(Clone, Default)]
pub struct SessionIdentityResolver {
    loader: Option<Arc<dyn UserLoader>>,
}

impl SessionIdentityResolver {
    pub fn new(loader: Option<Arc<dyn UserLoader>>) -> Self {
        Self { loader }
    }

    /// Resolve `chain_id:address`, trusting a configured loader verbatim.
    pub async fn resolve(
        &self,
        chain_id: u64,
        address: &Address,
    ) -> Result<ResolvedUser, UserLoaderError> {
        let id = composite_id(chain_id, address);
        match &self.loader {
            Some(loader) => {
                let user = loader.load(&id).await?;
                tracing::info!(loader = loader.name(), user_id = %user.id, "Loaded user");
                Ok(user)
            }
            None => {
                tracing::info!(user_id = %id, "Constructed user");
                Ok(ResolvedUser::synthetic(id))
            }
        }
    }
}
