// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::blockchain::EvmClient;
use crate::config::{SigninConfig, UserLoaderKind};
use crate::signin::{
    ChainError, CheckPolicy, ContractQuery, DemoUserLoader, InMemorySessionStore, ResponseMode,
    SessionIdentityResolver, SessionStore, SigninService, UserLoader,
};

/// Cookie and redirect settings the HTTP layer needs per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub session_cookie_name: String,
    pub success_redirect: String,
    pub error_redirect: String,
}

impl HttpSettings {
    pub fn redirect_mode(&self) -> ResponseMode {
        ResponseMode::Redirect {
            success: self.success_redirect.clone(),
            error: self.error_redirect.clone(),
        }
    }
}

impl From<&SigninConfig> for HttpSettings {
    fn from(config: &SigninConfig) -> Self {
        Self {
            session_cookie_name: config.session_cookie_name.clone(),
            success_redirect: config.success_redirect.clone(),
            error_redirect: config.error_redirect.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub signin: SigninService,
    pub http: Arc<HttpSettings>,
}

impl AppState {
    pub fn new(signin: SigninService, http: HttpSettings) -> Self {
        Self {
            signin,
            http: Arc::new(http),
        }
    }

    /// Wire the chain client, session store and checks described by `config`.
    pub fn from_config(config: &SigninConfig) -> Result<Self, ChainError> {
        let client = EvmClient::new(&config.rpc_url)?;

        let whitelist = match config.whitelist_contract {
            Some(address) => {
                let contract = client.address_list(&address.to_checksum(None))?;
                Some(Arc::new(contract) as Arc<dyn ContractQuery>)
            }
            None => None,
        };

        let policy = CheckPolicy {
            chain: Arc::new(client),
            require_network_match: config.require_network_match,
            whitelist,
            minimum_balance: config.minimum_balance,
        };

        let loader: Option<Arc<dyn UserLoader>> = match config.user_loader {
            UserLoaderKind::None => None,
            UserLoaderKind::Demo => Some(Arc::new(DemoUserLoader)),
        };

        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(
            config.session_capacity,
            config.session_ttl,
        ));

        let signin = SigninService::with_policy(
            sessions,
            &policy,
            SessionIdentityResolver::new(loader),
            config.check_timeout,
        );

        tracing::info!(
            rpc_url = %config.rpc_url,
            checks = ?signin.check_names(),
            whitelist = ?config.whitelist_contract,
            minimum_balance = %config.minimum_balance,
            "Sign-in service configured"
        );

        Ok(Self::new(signin, HttpSettings::from(config)))
    }
}
