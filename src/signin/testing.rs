// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process fakes and message builders for sign-in tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};

use super::chain::{ChainError, ChainProvider, ContractQuery};
use super::check::{Check, CheckContext, CheckError};
use super::identity::{ResolvedUser, UserLoader, UserLoaderError};
use super::message::SiweMessage;
use super::session::{Session, SessionStore, SessionStoreError};

pub const TEST_ADDRESS: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

/// Fields of a test sign-in message.
#[derive(Debug, Clone)]
pub struct MessageSpec {
    pub domain: String,
    pub address: String,
    pub statement: Option<String>,
    pub chain_id: u64,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
    pub expiration_time: Option<DateTime<Utc>>,
    pub not_before: Option<DateTime<Utc>>,
}

impl MessageSpec {
    /// `address` must be EIP-55 checksummed.
    pub fn new(address: &str, chain_id: u64, nonce: &str) -> Self {
        Self {
            domain: "login.example.com".to_string(),
            address: address.to_string(),
            statement: Some("Sign in to the Relational demo.".to_string()),
            chain_id,
            nonce: nonce.to_string(),
            issued_at: Utc::now(),
            expiration_time: None,
            not_before: None,
        }
    }

    pub fn for_signer(signer: &PrivateKeySigner, chain_id: u64, nonce: &str) -> Self {
        Self::new(&signer.address().to_checksum(None), chain_id, nonce)
    }
}

fn timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Render an EIP-4361 message.
pub fn build_message(spec: &MessageSpec) -> String {
    let mut lines = vec![
        format!(
            "{} wants you to sign in with your Ethereum account:",
            spec.domain
        ),
        spec.address.clone(),
        String::new(),
    ];
    match &spec.statement {
        Some(statement) => {
            lines.push(statement.clone());
            lines.push(String::new());
        }
        None => lines.push(String::new()),
    }
    lines.push(format!("URI: https://{}", spec.domain));
    lines.push("Version: 1".to_string());
    lines.push(format!("Chain ID: {}", spec.chain_id));
    lines.push(format!("Nonce: {}", spec.nonce));
    lines.push(format!("Issued At: {}", timestamp(&spec.issued_at)));
    if let Some(exp) = &spec.expiration_time {
        lines.push(format!("Expiration Time: {}", timestamp(exp)));
    }
    if let Some(nbf) = &spec.not_before {
        lines.push(format!("Not Before: {}", timestamp(nbf)));
    }
    lines.join("\n")
}

/// Deterministic signer from a repeated key byte.
pub fn test_signer(byte: u8) -> PrivateKeySigner {
    PrivateKeySigner::from_bytes(&B256::from([byte; 32])).unwrap()
}

/// EIP-191 signature over `raw`, `0x`-prefixed hex.
pub fn sign(signer: &PrivateKeySigner, raw: &str) -> String {
    let signature = signer.sign_message_sync(raw.as_bytes()).unwrap();
    alloy::hex::encode_prefixed(signature.as_bytes())
}

/// Parsed message for [`TEST_ADDRESS`].
pub fn sample_message(chain_id: u64, nonce: &str) -> SiweMessage {
    SiweMessage::parse(&build_message(&MessageSpec::new(
        TEST_ADDRESS,
        chain_id,
        nonce,
    )))
    .unwrap()
}

/// Chain provider with a fixed answer and call counters.
#[derive(Debug, Default)]
pub struct FakeChain {
    chain_id: u64,
    balance: U256,
    failing: bool,
    delay: Option<Duration>,
    chain_id_calls: AtomicUsize,
    balance_calls: AtomicUsize,
}

impl FakeChain {
    pub fn new(chain_id: u64, balance: u64) -> Self {
        Self {
            chain_id,
            balance: U256::from(balance),
            ..Default::default()
        }
    }

    /// Provider whose every call fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn chain_id_calls(&self) -> usize {
        self.chain_id_calls.load(Ordering::SeqCst)
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    async fn respond<T>(&self, value: T) -> Result<T, ChainError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(ChainError::RpcError("connection refused".to_string()));
        }
        Ok(value)
    }
}

#[async_trait]
impl ChainProvider for FakeChain {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        self.chain_id_calls.fetch_add(1, Ordering::SeqCst);
        self.respond(self.chain_id).await
    }

    async fn balance(&self, _address: Address) -> Result<U256, ChainError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        self.respond(self.balance).await
    }
}

/// Allow-list contract with a fixed answer.
#[derive(Debug)]
pub struct FakeWhitelist {
    answer: Result<bool, ChainError>,
}

impl FakeWhitelist {
    pub fn new(listed: bool) -> Self {
        Self { answer: Ok(listed) }
    }

    pub fn failing() -> Self {
        Self {
            answer: Err(ChainError::ContractError("execution reverted".to_string())),
        }
    }
}

#[async_trait]
impl ContractQuery for FakeWhitelist {
    fn contract_address(&self) -> Address {
        Address::ZERO
    }

    async fn is_address_in_list(&self, _address: Address) -> Result<bool, ChainError> {
        self.answer.clone()
    }
}

/// Session store whose every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingSessionStore;

#[async_trait]
impl SessionStore for FailingSessionStore {
    async fn get(&self, _session_id: &str) -> Result<Option<Session>, SessionStoreError> {
        Err(SessionStoreError::Unavailable("store offline".to_string()))
    }

    async fn set(&self, _session_id: &str, _session: Session) -> Result<(), SessionStoreError> {
        Err(SessionStoreError::Unavailable("store offline".to_string()))
    }
}

/// User loader whose every lookup fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingUserLoader;

#[async_trait]
impl UserLoader for FailingUserLoader {
    fn name(&self) -> &str {
        "failing"
    }

    async fn load(&self, composite_id: &str) -> Result<ResolvedUser, UserLoaderError> {
        Err(UserLoaderError {
            loader: self.name().to_string(),
            id: composite_id.to_string(),
            reason: "directory unreachable".to_string(),
        })
    }
}

/// Shared record of which checks ran, in order.
#[derive(Debug, Default, Clone)]
pub struct InvocationLog(Arc<Mutex<Vec<String>>>);

impl InvocationLog {
    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn push(&self, name: &str) {
        self.0.lock().unwrap().push(name.to_string());
    }
}

/// Check that logs its invocation and returns `result`.
pub fn recording_check(
    name: &str,
    result: Result<bool, ChainError>,
    log: &InvocationLog,
) -> Check {
    let log = log.clone();
    let label = name.to_string();
    Check::new(name, move |_ctx: CheckContext| {
        let log = log.clone();
        let label = label.clone();
        let result = result.clone();
        async move {
            log.push(&label);
            result.map_err(CheckError::from)
        }
    })
}
