// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sign-in with Ethereum.
//!
//! ## Flow
//!
//! 1. The client asks for a nonce ([`SigninService::begin_attempt`])
//! 2. The wallet signs an EIP-4361 message carrying that nonce
//! 3. [`SigninService::complete_attempt`] verifies the signature, runs the
//!    configured [`Check`]s in order, and resolves the user
//!
//! ## Modules
//!
//! - `message` - Parsed SiwE message
//! - `verifier` - Structure and EIP-191 signature verification
//! - `check` / `checks` - Check abstraction and built-in checks
//! - `pipeline` - The attempt state machine
//! - `identity` - Signer to user resolution
//! - `session` - Session record and store contract
//! - `error` - Denials, operational errors, and their responses
//! - `service` - Boundary used by the HTTP layer

pub mod chain;
pub mod check;
pub mod checks;
pub mod error;
pub mod identity;
pub mod message;
pub mod pipeline;
pub mod service;
pub mod session;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testing;

pub use chain::{ChainError, ChainProvider, ContractQuery};
pub use check::{Check, CheckContext, CheckError, CheckRegistry};
pub use error::{Denial, ResponseMode, SigninError, SigninOutcome};
pub use identity::{DemoUserLoader, ResolvedUser, SessionIdentityResolver, UserLoader};
pub use message::{MessageError, SiweMessage};
pub use pipeline::SigninPipeline;
pub use service::{CheckPolicy, SessionStatus, SigninService};
pub use session::{InMemorySessionStore, Session, SessionError, SessionStore, SessionStoreError};
pub use verifier::{Eip191Verifier, SignatureVerifier, SignedMessageVerifier};
