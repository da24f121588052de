//! IOU Ledger Core
//!
//! Deterministic transaction verification for a cash and IOU ledger.
//!
//! # Architecture
//!
//! - **Records**: immutable cash and obligation states, consumed and re-created
//! - **Contracts**: one rule engine per record family, each an ordered list of clauses
//! - **Verifier**: runs every involved contract; all of them must accept
//! - **Safe arithmetic**: every total is overflow-checked
//!
//! # Invariants
//!
//! - Cash conservation: Σ(inputs) == Σ(outputs) for every move
//! - Creator invariance: a cash lineage keeps its issuer
//! - Signer sufficiency: consumed cash is signed for by its owner
//! - An IOU is created once and destroyed only by exact payback

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod arithmetic;
pub mod config;
pub mod contracts;
pub mod crypto;
pub mod error;
pub mod metrics;
pub mod types;
pub mod verifier;

// Re-exports
pub use config::Config;
pub use contracts::{CashContract, Contract, ContractId, ObligationContract, Rejection, ViolationKind};
pub use error::{Error, Result};
pub use metrics::VerifierMetrics;
pub use types::{
    CashCommand, CashRecord, Command, CommandData, LedgerRecord, LinearId, ObligationCommand,
    ObligationRecord, Party, Transaction, TransactionBuilder, TxId,
};
pub use verifier::{LedgerVerifier, RejectionReport, Verdict};
