//! IOU Settlement
//!
//! Flows that move value on the IOU ledger: issuing cash, issuing IOUs and
//! paying them back out of vault cash.
//!
//! # Architecture
//!
//! 1. **Lookup**: find the IOU and the borrower's cash through the [`Vault`]
//! 2. **Selection**: page through cash lazily until the debt is covered
//! 3. **Verification**: every proposal passes the ledger verifier
//! 4. **Acceptance**: the counterparty's own checks run before it signs
//!
//! Only cash created by the configured issuer is ever selected or accepted.
//!
//! # Example
//!
//! ```
//! use ledger_core::{crypto::KeyPair, LedgerVerifier, Party};
//! use settlement::{flows, Config, FlowContext, InMemoryVault};
//!
//! # fn main() -> settlement::Result<()> {
//! let bank = Party::new("Bank", KeyPair::generate().public_key());
//! let lender = Party::new("Lender", KeyPair::generate().public_key());
//! let borrower = Party::new("Borrower", KeyPair::generate().public_key());
//!
//! let vault = InMemoryVault::new();
//! let verifier = LedgerVerifier::new();
//! let config = Config::new(bank);
//! let ctx = FlowContext::new(&vault, &verifier, &config);
//!
//! let issued = flows::issue_iou(&ctx, &lender, &borrower, 10)?;
//! let linear_id = issued.transaction.obligation_outputs()[0].linear_id;
//! vault.record(&issued)?;
//!
//! let settled = flows::payback(&ctx, &borrower, linear_id)?;
//! vault.record(&settled)?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod error;
pub mod finder;
pub mod flows;
pub mod vault;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use flows::{FlowContext, ProposedTransaction};
pub use vault::{
    InMemoryVault, Page, PageSpecification, PagedStates, QueryCriteria, StateAndRef, StateRef,
    Vault,
};
