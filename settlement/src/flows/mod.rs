//! Settlement flows
//!
//! Each flow assembles a transaction on the initiator's side, runs it
//! through the ledger verifier and then applies the counterparty's
//! acceptance checks. The result is a [`ProposedTransaction`] ready to be
//! recorded; flows never write to the vault themselves.
//!
//! - [`issue_cash`]: the trusted issuer creates money for an owner
//! - [`issue_iou`]: a lender issues an IOU, funded with issuer cash
//! - [`payback`]: the borrower settles an IOU with vault cash

pub mod issue_cash;
pub mod issue_iou;
pub mod payback;

pub use issue_cash::issue_cash;
pub use issue_iou::issue_iou;
pub use payback::payback;

use crate::{vault::StateRef, vault::Vault, Config, Result};
use ledger_core::{crypto::sha256, LedgerVerifier, Transaction, TxId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a flow needs from its node
#[derive(Debug)]
pub struct FlowContext<'a, V: Vault + ?Sized> {
    /// Read access to ledger states
    pub vault: &'a V,

    /// Contract verification
    pub verifier: &'a LedgerVerifier,

    /// Trusted issuer and policies
    pub config: &'a Config,
}

impl<'a, V: Vault + ?Sized> FlowContext<'a, V> {
    /// Bundle the node services
    pub fn new(vault: &'a V, verifier: &'a LedgerVerifier, config: &'a Config) -> Self {
        Self {
            vault,
            verifier,
            config,
        }
    }

    /// Run every contract; a rejection becomes [`crate::Error::Rejected`]
    pub(crate) fn verify(&self, tx: &Transaction) -> Result<()> {
        self.verifier.verify(tx).into_result()?;
        Ok(())
    }
}

/// A verified transaction plus the vault references of its inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedTransaction {
    /// Transaction as verified
    pub transaction: Transaction,

    /// Vault position of each input, same order as `transaction.inputs`
    pub input_refs: Vec<StateRef>,

    /// Random salt so identical proposals get distinct ids
    pub salt: Uuid,
}

impl ProposedTransaction {
    /// Wrap a transaction with a fresh salt
    pub fn new(transaction: Transaction, input_refs: Vec<StateRef>) -> Self {
        Self {
            transaction,
            input_refs,
            salt: Uuid::new_v4(),
        }
    }

    /// Hash of the salt and the canonical transaction bytes
    pub fn id(&self) -> Result<TxId> {
        let mut bytes = self.salt.as_bytes().to_vec();
        bytes.extend(self.transaction.canonical_bytes()?);
        Ok(TxId::from_bytes(sha256(&bytes)))
    }
}
