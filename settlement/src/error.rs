//! Error types for settlement flows

use crate::vault::StateRef;
use ledger_core::{arithmetic::ArithmeticOverflow, LinearId, RejectionReport, TxId};
use thiserror::Error;

/// Result type for settlement operations
pub type Result<T> = std::result::Result<T, Error>;

/// Settlement errors
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger error
    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger_core::Error),

    /// No unconsumed obligation with this linear id
    #[error("Obligation {0} not found")]
    NotFound(LinearId),

    /// Borrower cannot cover the debt with trusted cash
    #[error("Insufficient funds: available {available}, required {required}")]
    InsufficientFunds {
        /// Sum of every eligible cash record
        available: i64,
        /// Debt to cover
        required: i64,
    },

    /// Payback initiated by someone other than the borrower
    #[error("{0} is not the borrower of this IOU")]
    NotBorrower(String),

    /// Cash issuance attempted by an untrusted party
    #[error("{0} is not the trusted issuer")]
    NotIssuer(String),

    /// The verifier rejected the proposed transaction
    #[error("Transaction rejected: {0}")]
    Rejected(#[from] RejectionReport),

    /// The counterparty refused to sign
    #[error("Counterparty check failed: {0}")]
    CounterpartyCheck(String),

    /// Input already consumed
    #[error("Double spend of state {0}")]
    DoubleSpend(StateRef),

    /// Input the vault has never seen
    #[error("Unknown state {0}")]
    UnknownState(StateRef),

    /// Referenced state differs from the transaction input at the same position
    #[error("State {0} does not match the transaction input")]
    InputMismatch(StateRef),

    /// Input references and transaction inputs differ in number
    #[error("{refs} input references for {inputs} transaction inputs")]
    InputCountMismatch {
        /// Number of references supplied
        refs: usize,
        /// Number of transaction inputs
        inputs: usize,
    },

    /// Same transaction recorded twice
    #[error("Transaction {0} already recorded")]
    DuplicateTransaction(TxId),

    /// Overflow while summing cash
    #[error(transparent)]
    Overflow(#[from] ArithmeticOverflow),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
