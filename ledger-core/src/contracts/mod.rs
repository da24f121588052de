//! Contract rule engines
//!
//! Each contract inspects a [`Transaction`] and either accepts it or returns
//! the first violated clause. Clauses are checked in a fixed order so the
//! reason reported for a given transaction never changes.

pub mod cash;
pub mod obligation;

pub use cash::CashContract;
pub use obligation::ObligationContract;

use crate::{
    crypto::PublicKey,
    types::{CommandData, Transaction},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Contract identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractId {
    /// Cash contract
    Cash,
    /// Obligation (IOU) contract
    Obligation,
}

impl ContractId {
    /// Short lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractId::Cash => "cash",
            ContractId::Obligation => "obligation",
        }
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rule engine for one family of records and commands
pub trait Contract: Send + Sync {
    /// Which contract this is
    fn id(&self) -> ContractId;

    /// Whether the transaction carries records or commands of this family
    fn is_involved(&self, tx: &Transaction) -> bool;

    /// Accept the transaction or name the first violated clause
    fn verify(&self, tx: &Transaction) -> Result<(), Rejection>;
}

/// Category of a rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Wrong input/output cardinality or type
    StructuralViolation,
    /// Non-positive or mismatched amounts, including overflow
    ValueViolation,
    /// Missing or extra required signer
    SignatureViolation,
    /// Creator not preserved, lender equal to borrower, ...
    InvariantViolation,
    /// Command no contract understands
    UnsupportedCommand,
}

impl ViolationKind {
    /// Label used in logs and metrics (matches the serde name)
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::StructuralViolation => "structural_violation",
            ViolationKind::ValueViolation => "value_violation",
            ViolationKind::SignatureViolation => "signature_violation",
            ViolationKind::InvariantViolation => "invariant_violation",
            ViolationKind::UnsupportedCommand => "unsupported_command",
        }
    }
}

/// Violated clause
///
/// The display strings are stable identifiers matched by downstream
/// tooling; do not reword them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Zero or several commands of one family
    #[error("Required exactly one {family} command, found {found}")]
    AmbiguousCommand {
        /// Contract family
        family: ContractId,
        /// Commands of that family present
        found: usize,
    },

    /// Command of an unknown contract
    #[error("Not supported command: {0}")]
    UnsupportedCommand(String),

    /// Nothing to verify
    #[error("Transaction carries no states and no commands.")]
    EmptyTransaction,

    /// Cash create consumes cash
    #[error("There should be no input.")]
    CashInputOnCreate,

    /// Cash value is zero or negative
    #[error("Cash value must be positive")]
    NonPositiveCash,

    /// Cash create signed by other than one key
    #[error("Expect one signature")]
    ExpectOneSignature,

    /// Cash create not signed by its creator
    #[error("Creator must sign the output")]
    CreatorMustSign,

    /// Cash move without inputs
    #[error("There should be at least one input.")]
    MissingCashInput,

    /// Cash create or move without outputs
    #[error("There should be at least one output.")]
    MissingCashOutput,

    /// Cash move does not conserve value (or its sums overflow)
    #[error("in/out value must match")]
    ValueMismatch,

    /// Cash move not signed by an input owner
    #[error("Previous cash owner must sign.")]
    PreviousOwnerMustSign,

    /// Cash move mixes creators
    #[error("Creator stays intact.")]
    CreatorNotPreserved,

    /// Cash move that leaves everything with the previous owner
    #[error("Cash must change owner.")]
    SameOwnerMove,

    /// IOU create consumes an IOU
    #[error("No IOUState inputs should be consumed when issuing an IOU.")]
    ObligationInputOnCreate,

    /// IOU create without exactly one IOU output
    #[error("There should be only one IOUState output.")]
    ExpectOneObligationOutput,

    /// IOU lent to oneself
    #[error("The lender and the borrower cannot be the same entity.")]
    LenderIsBorrower,

    /// IOU create not signed by two keys
    #[error("Command require two signers.")]
    ExpectTwoSigners,

    /// IOU create missing a participant's signature
    #[error("All of the participants must be signers.")]
    ParticipantsMustSign,

    /// IOU value is zero or negative
    #[error("The IOU's value must be non-negative.")]
    NonPositiveObligation,

    /// IOU destroy without exactly one IOU input
    #[error("There should be only one IOUState input.")]
    ExpectOneObligationInput,

    /// IOU destroy without a cash transfer alongside
    #[error("Payback must move cash in the same transaction.")]
    MissingPayback,

    /// Lender does not receive exactly the IOU value
    #[error("Expect exact payback value.")]
    PaybackMismatch,

    /// IOU destroy not signed by the lender
    #[error("Lender must be a signer.")]
    LenderMustSign,

    /// IOU destroy leaves an IOU behind
    #[error("There should be no IOUState output.")]
    ObligationOutputOnDestroy,
}

impl Rejection {
    /// Category of the violated clause
    pub fn kind(&self) -> ViolationKind {
        use Rejection::*;

        match self {
            UnsupportedCommand(_) => ViolationKind::UnsupportedCommand,

            AmbiguousCommand { .. }
            | EmptyTransaction
            | CashInputOnCreate
            | MissingCashInput
            | MissingCashOutput
            | ObligationInputOnCreate
            | ExpectOneObligationOutput
            | ExpectOneObligationInput
            | MissingPayback
            | ObligationOutputOnDestroy => ViolationKind::StructuralViolation,

            NonPositiveCash | ValueMismatch | NonPositiveObligation | PaybackMismatch => {
                ViolationKind::ValueViolation
            }

            ExpectOneSignature
            | CreatorMustSign
            | PreviousOwnerMustSign
            | ExpectTwoSigners
            | ParticipantsMustSign
            | LenderMustSign => ViolationKind::SignatureViolation,

            CreatorNotPreserved | SameOwnerMove | LenderIsBorrower => {
                ViolationKind::InvariantViolation
            }
        }
    }
}

/// Command picked for a contract, with its signers
#[derive(Debug, Clone, Copy)]
pub struct SelectedCommand<'a, C> {
    /// Typed command
    pub value: C,
    /// Keys attributed to it
    pub signers: &'a [PublicKey],
}

/// Pick the only command of one family
pub(crate) fn require_single_command<'a, C>(
    tx: &'a Transaction,
    family: ContractId,
    select: impl Fn(&CommandData) -> Option<C>,
) -> Result<SelectedCommand<'a, C>, Rejection> {
    let mut matching = tx
        .commands
        .iter()
        .filter_map(|c| select(&c.data).map(|value| SelectedCommand { value, signers: &c.signers }));

    match (matching.next(), matching.next()) {
        (Some(command), None) => Ok(command),
        (first, second) => {
            let found = usize::from(first.is_some()) + usize::from(second.is_some()) + matching.count();
            Err(Rejection::AmbiguousCommand { family, found })
        }
    }
}

/// One clause: `condition` must hold or the transaction is rejected
#[inline]
pub(crate) fn require(condition: bool, rejection: Rejection) -> Result<(), Rejection> {
    if condition {
        Ok(())
    } else {
        Err(rejection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CashCommand, Command, ObligationCommand};

    #[test]
    fn test_single_command_selected() {
        let tx = Transaction {
            commands: vec![
                Command::new(CommandData::Obligation(ObligationCommand::Destroy), []),
                Command::new(CommandData::Cash(CashCommand::Move), []),
            ],
            ..Default::default()
        };

        let selected = require_single_command(&tx, ContractId::Cash, CommandData::as_cash).unwrap();
        assert_eq!(selected.value, CashCommand::Move);
    }

    #[test]
    fn test_missing_and_duplicate_commands_are_ambiguous() {
        let empty = Transaction::default();
        assert_eq!(
            require_single_command(&empty, ContractId::Cash, CommandData::as_cash).unwrap_err(),
            Rejection::AmbiguousCommand { family: ContractId::Cash, found: 0 }
        );

        let doubled = Transaction {
            commands: vec![
                Command::new(CommandData::Cash(CashCommand::Create), []),
                Command::new(CommandData::Cash(CashCommand::Move), []),
                Command::new(CommandData::Cash(CashCommand::Move), []),
            ],
            ..Default::default()
        };
        assert_eq!(
            require_single_command(&doubled, ContractId::Cash, CommandData::as_cash).unwrap_err(),
            Rejection::AmbiguousCommand { family: ContractId::Cash, found: 3 }
        );
    }

    #[test]
    fn test_rejection_kinds() {
        assert_eq!(Rejection::ValueMismatch.kind(), ViolationKind::ValueViolation);
        assert_eq!(Rejection::CreatorNotPreserved.kind(), ViolationKind::InvariantViolation);
        assert_eq!(Rejection::LenderMustSign.kind(), ViolationKind::SignatureViolation);
        assert_eq!(Rejection::MissingCashInput.kind(), ViolationKind::StructuralViolation);
        assert_eq!(
            Rejection::UnsupportedCommand("X".into()).kind(),
            ViolationKind::UnsupportedCommand
        );
    }

    #[test]
    fn test_reason_strings_are_stable() {
        assert_eq!(Rejection::ValueMismatch.to_string(), "in/out value must match");
        assert_eq!(Rejection::NonPositiveCash.to_string(), "Cash value must be positive");
        assert_eq!(Rejection::CashInputOnCreate.to_string(), "There should be no input.");
        assert!(Rejection::LenderIsBorrower
            .to_string()
            .contains("lender and the borrower cannot be the same entity"));
    }
}
