//! Transaction-level verification
//!
//! Runs every contract whose records or commands appear in a transaction and
//! aggregates their verdicts. A transaction is accepted only when every
//! involved contract accepts it.
//!
//! # Example
//!
//! ```
//! use ledger_core::{
//!     crypto::KeyPair,
//!     types::{CashCommand, CashRecord, CommandData, Party, TransactionBuilder},
//!     LedgerVerifier,
//! };
//!
//! let bank = Party::new("Bank", KeyPair::generate().public_key());
//! let alice = Party::new("Alice", KeyPair::generate().public_key());
//!
//! let tx = TransactionBuilder::new()
//!     .add_output_state(CashRecord::new(9, bank.clone(), alice))
//!     .add_command(CommandData::Cash(CashCommand::Create), [bank.owning_key])
//!     .build();
//!
//! assert!(LedgerVerifier::new().verify(&tx).is_accepted());
//! ```

use crate::{
    contracts::{CashContract, Contract, ContractId, ObligationContract, Rejection, ViolationKind},
    metrics::VerifierMetrics,
    types::Transaction,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of verifying one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// Every involved contract accepted
    Accepted,
    /// First rejection encountered
    Rejected(RejectionReport),
}

impl Verdict {
    /// Whether the transaction may be recorded
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    /// Convert into a `Result` for `?` propagation
    pub fn into_result(self) -> Result<(), RejectionReport> {
        match self {
            Verdict::Accepted => Ok(()),
            Verdict::Rejected(report) => Err(report),
        }
    }
}

/// Labeled rejection handed back to the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionReport {
    /// Contract that rejected; absent for transaction-wide failures
    pub contract: Option<ContractId>,

    /// Category
    pub kind: ViolationKind,

    /// Stable clause identifier
    pub reason: String,
}

impl RejectionReport {
    fn new(contract: Option<ContractId>, rejection: &Rejection) -> Self {
        Self {
            contract,
            kind: rejection.kind(),
            reason: rejection.to_string(),
        }
    }
}

impl fmt::Display for RejectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.contract {
            Some(contract) => write!(f, "{} contract: {}", contract, self.reason),
            None => write!(f, "{}", self.reason),
        }
    }
}

impl std::error::Error for RejectionReport {}

/// Runs the contracts installed on this ledger
pub struct LedgerVerifier {
    contracts: Vec<Box<dyn Contract>>,
    metrics: Option<VerifierMetrics>,
}

impl LedgerVerifier {
    /// Verifier with the cash and obligation contracts
    pub fn new() -> Self {
        Self {
            contracts: vec![Box::new(CashContract), Box::new(ObligationContract)],
            metrics: None,
        }
    }

    /// Record verdicts in `metrics`
    pub fn with_metrics(mut self, metrics: VerifierMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Attached metrics, if any
    pub fn metrics(&self) -> Option<&VerifierMetrics> {
        self.metrics.as_ref()
    }

    /// Verify a transaction
    pub fn verify(&self, tx: &Transaction) -> Verdict {
        let verdict = self.run(tx);

        match &verdict {
            Verdict::Accepted => tracing::debug!(
                inputs = tx.inputs.len(),
                outputs = tx.outputs.len(),
                commands = tx.commands.len(),
                "transaction accepted"
            ),
            Verdict::Rejected(report) => tracing::info!(
                contract = ?report.contract,
                kind = ?report.kind,
                reason = %report.reason,
                "transaction rejected"
            ),
        }

        verdict
    }

    fn run(&self, tx: &Transaction) -> Verdict {
        if let Some(name) = tx.unsupported_command() {
            let rejection = Rejection::UnsupportedCommand(name.to_string());
            self.observe(None, Some(&rejection));
            return Verdict::Rejected(RejectionReport::new(None, &rejection));
        }

        let involved: Vec<&dyn Contract> = self
            .contracts
            .iter()
            .map(|c| c.as_ref())
            .filter(|c| c.is_involved(tx))
            .collect();

        if involved.is_empty() {
            let rejection = Rejection::EmptyTransaction;
            self.observe(None, Some(&rejection));
            return Verdict::Rejected(RejectionReport::new(None, &rejection));
        }

        for contract in involved {
            match contract.verify(tx) {
                Ok(()) => self.observe(Some(contract.id()), None),
                Err(rejection) => {
                    self.observe(Some(contract.id()), Some(&rejection));
                    return Verdict::Rejected(RejectionReport::new(Some(contract.id()), &rejection));
                }
            }
        }

        Verdict::Accepted
    }

    fn observe(&self, contract: Option<ContractId>, rejection: Option<&Rejection>) {
        if let Some(metrics) = &self.metrics {
            metrics.observe(contract, rejection.map(Rejection::kind));
        }
    }
}

impl Default for LedgerVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LedgerVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<ContractId> = self.contracts.iter().map(|c| c.id()).collect();
        f.debug_struct("LedgerVerifier")
            .field("contracts", &ids)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        crypto::KeyPair,
        types::{
            CashCommand, CashRecord, CommandData, ObligationCommand, ObligationRecord, Party,
            TransactionBuilder,
        },
    };

    fn party(name: &str, seed: u8) -> Party {
        Party::new(name, KeyPair::from_seed(&[seed; 32]).public_key())
    }

    #[test]
    fn test_create_cash_scenario() {
        let bank = party("Bank", 1);
        let alice = party("Alice", 2);
        let verifier = LedgerVerifier::new();

        let ok = TransactionBuilder::new()
            .add_output_state(CashRecord::new(9, bank.clone(), alice.clone()))
            .add_command(CommandData::Cash(CashCommand::Create), [bank.owning_key])
            .build();
        assert_eq!(verifier.verify(&ok), Verdict::Accepted);

        let negative = TransactionBuilder::new()
            .add_output_state(CashRecord::new(-1, bank.clone(), alice))
            .add_command(CommandData::Cash(CashCommand::Create), [bank.owning_key])
            .build();
        let report = verifier.verify(&negative).into_result().unwrap_err();
        assert_eq!(report.contract, Some(ContractId::Cash));
        assert_eq!(report.kind, ViolationKind::ValueViolation);
        assert_eq!(report.reason, "Cash value must be positive");
    }

    #[test]
    fn test_move_cash_scenario() {
        let bank = party("Bank", 1);
        let alice = party("Alice", 2);
        let bob = party("Bob", 3);

        let tx = TransactionBuilder::new()
            .add_input_state(CashRecord::new(9, bank.clone(), alice.clone()))
            .add_output_state(CashRecord::new(10, bank, bob))
            .add_command(CommandData::Cash(CashCommand::Move), [alice.owning_key])
            .build();

        let report = LedgerVerifier::new().verify(&tx).into_result().unwrap_err();
        assert_eq!(report.reason, "in/out value must match");
    }

    #[test]
    fn test_obligation_create_scenario() {
        let alice = party("Alice", 2);
        let bob = party("Bob", 3);
        let verifier = LedgerVerifier::new();

        let same = TransactionBuilder::new()
            .add_output_state(ObligationRecord::new(5, alice.clone(), alice.clone()))
            .add_command(
                CommandData::Obligation(ObligationCommand::Create),
                [alice.owning_key, bob.owning_key],
            )
            .build();
        let report = verifier.verify(&same).into_result().unwrap_err();
        assert_eq!(report.contract, Some(ContractId::Obligation));
        assert_eq!(report.kind, ViolationKind::InvariantViolation);
        assert!(report
            .reason
            .contains("lender and the borrower cannot be the same entity"));
    }

    #[test]
    fn test_settlement_scenario_needs_both_contracts() {
        let bank = party("Bank", 1);
        let lender = party("Lender", 2);
        let borrower = party("Borrower", 3);

        let tx = TransactionBuilder::new()
            .add_input_state(ObligationRecord::new(9, lender.clone(), borrower.clone()))
            .add_input_state(CashRecord::new(9, bank.clone(), borrower.clone()))
            .add_output_state(CashRecord::new(9, bank.clone(), lender.clone()))
            .add_command(
                CommandData::Obligation(ObligationCommand::Destroy),
                [lender.owning_key],
            )
            .add_command(
                CommandData::Cash(CashCommand::Move),
                [borrower.owning_key, bank.owning_key],
            )
            .build();
        assert_eq!(LedgerVerifier::new().verify(&tx), Verdict::Accepted);

        // The obligation leg alone is fine, but the cash leg is not signed by its owner.
        let mut unsigned_cash = tx.clone();
        unsigned_cash.commands[1].signers = vec![bank.owning_key];
        let report = LedgerVerifier::new()
            .verify(&unsigned_cash)
            .into_result()
            .unwrap_err();
        assert_eq!(report.contract, Some(ContractId::Cash));
        assert_eq!(report.reason, "Previous cash owner must sign.");
    }

    #[test]
    fn test_unsupported_and_empty_transactions() {
        let verifier = LedgerVerifier::new();

        let empty = Transaction::default();
        let report = verifier.verify(&empty).into_result().unwrap_err();
        assert_eq!(report.contract, None);
        assert_eq!(report.kind, ViolationKind::StructuralViolation);

        let unknown = TransactionBuilder::new()
            .add_command(CommandData::Other("Exit".into()), [])
            .build();
        let report = verifier.verify(&unknown).into_result().unwrap_err();
        assert_eq!(report.kind, ViolationKind::UnsupportedCommand);
    }

    #[test]
    fn test_verdict_json_shape() {
        let report = RejectionReport::new(Some(ContractId::Cash), &Rejection::ValueMismatch);
        let json = serde_json::to_value(Verdict::Rejected(report)).unwrap();

        assert_eq!(json["verdict"], "rejected");
        assert_eq!(json["contract"], "cash");
        assert_eq!(json["kind"], "value_violation");
        assert_eq!(json["reason"], "in/out value must match");

        let json = serde_json::to_value(Verdict::Accepted).unwrap();
        assert_eq!(json["verdict"], "accepted");
    }

    #[test]
    fn test_metrics_count_verdicts() {
        let bank = party("Bank", 1);
        let verifier = LedgerVerifier::new().with_metrics(VerifierMetrics::new().unwrap());

        let ok = TransactionBuilder::new()
            .add_output_state(CashRecord::new(9, bank.clone(), party("Alice", 2)))
            .add_command(CommandData::Cash(CashCommand::Create), [bank.owning_key])
            .build();
        verifier.verify(&ok);
        verifier.verify(&Transaction::default());

        let metrics = verifier.metrics().unwrap();
        assert_eq!(metrics.count("cash", "accepted"), 1);
        assert_eq!(metrics.count("none", "rejected"), 1);
        assert_eq!(metrics.rejections("structural_violation"), 1);
    }
}
