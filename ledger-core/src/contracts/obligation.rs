//! Obligation (IOU) contract
//!
//! An IOU has two lifecycle states: open, and settled. Settled IOUs are simply
//! absent from the ledger, so there is no status flag to check. Consuming the
//! same IOU twice is prevented by the platform's single-consumption rule.
//!
//! ```text
//! nonexistent --Create--> open --Destroy--> settled
//! ```
//!
//! Destroy is only legal as part of a payback: the same transaction must move
//! cash to the lender for exactly the IOU value. Cash the lender already held
//! in the inputs is netted out.

use super::{require, require_single_command, Contract, ContractId, Rejection};
use crate::{
    arithmetic::checked_sum_by,
    crypto::PublicKey,
    types::{CashCommand, CashRecord, CommandData, ObligationCommand, Transaction},
};

/// Rule engine for [`crate::types::ObligationRecord`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct ObligationContract;

impl Contract for ObligationContract {
    fn id(&self) -> ContractId {
        ContractId::Obligation
    }

    fn is_involved(&self, tx: &Transaction) -> bool {
        !tx.obligation_inputs().is_empty()
            || !tx.obligation_outputs().is_empty()
            || tx.commands.iter().any(|c| c.data.as_obligation().is_some())
    }

    fn verify(&self, tx: &Transaction) -> Result<(), Rejection> {
        if let Some(name) = tx.unsupported_command() {
            return Err(Rejection::UnsupportedCommand(name.to_string()));
        }

        let command =
            require_single_command(tx, ContractId::Obligation, CommandData::as_obligation)?;

        let result = match command.value {
            ObligationCommand::Create => verify_create(tx, command.signers),
            ObligationCommand::Destroy => verify_destroy(tx, command.signers),
        };

        if let Err(ref rejection) = result {
            tracing::debug!(command = ?command.value, %rejection, "obligation contract rejected transaction");
        }
        result
    }
}

fn verify_create(tx: &Transaction, signers: &[PublicKey]) -> Result<(), Rejection> {
    let outputs = tx.obligation_outputs();

    require(tx.obligation_inputs().is_empty(), Rejection::ObligationInputOnCreate)?;
    require(outputs.len() == 1, Rejection::ExpectOneObligationOutput)?;

    let iou = outputs[0];
    require(iou.lender != iou.borrower, Rejection::LenderIsBorrower)?;
    require(signers.len() == 2, Rejection::ExpectTwoSigners)?;
    require(
        iou.participants()
            .iter()
            .all(|party| signers.contains(&party.owning_key)),
        Rejection::ParticipantsMustSign,
    )?;
    require(iou.value > 0, Rejection::NonPositiveObligation)?;

    Ok(())
}

fn verify_destroy(tx: &Transaction, signers: &[PublicKey]) -> Result<(), Rejection> {
    let inputs = tx.obligation_inputs();
    require(inputs.len() == 1, Rejection::ExpectOneObligationInput)?;
    let iou = inputs[0];

    let cash_outputs = tx.cash_outputs();
    require(
        tx.has_command(&CommandData::Cash(CashCommand::Move))
            && !tx.cash_inputs().is_empty()
            && !cash_outputs.is_empty(),
        Rejection::MissingPayback,
    )?;

    // Only cash the lender did not already hold counts as payback.
    let owned_by_lender = |c: &&&CashRecord| c.owner == iou.lender;
    let lender_out = checked_sum_by(cash_outputs.iter().filter(owned_by_lender), |c| c.value);
    let lender_in = checked_sum_by(tx.cash_inputs().iter().filter(owned_by_lender), |c| c.value);
    let newly_owned = match (lender_out, lender_in) {
        (Ok(out), Ok(held)) => out.checked_sub(held),
        _ => None,
    };
    require(newly_owned == Some(iou.value), Rejection::PaybackMismatch)?;

    require(
        signers.contains(&iou.lender.owning_key),
        Rejection::LenderMustSign,
    )?;
    require(
        tx.obligation_outputs().is_empty(),
        Rejection::ObligationOutputOnDestroy,
    )?;

    Ok(())
}
