//! Cash contract
//!
//! # Create
//!
//! 1. No cash inputs
//! 2. At least one cash output
//! 3. Every output value is positive
//! 4. Exactly one signer
//! 5. That signer is the creator of every output
//!
//! # Move
//!
//! 1. At least one cash input
//! 2. At least one cash output
//! 3. Input and output totals match (overflow counts as a mismatch)
//! 4. Every previous owner signed
//! 5. One creator across all inputs and outputs
//! 6. Some output leaves the previous owner
//! 7. Every output value is positive

use super::{require, require_single_command, Contract, ContractId, Rejection};
use crate::{
    arithmetic::checked_sum_by,
    crypto::PublicKey,
    types::{CashCommand, CashRecord, CommandData, Transaction},
};

/// Rule engine for [`CashRecord`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct CashContract;

impl Contract for CashContract {
    fn id(&self) -> ContractId {
        ContractId::Cash
    }

    fn is_involved(&self, tx: &Transaction) -> bool {
        !tx.cash_inputs().is_empty()
            || !tx.cash_outputs().is_empty()
            || tx.commands.iter().any(|c| c.data.as_cash().is_some())
    }

    fn verify(&self, tx: &Transaction) -> Result<(), Rejection> {
        let command = require_single_command(tx, ContractId::Cash, CommandData::as_cash)?;

        let result = match command.value {
            CashCommand::Create => verify_create(tx, command.signers),
            CashCommand::Move => verify_move(tx, command.signers),
        };

        if let Err(ref rejection) = result {
            tracing::debug!(command = ?command.value, %rejection, "cash contract rejected transaction");
        }
        result
    }
}

fn verify_create(tx: &Transaction, signers: &[PublicKey]) -> Result<(), Rejection> {
    let outputs = tx.cash_outputs();

    require(tx.cash_inputs().is_empty(), Rejection::CashInputOnCreate)?;
    require(!outputs.is_empty(), Rejection::MissingCashOutput)?;
    require(outputs.iter().all(|c| c.value > 0), Rejection::NonPositiveCash)?;
    require(signers.len() == 1, Rejection::ExpectOneSignature)?;
    require(
        outputs.iter().all(|c| signers[0] == c.creator.owning_key),
        Rejection::CreatorMustSign,
    )?;

    Ok(())
}

fn verify_move(tx: &Transaction, signers: &[PublicKey]) -> Result<(), Rejection> {
    let inputs = tx.cash_inputs();
    let outputs = tx.cash_outputs();

    require(!inputs.is_empty(), Rejection::MissingCashInput)?;
    require(!outputs.is_empty(), Rejection::MissingCashOutput)?;

    let in_sum = checked_sum_by(&inputs, |c| c.value);
    let out_sum = checked_sum_by(&outputs, |c| c.value);
    require(
        matches!((in_sum, out_sum), (Ok(a), Ok(b)) if a == b),
        Rejection::ValueMismatch,
    )?;

    require(
        inputs.iter().all(|c| signers.contains(&c.owner.owning_key)),
        Rejection::PreviousOwnerMustSign,
    )?;

    let creator = &inputs[0].creator;
    require(
        inputs.iter().chain(&outputs).all(|c| &c.creator == creator),
        Rejection::CreatorNotPreserved,
    )?;

    require(changes_hands(&inputs, &outputs), Rejection::SameOwnerMove)?;
    require(outputs.iter().all(|c| c.value > 0), Rejection::NonPositiveCash)?;

    Ok(())
}

/// False when a single party owns every input and every output
fn changes_hands(inputs: &[&CashRecord], outputs: &[&CashRecord]) -> bool {
    let previous_owner = &inputs[0].owner;
    !inputs
        .iter()
        .chain(outputs)
        .all(|c| &c.owner == previous_owner)
}
