//! IOU payback
//!
//! The borrower settles an open IOU in one transaction: the IOU is
//! consumed, enough of the borrower's issuer cash is selected from the
//! vault to cover it, the lender receives exactly the IOU value and any
//! remainder goes back to the borrower as change.

use super::{FlowContext, ProposedTransaction};
use crate::{
    finder::{find_obligation, select_cash},
    vault::Vault,
    Config, Error, Result,
};
use ledger_core::{
    arithmetic::{checked_sum_by, ArithmeticOverflow},
    CashCommand, CashRecord, CommandData, LinearId, ObligationCommand, Party, Transaction,
    TransactionBuilder,
};

/// Pay back the IOU `linear_id` on behalf of `initiator`
pub fn payback<V: Vault + ?Sized>(
    ctx: &FlowContext<'_, V>,
    initiator: &Party,
    linear_id: LinearId,
) -> Result<ProposedTransaction> {
    let iou = find_obligation(ctx.vault, linear_id)?;
    let lender = &iou.state.lender;
    let borrower = &iou.state.borrower;
    let value = iou.state.value;

    if initiator != borrower {
        return Err(Error::NotBorrower(initiator.name.clone()));
    }

    let issuer = &ctx.config.issuer;
    let selection = select_cash(
        ctx.vault,
        borrower,
        issuer,
        value,
        ctx.config.paging.page_size,
    )?;
    tracing::debug!(
        %linear_id,
        selected = selection.states.len(),
        total = selection.total,
        pages = selection.pages_fetched,
        "payback funded"
    );

    let mut input_refs = vec![iou.reference];
    let mut builder = TransactionBuilder::new().add_input_state(iou.state.clone());
    for cash in &selection.states {
        builder = builder.add_input_state(cash.state.clone());
        input_refs.push(cash.reference);
    }

    builder = builder.add_output_state(CashRecord::new(value, issuer.clone(), lender.clone()));
    let change = selection.change(value);
    if change > 0 {
        builder = builder.add_output_state(CashRecord::new(change, issuer.clone(), borrower.clone()));
    }

    let tx = builder
        .add_command(
            CommandData::Obligation(ObligationCommand::Destroy),
            [lender.owning_key],
        )
        .add_command(
            CommandData::Cash(CashCommand::Move),
            [borrower.owning_key, issuer.owning_key],
        )
        .build();

    ctx.verify(&tx)?;
    accept_payback(ctx.config, &tx, lender, borrower, value)?;

    tracing::info!(%linear_id, lender = %lender, borrower = %borrower, value, change, "IOU paid back");
    Ok(ProposedTransaction::new(tx, input_refs))
}

/// Lender-side checks before signing
pub fn accept_payback(
    config: &Config,
    tx: &Transaction,
    lender: &Party,
    borrower: &Party,
    value: i64,
) -> Result<()> {
    let inputs = tx.cash_inputs();
    let outputs = tx.cash_outputs();

    let received = checked_sum_by(outputs.iter().filter(|c| &c.owner == lender), |c| c.value)?;
    let held = checked_sum_by(inputs.iter().filter(|c| &c.owner == lender), |c| c.value)?;
    let paid = received.checked_sub(held).ok_or(ArithmeticOverflow)?;
    if paid != value {
        return Err(Error::CounterpartyCheck(format!(
            "Expect exact payback value. {} != {}",
            paid, value
        )));
    }

    let input_total = checked_sum_by(&inputs, |c| c.value)?;
    let change = checked_sum_by(outputs.iter().filter(|c| &c.owner == borrower), |c| c.value)?;
    if input_total.checked_sub(value) != Some(change) {
        return Err(Error::CounterpartyCheck("Expect change for borrower.".to_string()));
    }

    if inputs.iter().any(|c| c.creator != config.issuer) {
        return Err(Error::CounterpartyCheck("Accept input money created by bank.".to_string()));
    }
    if outputs.iter().any(|c| c.creator != config.issuer) {
        return Err(Error::CounterpartyCheck("Accept output money created by bank".to_string()));
    }

    Ok(())
}
