//! IOU issuance
//!
//! The lender proposes an IOU to the borrower. The same transaction funds
//! the borrower with freshly issued cash of the same value, so the
//! borrower's side sees exactly one IOU and one cash output.

use super::{FlowContext, ProposedTransaction};
use crate::{vault::Vault, Config, Error, Result};
use ledger_core::{
    CashCommand, CashRecord, CommandData, ObligationCommand, ObligationRecord, Party, Transaction,
    TransactionBuilder,
};

/// Issue an IOU of `value` from `lender` to `borrower`
pub fn issue_iou<V: Vault + ?Sized>(
    ctx: &FlowContext<'_, V>,
    lender: &Party,
    borrower: &Party,
    value: i64,
) -> Result<ProposedTransaction> {
    let issuer = &ctx.config.issuer;
    let iou = ObligationRecord::new(value, lender.clone(), borrower.clone());
    let linear_id = iou.linear_id;

    let tx = TransactionBuilder::new()
        .add_output_state(iou)
        .add_output_state(CashRecord::new(value, issuer.clone(), borrower.clone()))
        .add_command(
            CommandData::Obligation(ObligationCommand::Create),
            [lender.owning_key, borrower.owning_key],
        )
        .add_command(CommandData::Cash(CashCommand::Create), [issuer.owning_key])
        .build();

    ctx.verify(&tx)?;
    accept_iou(ctx.config, &tx)?;

    tracing::info!(lender = %lender, borrower = %borrower, value, %linear_id, "IOU issued");
    Ok(ProposedTransaction::new(tx, vec![]))
}

/// Borrower-side checks before signing
pub fn accept_iou(config: &Config, tx: &Transaction) -> Result<()> {
    let ious = tx.obligation_outputs();
    if ious.len() != 1 {
        return Err(Error::CounterpartyCheck("This must be an IOU.".to_string()));
    }
    if ious[0].value > config.iou.max_value {
        return Err(Error::CounterpartyCheck(format!(
            "I won't accept IOUs with a value over {}.",
            config.iou.max_value
        )));
    }

    let cash = tx.cash_outputs();
    if cash.len() != 1 {
        return Err(Error::CounterpartyCheck("Expect one output CashState.".to_string()));
    }
    if cash[0].creator != config.issuer {
        return Err(Error::CounterpartyCheck("Expect bank to be cash creator".to_string()));
    }

    Ok(())
}
