//! Cash issuance

use super::{FlowContext, ProposedTransaction};
use crate::{vault::Vault, Config, Error, Result};
use ledger_core::{CashCommand, CashRecord, CommandData, Party, Transaction, TransactionBuilder};

/// Create `value` in new cash owned by `owner`
///
/// Only the configured issuer may create money.
pub fn issue_cash<V: Vault + ?Sized>(
    ctx: &FlowContext<'_, V>,
    issuer: &Party,
    owner: &Party,
    value: i64,
) -> Result<ProposedTransaction> {
    if issuer != &ctx.config.issuer {
        return Err(Error::NotIssuer(issuer.name.clone()));
    }

    let tx = TransactionBuilder::new()
        .add_output_state(CashRecord::new(value, issuer.clone(), owner.clone()))
        .add_command(CommandData::Cash(CashCommand::Create), [issuer.owning_key])
        .build();

    ctx.verify(&tx)?;
    accept_issued_cash(ctx.config, &tx)?;

    tracing::info!(issuer = %issuer, owner = %owner, value, "cash issued");
    Ok(ProposedTransaction::new(tx, vec![]))
}

/// Owner-side check: only accept money the trusted issuer created
pub fn accept_issued_cash(config: &Config, tx: &Transaction) -> Result<()> {
    if tx.cash_outputs().iter().any(|c| c.creator != config.issuer) {
        return Err(Error::CounterpartyCheck("Expect bank to be cash creator".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::fixtures::{party, Network};
    use crate::vault::{PageSpecification, QueryCriteria};

    #[test]
    fn test_issuer_creates_cash() {
        let net = Network::new();
        let proposed = issue_cash(&net.ctx(), &net.bank, &net.borrower, 42).unwrap();
        assert!(proposed.input_refs.is_empty());

        net.vault.record(&proposed).unwrap();
        let page = net
            .vault
            .find(&QueryCriteria::cash().owned_by(&net.borrower), PageSpecification::default())
            .unwrap();
        let cash = page.states[0].clone().into_cash().unwrap();
        assert_eq!(cash.state.value, 42);
        assert_eq!(cash.state.creator, net.bank);
    }

    #[test]
    fn test_only_issuer_creates_cash() {
        let net = Network::new();
        let err = issue_cash(&net.ctx(), &net.lender, &net.borrower, 42).unwrap_err();
        assert!(matches!(err, Error::NotIssuer(name) if name == "Lender"));
    }

    #[test]
    fn test_non_positive_issue_rejected() {
        let net = Network::new();
        let err = issue_cash(&net.ctx(), &net.bank, &net.borrower, 0).unwrap_err();
        match err {
            Error::Rejected(report) => assert_eq!(report.reason, "Cash value must be positive"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_owner_refuses_foreign_cash() {
        let net = Network::new();
        let tx = TransactionBuilder::new()
            .add_output_state(CashRecord::new(5, party("ShadyBank", 9), net.borrower.clone()))
            .build();

        let err = accept_issued_cash(&net.config, &tx).unwrap_err();
        assert!(matches!(err, Error::CounterpartyCheck(msg) if msg == "Expect bank to be cash creator"));
    }
}
