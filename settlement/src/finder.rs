//! Vault lookups used by the flows

use crate::{
    vault::{PageSpecification, PagedStates, QueryCriteria, StateAndRef, Vault},
    Error, Result,
};
use ledger_core::{arithmetic::ArithmeticOverflow, CashRecord, LinearId, ObligationRecord, Party};

/// The open obligation with `linear_id`
pub fn find_obligation<V: Vault + ?Sized>(
    vault: &V,
    linear_id: LinearId,
) -> Result<StateAndRef<ObligationRecord>> {
    let criteria = QueryCriteria::obligations().with_linear_id(linear_id);
    vault
        .find(&criteria, PageSpecification::new(0, 1))?
        .states
        .into_iter()
        .find_map(StateAndRef::into_obligation)
        .ok_or(Error::NotFound(linear_id))
}

/// Cash picked to cover an amount
#[derive(Debug, Clone)]
pub struct CashSelection {
    /// Selected states, in vault order
    pub states: Vec<StateAndRef<CashRecord>>,

    /// Sum of the selected values
    pub total: i64,

    /// Vault queries it took
    pub pages_fetched: usize,
}

impl CashSelection {
    /// Amount above `required` to hand back
    pub fn change(&self, required: i64) -> i64 {
        self.total - required
    }
}

/// Select `owner`'s cash created by `issuer` until it covers `required`
///
/// Pages are fetched one at a time and paging stops as soon as the
/// running sum is enough.
pub fn select_cash<V: Vault + ?Sized>(
    vault: &V,
    owner: &Party,
    issuer: &Party,
    required: i64,
    page_size: usize,
) -> Result<CashSelection> {
    let criteria = QueryCriteria::cash().owned_by(owner).created_by(issuer);
    let mut pages = PagedStates::new(vault, criteria, page_size)?;

    let mut states = Vec::new();
    let mut total: i64 = 0;

    while total < required {
        let Some(next) = pages.next() else {
            tracing::info!(owner = %owner, available = total, required, "insufficient funds");
            return Err(Error::InsufficientFunds {
                available: total,
                required,
            });
        };

        if let Some(cash) = next?.into_cash() {
            total = total
                .checked_add(cash.state.value)
                .ok_or(ArithmeticOverflow)?;
            states.push(cash);
        }
    }

    tracing::debug!(
        owner = %owner,
        selected = states.len(),
        total,
        pages = pages.pages_fetched(),
        "cash selected"
    );

    Ok(CashSelection {
        states,
        total,
        pages_fetched: pages.pages_fetched(),
    })
}
