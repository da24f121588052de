//! Overflow-checked summation of ledger values
//!
//! A plain `iter().sum()` wraps in release builds, and a wrapped total can
//! make an unbalanced transaction look balanced. Every sum over record
//! values goes through here instead.

use thiserror::Error;

/// Running total left the 64-bit range
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Arithmetic overflow while summing ledger values")]
pub struct ArithmeticOverflow;

/// Sum values, failing on the first addition that would overflow
pub fn checked_sum<I>(values: I) -> Result<i64, ArithmeticOverflow>
where
    I: IntoIterator<Item = i64>,
{
    values
        .into_iter()
        .try_fold(0i64, |acc, value| acc.checked_add(value).ok_or(ArithmeticOverflow))
}

/// Sum a projection of each item
pub fn checked_sum_by<T, I, F>(items: I, selector: F) -> Result<i64, ArithmeticOverflow>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> i64,
{
    checked_sum(items.into_iter().map(selector))
}
