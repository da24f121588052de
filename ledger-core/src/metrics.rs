//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring verification.
//!
//! # Metrics
//!
//! - `ledger_contract_verdicts_total{contract, outcome}` - Contract verdicts
//! - `ledger_rejections_total{kind}` - Rejections by violation category
//!
//! Collectors are registered in a private [`Registry`] rather than the
//! process-wide default, so several verifiers can coexist.

use crate::{
    contracts::{ContractId, ViolationKind},
    Result,
};
use prometheus::{IntCounterVec, Opts, Registry, TextEncoder};
use std::fmt;
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct VerifierMetrics {
    /// Verdicts per contract and outcome
    pub verdicts: IntCounterVec,

    /// Rejections per violation kind
    pub rejections: IntCounterVec,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl VerifierMetrics {
    /// Create new metrics collector
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let verdicts = IntCounterVec::new(
            Opts::new("ledger_contract_verdicts_total", "Contract verdicts by outcome"),
            &["contract", "outcome"],
        )?;
        registry.register(Box::new(verdicts.clone()))?;

        let rejections = IntCounterVec::new(
            Opts::new("ledger_rejections_total", "Rejected transactions by violation kind"),
            &["kind"],
        )?;
        registry.register(Box::new(rejections.clone()))?;

        Ok(Self {
            verdicts,
            rejections,
            registry,
        })
    }

    /// Record one contract outcome; `contract` is `None` for transaction-wide rejections
    pub fn observe(&self, contract: Option<ContractId>, rejected: Option<ViolationKind>) {
        let contract = contract.map_or("none", |c| c.as_str());
        let outcome = if rejected.is_some() { "rejected" } else { "accepted" };

        self.verdicts.with_label_values(&[contract, outcome]).inc();
        if let Some(kind) = rejected {
            self.rejections.with_label_values(&[kind.as_str()]).inc();
        }
    }

    /// Current verdict count
    pub fn count(&self, contract: &str, outcome: &str) -> u64 {
        self.verdicts.with_label_values(&[contract, outcome]).get()
    }

    /// Current rejection count for a kind label
    pub fn rejections(&self, kind: &str) -> u64 {
        self.rejections.with_label_values(&[kind]).get()
    }

    /// Text exposition format
    pub fn render(&self) -> Result<String> {
        let families = self.registry.gather();
        Ok(TextEncoder::new().encode_to_string(&families)?)
    }
}

impl fmt::Debug for VerifierMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifierMetrics").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_independent_registries() {
        let a = VerifierMetrics::new().unwrap();
        let b = VerifierMetrics::new().unwrap();

        a.observe(Some(ContractId::Obligation), Some(ViolationKind::SignatureViolation));

        assert_eq!(a.count("obligation", "rejected"), 1);
        assert_eq!(a.rejections("signature_violation"), 1);
        assert_eq!(b.count("obligation", "rejected"), 0);
    }

    #[test]
    fn test_render_exposition() {
        let metrics = VerifierMetrics::new().unwrap();
        metrics.observe(Some(ContractId::Cash), None);

        let text = metrics.render().unwrap();
        assert!(text.contains("ledger_contract_verdicts_total"));
        assert!(text.contains("outcome=\"accepted\""));
    }
}
