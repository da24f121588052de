//! Property-based tests for verification invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Conservation: a move is accepted only if Σ(inputs) == Σ(outputs)
//! - Creator invariance: accepted moves carry exactly one creator
//! - Positivity: create with a non-positive output always fails
//! - Signer sufficiency: an unsigned previous owner always fails
//! - Overflow guard: totals beyond i64 never balance
//! - Determinism: the same transaction always gets the same verdict

use ledger_core::{
    arithmetic::checked_sum,
    crypto::KeyPair,
    types::{CashCommand, CashRecord, CommandData, ObligationCommand, ObligationRecord, Party, Transaction, TransactionBuilder},
    ContractId, LedgerVerifier, Verdict,
};
use proptest::prelude::*;
use std::collections::HashSet;

fn party(name: &str, seed: u8) -> Party {
    Party::new(name, KeyPair::from_seed(&[seed; 32]).public_key())
}

struct Cast {
    bank: Party,
    other_bank: Party,
    alice: Party,
    bob: Party,
}

fn cast() -> Cast {
    Cast {
        bank: party("Bank", 1),
        other_bank: party("OtherBank", 2),
        alice: party("Alice", 3),
        bob: party("Bob", 4),
    }
}

/// Strategy for generating valid cash values
fn value_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000_000
}

/// Strategy for generating value lists
fn values_strategy() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(value_strategy(), 1..8)
}

/// Move from Alice to Bob, signed by Alice
fn alice_to_bob(c: &Cast, inputs: &[i64], outputs: &[i64]) -> Transaction {
    let mut builder = TransactionBuilder::new()
        .add_command(CommandData::Cash(CashCommand::Move), [c.alice.owning_key]);
    for v in inputs {
        builder = builder.add_input_state(CashRecord::new(*v, c.bank.clone(), c.alice.clone()));
    }
    for v in outputs {
        builder = builder.add_output_state(CashRecord::new(*v, c.bank.clone(), c.bob.clone()));
    }
    builder.build()
}

/// Re-split `total` into `parts` positive values
fn split(total: i64, parts: usize) -> Vec<i64> {
    let parts = parts.clamp(1, total as usize) as i64;
    let mut values = vec![total / parts; parts as usize];
    values[0] += total % parts;
    values
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: balanced moves are accepted whatever the split
    #[test]
    fn prop_conserving_move_accepted(inputs in values_strategy(), parts in 1usize..6) {
        let c = cast();
        let total = checked_sum(inputs.iter().copied()).unwrap();
        let tx = alice_to_bob(&c, &inputs, &split(total, parts));

        prop_assert_eq!(LedgerVerifier::new().verify(&tx), Verdict::Accepted);
    }

    /// Property: any imbalance is rejected with the value-mismatch reason
    #[test]
    fn prop_unbalanced_move_rejected(inputs in values_strategy(), delta in prop_oneof![-1000i64..0, 1i64..1000]) {
        let c = cast();
        let total = checked_sum(inputs.iter().copied()).unwrap();
        prop_assume!(total + delta > 0);
        let tx = alice_to_bob(&c, &inputs, &[total + delta]);

        let report = LedgerVerifier::new().verify(&tx).into_result().unwrap_err();
        prop_assert_eq!(report.reason, "in/out value must match");
    }

    /// Property: accepted moves have exactly one distinct creator
    #[test]
    fn prop_creator_invariance(inputs in values_strategy(), forged_index in 0usize..8) {
        let c = cast();
        let mut tx = alice_to_bob(&c, &inputs, &inputs);
        let index = forged_index % tx.outputs.len();
        if let ledger_core::LedgerRecord::Cash(cash) = &mut tx.outputs[index] {
            cash.creator = c.other_bank.clone();
        }

        let creators: HashSet<_> = tx
            .cash_inputs()
            .into_iter()
            .chain(tx.cash_outputs())
            .map(|cash| cash.creator.name.clone())
            .collect();
        prop_assert_eq!(creators.len(), 2);

        let report = LedgerVerifier::new().verify(&tx).into_result().unwrap_err();
        prop_assert_eq!(report.reason, "Creator stays intact.");
    }

    /// Property: create with a zero or negative output always rejects
    #[test]
    fn prop_non_positive_create_rejected(good in values_strategy(), bad in -1_000_000i64..=0) {
        let c = cast();
        let mut builder = TransactionBuilder::new()
            .add_command(CommandData::Cash(CashCommand::Create), [c.bank.owning_key]);
        for v in &good {
            builder = builder.add_output_state(CashRecord::new(*v, c.bank.clone(), c.alice.clone()));
        }
        let tx = builder
            .add_output_state(CashRecord::new(bad, c.bank.clone(), c.alice.clone()))
            .build();

        let report = LedgerVerifier::new().verify(&tx).into_result().unwrap_err();
        prop_assert_eq!(report.reason, "Cash value must be positive");
    }

    /// Property: a move never verifies without the previous owner's key
    #[test]
    fn prop_previous_owner_must_sign(inputs in values_strategy()) {
        let c = cast();
        let mut tx = alice_to_bob(&c, &inputs, &inputs);
        tx.commands[0].signers = vec![c.bob.owning_key, c.bank.owning_key];

        let report = LedgerVerifier::new().verify(&tx).into_result().unwrap_err();
        prop_assert_eq!(report.contract, Some(ContractId::Cash));
        prop_assert_eq!(report.reason, "Previous cash owner must sign.");
    }

    /// Property: totals past i64::MAX are rejected instead of wrapping
    #[test]
    fn prop_overflow_never_balances(extra in 1i64..1_000_000) {
        let c = cast();
        let inputs = [i64::MAX, extra];
        // What a wrapping sum of the inputs would produce.
        let wrapped = i64::MAX.wrapping_add(extra);
        let outputs = [i64::MAX, extra];

        let tx = alice_to_bob(&c, &inputs, &outputs);
        let report = LedgerVerifier::new().verify(&tx).into_result().unwrap_err();
        prop_assert_eq!(report.reason, "in/out value must match");
        prop_assert!(wrapped < 0);
    }

    /// Property: verdicts are deterministic
    #[test]
    fn prop_deterministic_verdict(inputs in values_strategy(), outputs in values_strategy()) {
        let c = cast();
        let tx = alice_to_bob(&c, &inputs, &outputs);
        let verifier = LedgerVerifier::new();

        prop_assert_eq!(verifier.verify(&tx), verifier.verify(&tx.clone()));
        prop_assert_eq!(tx.id().unwrap(), tx.clone().id().unwrap());
    }

    /// Property: an IOU lent to oneself is always rejected
    #[test]
    fn prop_self_lending_rejected(value in value_strategy()) {
        let c = cast();
        let tx = TransactionBuilder::new()
            .add_output_state(ObligationRecord::new(value, c.alice.clone(), c.alice.clone()))
            .add_command(
                CommandData::Obligation(ObligationCommand::Create),
                [c.alice.owning_key, c.bob.owning_key],
            )
            .build();

        let report = LedgerVerifier::new().verify(&tx).into_result().unwrap_err();
        prop_assert_eq!(report.reason, "The lender and the borrower cannot be the same entity.");
    }

    /// Property: destroy only verifies when the lender receives exactly the IOU value
    #[test]
    fn prop_exact_payback(value in value_strategy(), paid in value_strategy(), extra in 0i64..100) {
        let c = cast();
        let lender = c.alice.clone();
        let borrower = c.bob.clone();

        let mut builder = TransactionBuilder::new()
            .add_command(CommandData::Obligation(ObligationCommand::Destroy), [lender.owning_key])
            .add_command(CommandData::Cash(CashCommand::Move), [borrower.owning_key])
            .add_input_state(ObligationRecord::new(value, lender.clone(), borrower.clone()))
            .add_input_state(CashRecord::new(paid + extra, c.bank.clone(), borrower.clone()))
            .add_output_state(CashRecord::new(paid, c.bank.clone(), lender.clone()));
        if extra > 0 {
            builder = builder.add_output_state(CashRecord::new(extra, c.bank.clone(), borrower.clone()));
        }
        let tx = builder.build();

        let verdict = LedgerVerifier::new().verify(&tx);
        if paid == value {
            prop_assert_eq!(verdict, Verdict::Accepted);
        } else {
            let report = verdict.into_result().unwrap_err();
            prop_assert_eq!(report.contract, Some(ContractId::Obligation));
            prop_assert_eq!(report.reason, "Expect exact payback value.");
        }
    }

    /// Property: destroy that leaves an IOU output behind always rejects
    #[test]
    fn prop_destroy_with_iou_output_rejected(value in value_strategy()) {
        let c = cast();
        let lender = c.alice.clone();
        let borrower = c.bob.clone();
        let iou = ObligationRecord::new(value, lender.clone(), borrower.clone());

        let tx = TransactionBuilder::new()
            .add_command(CommandData::Obligation(ObligationCommand::Destroy), [lender.owning_key])
            .add_command(CommandData::Cash(CashCommand::Move), [borrower.owning_key])
            .add_input_state(iou.clone())
            .add_input_state(CashRecord::new(value, c.bank.clone(), borrower.clone()))
            .add_output_state(CashRecord::new(value, c.bank.clone(), lender.clone()))
            .add_output_state(iou)
            .build();

        let report = LedgerVerifier::new().verify(&tx).into_result().unwrap_err();
        prop_assert_eq!(report.reason, "There should be no IOUState output.");
    }
}

#[test]
fn two_long_max_inputs_reject() {
    let c = cast();
    let tx = alice_to_bob(&c, &[i64::MAX, i64::MAX], &[i64::MAX.wrapping_add(i64::MAX)]);
    let report = LedgerVerifier::new().verify(&tx).into_result().unwrap_err();
    assert_eq!(report.reason, "in/out value must match");
}
