//! Double-entry balance invariant tests
//!
//! Every posted journal entry must satisfy Σdebit = Σcredit within the
//! 0.01 rounding tolerance, with each line carrying exactly one side.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::JournalLineInput;
use shared::validation::{balance_difference, balance_tolerance, validate_balanced};

fn debit_line(amount: Decimal) -> JournalLineInput {
    JournalLineInput {
        account_id: Uuid::new_v4(),
        debit: amount,
        credit: Decimal::ZERO,
        memo: None,
    }
}

fn credit_line(amount: Decimal) -> JournalLineInput {
    JournalLineInput {
        account_id: Uuid::new_v4(),
        debit: Decimal::ZERO,
        credit: amount,
        memo: None,
    }
}

/// Positive rupiah amounts with two decimal places, up to 1 billion
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=100_000_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    /// Splitting one amount across several debit lines against a single
    /// credit line is always balanced.
    #[test]
    fn split_debits_balance(amounts in prop::collection::vec(amount_strategy(), 1..6)) {
        let total: Decimal = amounts.iter().copied().sum();
        let mut lines: Vec<JournalLineInput> =
            amounts.into_iter().map(debit_line).collect();
        lines.push(credit_line(total));

        prop_assert!(validate_balanced(&lines).is_ok());
        prop_assert_eq!(balance_difference(&lines), Decimal::ZERO);
    }

    /// Any discrepancy beyond the tolerance is rejected.
    #[test]
    fn imbalance_is_rejected(
        amount in amount_strategy(),
        extra_cents in 2i64..1_000_000,
    ) {
        let lines = vec![
            debit_line(amount + Decimal::new(extra_cents, 2)),
            credit_line(amount),
        ];
        prop_assert!(validate_balanced(&lines).is_err());
    }

    /// Negative amounts never pass, regardless of the totals.
    #[test]
    fn negative_amounts_rejected(amount in amount_strategy()) {
        let lines = vec![
            JournalLineInput {
                account_id: Uuid::new_v4(),
                debit: -amount,
                credit: Decimal::ZERO,
                memo: None,
            },
            credit_line(-amount),
        ];
        prop_assert!(validate_balanced(&lines).is_err());
    }

    /// balance_difference is antisymmetric under swapping sides.
    #[test]
    fn difference_sign_tracks_heavier_side(a in amount_strategy(), b in amount_strategy()) {
        let lines = vec![debit_line(a), credit_line(b)];
        prop_assert_eq!(balance_difference(&lines), a - b);
    }
}

#[test]
fn single_line_is_rejected() {
    let lines = vec![debit_line(Decimal::new(50_000, 0))];
    assert!(validate_balanced(&lines).is_err());
}

#[test]
fn empty_entry_is_rejected() {
    assert!(validate_balanced(&[]).is_err());
}

#[test]
fn line_with_both_sides_is_rejected() {
    let lines = vec![
        JournalLineInput {
            account_id: Uuid::new_v4(),
            debit: Decimal::new(10_000, 0),
            credit: Decimal::new(10_000, 0),
            memo: None,
        },
        credit_line(Decimal::ZERO),
    ];
    assert!(validate_balanced(&lines).is_err());
}

#[test]
fn line_with_neither_side_is_rejected() {
    let lines = vec![debit_line(Decimal::new(10_000, 0)), credit_line(Decimal::ZERO)];
    assert!(validate_balanced(&lines).is_err());
}

#[test]
fn one_cent_rounding_slack_is_accepted() {
    let lines = vec![
        debit_line(Decimal::new(10_000_01, 2)),
        credit_line(Decimal::new(10_000_00, 2)),
    ];
    assert_eq!(balance_difference(&lines), balance_tolerance());
    assert!(validate_balanced(&lines).is_ok());
}

#[test]
fn two_cents_off_is_rejected() {
    let lines = vec![
        debit_line(Decimal::new(10_000_02, 2)),
        credit_line(Decimal::new(10_000_00, 2)),
    ];
    assert!(validate_balanced(&lines).is_err());
}
