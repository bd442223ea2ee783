//! Invoice and bill settlement state tests

use proptest::prelude::*;
use rust_decimal::Decimal;

use shared::models::{PaymentMethod, SettlementStatus};

fn rupiah(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=100_000_000_000).prop_map(rupiah)
}

proptest! {
    /// Paying the full total always settles the document, however the
    /// payments were split.
    #[test]
    fn full_payment_settles(total in amount_strategy()) {
        prop_assert_eq!(SettlementStatus::derive(total, total), SettlementStatus::Paid);
    }

    /// A payment strictly between zero and the total leaves it partial.
    #[test]
    fn partial_payment_stays_partial(total in amount_strategy()) {
        let paid = total / Decimal::from(2);
        prop_assume!(paid > Decimal::ZERO && paid < total);
        prop_assert_eq!(SettlementStatus::derive(total, paid), SettlementStatus::Partial);
    }

    /// derive never returns Void; voiding is an explicit action, not a
    /// consequence of amounts.
    #[test]
    fn derive_never_voids(total in amount_strategy(), paid in amount_strategy()) {
        prop_assert_ne!(SettlementStatus::derive(total, paid), SettlementStatus::Void);
    }
}

#[test]
fn zero_paid_is_unpaid() {
    assert_eq!(
        SettlementStatus::derive(rupiah(500_000_00), Decimal::ZERO),
        SettlementStatus::Unpaid
    );
}

#[test]
fn one_cent_short_is_partial() {
    assert_eq!(
        SettlementStatus::derive(rupiah(500_000_00), rupiah(499_999_99)),
        SettlementStatus::Partial
    );
}

#[test]
fn exact_total_is_paid() {
    assert_eq!(
        SettlementStatus::derive(rupiah(500_000_00), rupiah(500_000_00)),
        SettlementStatus::Paid
    );
}

#[test]
fn status_string_round_trip() {
    for status in [
        SettlementStatus::Unpaid,
        SettlementStatus::Partial,
        SettlementStatus::Paid,
        SettlementStatus::Void,
    ] {
        assert_eq!(SettlementStatus::from_str(status.as_str()), Some(status));
    }
}

#[test]
fn payment_method_string_round_trip() {
    for method in [PaymentMethod::Cash, PaymentMethod::Transfer] {
        assert_eq!(PaymentMethod::from_str(method.as_str()), Some(method));
    }
}
