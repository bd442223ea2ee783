//! Straight-line depreciation math tests

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::Asset;

fn asset(cost: i64, life_months: i32, salvage: i64, accumulated: i64) -> Asset {
    Asset {
        id: Uuid::new_v4(),
        name: "Mesin Press".to_string(),
        acquisition_cost: Decimal::new(cost, 2),
        acquisition_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        useful_life_months: life_months,
        salvage_value: Decimal::new(salvage, 2),
        accumulated_depreciation: Decimal::new(accumulated, 2),
        is_active: true,
        created_at: Utc::now(),
    }
}

proptest! {
    /// The monthly charge never depreciates below salvage value.
    #[test]
    fn charge_never_exceeds_remainder(
        cost in 1_000_00i64..1_000_000_000_00,
        life in 1i32..240,
        salvage_pct in 0i64..90,
        charged_pct in 0i64..=100,
    ) {
        let salvage = cost * salvage_pct / 100;
        let accumulated = (cost - salvage) * charged_pct / 100;
        let a = asset(cost, life, salvage, accumulated);

        let charge = a.monthly_depreciation();
        prop_assert!(charge >= Decimal::ZERO);
        prop_assert!(charge <= a.depreciable_remainder());
        prop_assert!(
            a.accumulated_depreciation + charge
                <= a.acquisition_cost - a.salvage_value + Decimal::new(1, 2)
        );
    }

    /// Charging every month for the full life writes the asset down to
    /// exactly its salvage value.
    #[test]
    fn full_life_writes_down_to_salvage(
        cost in 1_000_00i64..1_000_000_00,
        life in 1i32..120,
    ) {
        let mut a = asset(cost, life, 0, 0);
        for _ in 0..life + 3 {
            let charge = a.monthly_depreciation();
            a.accumulated_depreciation += charge;
        }
        // Within rounding of the per-month division
        let residual = a.depreciable_remainder();
        prop_assert!(residual <= Decimal::new(1, 2));
    }
}

#[test]
fn even_division_over_life() {
    // 120,000,000 over 60 months, no salvage
    let a = asset(120_000_000_00, 60, 0, 0);
    assert_eq!(a.monthly_depreciation(), Decimal::new(2_000_000_00, 2));
}

#[test]
fn salvage_reduces_base() {
    // (100jt - 10jt) / 36
    let a = asset(100_000_000_00, 36, 10_000_000_00, 0);
    assert_eq!(
        a.monthly_depreciation(),
        Decimal::new(90_000_000_00, 2) / Decimal::from(36)
    );
}

#[test]
fn final_month_is_capped_at_remainder() {
    // Remainder of 500,000 left, straight-line charge would be 2jt
    let a = asset(120_000_000_00, 60, 0, 119_500_000_00);
    assert_eq!(a.monthly_depreciation(), Decimal::new(500_000_00, 2));
}

#[test]
fn fully_depreciated_asset_charges_nothing() {
    let a = asset(50_000_000_00, 24, 5_000_000_00, 45_000_000_00);
    assert_eq!(a.depreciable_remainder(), Decimal::ZERO);
    assert_eq!(a.monthly_depreciation(), Decimal::ZERO);
}

#[test]
fn zero_life_charges_nothing() {
    let a = asset(10_000_000_00, 0, 0, 0);
    assert_eq!(a.monthly_depreciation(), Decimal::ZERO);
}
