//! Production workflow state machine tests
//!
//! Covers route derivation from product composition and the single-step
//! transition rule: no skipping, no reverting, no crossing onto stations
//! the route does not include.

use proptest::prelude::*;

use shared::models::{can_advance, ProductionRoute, ProductionStatus};

fn status_strategy() -> impl Strategy<Value = ProductionStatus> {
    prop_oneof![
        Just(ProductionStatus::Draft),
        Just(ProductionStatus::ReadyForProd),
        Just(ProductionStatus::Print),
        Just(ProductionStatus::PrintDone),
        Just(ProductionStatus::Press),
        Just(ProductionStatus::Cutting),
        Just(ProductionStatus::Completed),
        Just(ProductionStatus::Delivered),
    ]
}

fn route_strategy() -> impl Strategy<Value = ProductionRoute> {
    prop_oneof![
        Just(ProductionRoute::PrintOnly),
        Just(ProductionRoute::Press),
        Just(ProductionRoute::Cutting),
        Just(ProductionRoute::PressAndCutting),
    ]
}

proptest! {
    /// A transition is allowed iff the target is exactly the next station
    /// along the route.
    #[test]
    fn advance_only_to_immediate_next(
        from in status_strategy(),
        to in status_strategy(),
        route in route_strategy(),
    ) {
        let allowed = can_advance(from, to, route);
        let seq = route.sequence();
        let from_pos = seq.iter().position(|s| *s == from);
        let to_pos = seq.iter().position(|s| *s == to);

        match (from_pos, to_pos) {
            (Some(f), Some(t)) => prop_assert_eq!(allowed, t == f + 1),
            _ => prop_assert!(!allowed),
        }
    }

    /// Walking next() from Draft always terminates at Delivered without
    /// revisiting a status.
    #[test]
    fn sequence_walk_reaches_delivered(route in route_strategy()) {
        let mut seen = Vec::new();
        let mut current = ProductionStatus::Draft;
        seen.push(current);
        while let Some(next) = current.next(route) {
            prop_assert!(!seen.contains(&next));
            seen.push(next);
            current = next;
        }
        prop_assert_eq!(current, ProductionStatus::Delivered);
    }

    /// Delivered is terminal on every route.
    #[test]
    fn delivered_is_terminal(route in route_strategy(), to in status_strategy()) {
        prop_assert!(!can_advance(ProductionStatus::Delivered, to, route));
    }

    /// Statuses and routes survive their string encoding.
    #[test]
    fn status_string_round_trip(status in status_strategy()) {
        prop_assert_eq!(ProductionStatus::from_str(status.as_str()), Some(status));
    }
}

#[test]
fn route_from_composition_covers_all_cases() {
    assert_eq!(
        ProductionRoute::from_composition(false, false),
        ProductionRoute::PrintOnly
    );
    assert_eq!(
        ProductionRoute::from_composition(true, false),
        ProductionRoute::Press
    );
    assert_eq!(
        ProductionRoute::from_composition(false, true),
        ProductionRoute::Cutting
    );
    assert_eq!(
        ProductionRoute::from_composition(true, true),
        ProductionRoute::PressAndCutting
    );
}

#[test]
fn press_runs_before_cutting_on_combined_route() {
    let seq = ProductionRoute::PressAndCutting.sequence();
    let press = seq
        .iter()
        .position(|s| *s == ProductionStatus::Press)
        .unwrap();
    let cutting = seq
        .iter()
        .position(|s| *s == ProductionStatus::Cutting)
        .unwrap();
    assert!(press < cutting);
}

#[test]
fn print_only_route_never_visits_finishing_stations() {
    let seq = ProductionRoute::PrintOnly.sequence();
    assert!(!seq.contains(&ProductionStatus::Press));
    assert!(!seq.contains(&ProductionStatus::Cutting));
}

#[test]
fn cutting_route_skips_press() {
    assert!(!can_advance(
        ProductionStatus::PrintDone,
        ProductionStatus::Press,
        ProductionRoute::Cutting
    ));
    assert!(can_advance(
        ProductionStatus::PrintDone,
        ProductionStatus::Cutting,
        ProductionRoute::Cutting
    ));
}

#[test]
fn cannot_skip_print_done() {
    assert!(!can_advance(
        ProductionStatus::Print,
        ProductionStatus::Press,
        ProductionRoute::PressAndCutting
    ));
}

#[test]
fn cannot_revert() {
    assert!(!can_advance(
        ProductionStatus::Press,
        ProductionStatus::Print,
        ProductionRoute::PressAndCutting
    ));
    assert!(!can_advance(
        ProductionStatus::Completed,
        ProductionStatus::Cutting,
        ProductionRoute::PressAndCutting
    ));
}

#[test]
fn in_production_flag_matches_milestones() {
    assert!(ProductionStatus::Draft.is_in_production());
    assert!(ProductionStatus::Cutting.is_in_production());
    assert!(!ProductionStatus::Completed.is_in_production());
    assert!(!ProductionStatus::Delivered.is_in_production());
}
