//! Production workflow state machine
//!
//! A single authoritative transition table for the order workflow. Every
//! service and handler that moves an order consults this module instead of
//! branching on raw status strings.

use serde::{Deserialize, Serialize};

/// Production status of an order
///
/// The full path is Draft → ReadyForProd → Print → PrintDone →
/// (Press and/or Cutting, route dependent) → Completed → Delivered.
/// Delivered ("diserahkan") is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionStatus {
    Draft,
    ReadyForProd,
    Print,
    PrintDone,
    Press,
    Cutting,
    Completed,
    Delivered,
}

impl ProductionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductionStatus::Draft => "draft",
            ProductionStatus::ReadyForProd => "ready_for_prod",
            ProductionStatus::Print => "print",
            ProductionStatus::PrintDone => "print_done",
            ProductionStatus::Press => "press",
            ProductionStatus::Cutting => "cutting",
            ProductionStatus::Completed => "completed",
            ProductionStatus::Delivered => "delivered",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(ProductionStatus::Draft),
            "ready_for_prod" => Some(ProductionStatus::ReadyForProd),
            "print" => Some(ProductionStatus::Print),
            "print_done" => Some(ProductionStatus::PrintDone),
            "press" => Some(ProductionStatus::Press),
            "cutting" => Some(ProductionStatus::Cutting),
            "completed" => Some(ProductionStatus::Completed),
            "delivered" => Some(ProductionStatus::Delivered),
            _ => None,
        }
    }

    /// Next status along the given route, or None when terminal
    pub fn next(&self, route: ProductionRoute) -> Option<ProductionStatus> {
        let seq = route.sequence();
        let pos = seq.iter().position(|s| s == self)?;
        seq.get(pos + 1).copied()
    }

    /// Whether the order is still before the Completed milestone
    pub fn is_in_production(&self) -> bool {
        !matches!(
            self,
            ProductionStatus::Completed | ProductionStatus::Delivered
        )
    }
}

/// Production route derived from the order's product composition
///
/// The route is the union of the `needs_press` / `needs_cutting` flags over
/// all order items. When both press and cutting are required, press runs
/// first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionRoute {
    PrintOnly,
    Press,
    Cutting,
    PressAndCutting,
}

impl ProductionRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductionRoute::PrintOnly => "print_only",
            ProductionRoute::Press => "press",
            ProductionRoute::Cutting => "cutting",
            ProductionRoute::PressAndCutting => "press_and_cutting",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "print_only" => Some(ProductionRoute::PrintOnly),
            "press" => Some(ProductionRoute::Press),
            "cutting" => Some(ProductionRoute::Cutting),
            "press_and_cutting" => Some(ProductionRoute::PressAndCutting),
            _ => None,
        }
    }

    /// Derive the route from per-item composition flags
    pub fn from_composition(needs_press: bool, needs_cutting: bool) -> Self {
        match (needs_press, needs_cutting) {
            (false, false) => ProductionRoute::PrintOnly,
            (true, false) => ProductionRoute::Press,
            (false, true) => ProductionRoute::Cutting,
            (true, true) => ProductionRoute::PressAndCutting,
        }
    }

    /// Full ordered status path for this route
    pub fn sequence(&self) -> &'static [ProductionStatus] {
        use ProductionStatus::*;
        match self {
            ProductionRoute::PrintOnly => &[
                Draft,
                ReadyForProd,
                Print,
                PrintDone,
                Completed,
                Delivered,
            ],
            ProductionRoute::Press => &[
                Draft,
                ReadyForProd,
                Print,
                PrintDone,
                Press,
                Completed,
                Delivered,
            ],
            ProductionRoute::Cutting => &[
                Draft,
                ReadyForProd,
                Print,
                PrintDone,
                Cutting,
                Completed,
                Delivered,
            ],
            ProductionRoute::PressAndCutting => &[
                Draft,
                ReadyForProd,
                Print,
                PrintDone,
                Press,
                Cutting,
                Completed,
                Delivered,
            ],
        }
    }

    pub fn requires_press(&self) -> bool {
        matches!(self, ProductionRoute::Press | ProductionRoute::PressAndCutting)
    }

    pub fn requires_cutting(&self) -> bool {
        matches!(
            self,
            ProductionRoute::Cutting | ProductionRoute::PressAndCutting
        )
    }
}

/// Check whether a transition is the single next step along the route
///
/// Transitions never skip a step, never revert, and never cross onto a
/// branch the route does not include.
pub fn can_advance(
    from: ProductionStatus,
    to: ProductionStatus,
    route: ProductionRoute,
) -> bool {
    from.next(route) == Some(to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_only_skips_press_and_cutting() {
        let route = ProductionRoute::PrintOnly;
        assert_eq!(
            ProductionStatus::PrintDone.next(route),
            Some(ProductionStatus::Completed)
        );
        assert!(!can_advance(
            ProductionStatus::PrintDone,
            ProductionStatus::Press,
            route
        ));
    }

    #[test]
    fn press_and_cutting_runs_press_first() {
        let route = ProductionRoute::PressAndCutting;
        assert_eq!(
            ProductionStatus::PrintDone.next(route),
            Some(ProductionStatus::Press)
        );
        assert_eq!(
            ProductionStatus::Press.next(route),
            Some(ProductionStatus::Cutting)
        );
        assert_eq!(
            ProductionStatus::Cutting.next(route),
            Some(ProductionStatus::Completed)
        );
    }

    #[test]
    fn delivered_is_terminal_on_every_route() {
        for route in [
            ProductionRoute::PrintOnly,
            ProductionRoute::Press,
            ProductionRoute::Cutting,
            ProductionRoute::PressAndCutting,
        ] {
            assert_eq!(ProductionStatus::Delivered.next(route), None);
        }
    }

    #[test]
    fn status_round_trips_through_db_string() {
        for status in [
            ProductionStatus::Draft,
            ProductionStatus::ReadyForProd,
            ProductionStatus::Print,
            ProductionStatus::PrintDone,
            ProductionStatus::Press,
            ProductionStatus::Cutting,
            ProductionStatus::Completed,
            ProductionStatus::Delivered,
        ] {
            assert_eq!(ProductionStatus::from_str(status.as_str()), Some(status));
        }
    }
}
