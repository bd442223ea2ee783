//! Role permission flattening tests
//!
//! Permissions are stored structured on the role and flattened into
//! `resource:action` claim strings when a token is issued.

use proptest::prelude::*;

use shared::models::{default_roles, Action, Permission, Resource};

fn resource_strategy() -> impl Strategy<Value = Resource> {
    prop_oneof![
        Just(Resource::Customer),
        Just(Resource::Order),
        Just(Resource::Production),
        Just(Resource::Finance),
        Just(Resource::Inventory),
        Just(Resource::Whatsapp),
        Just(Resource::User),
        Just(Resource::Role),
    ]
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::View),
        Just(Action::Create),
        Just(Action::Edit),
        Just(Action::Delete),
    ]
}

proptest! {
    /// Claim strings always take the form `resource:action`, one per
    /// granted action, in order.
    #[test]
    fn claims_are_colon_separated_pairs(
        resource in resource_strategy(),
        actions in prop::collection::vec(action_strategy(), 1..4),
    ) {
        let permission = Permission { resource: resource.clone(), actions: actions.clone() };
        let claims = permission.claim_strings();

        prop_assert_eq!(claims.len(), actions.len());
        for (claim, action) in claims.iter().zip(&actions) {
            let (r, a) = claim.split_once(':').unwrap();
            prop_assert_eq!(r, resource.as_str());
            prop_assert_eq!(a, action.as_str());
        }
    }
}

#[test]
fn default_roles_are_admin_finance_operator() {
    let roles = default_roles();
    let names: Vec<&str> = roles.iter().map(|(name, _)| *name).collect();
    assert_eq!(names, vec!["admin", "finance", "operator"]);
}

#[test]
fn admin_has_full_access_everywhere() {
    let roles = default_roles();
    let (_, admin) = &roles[0];
    assert_eq!(admin.len(), 8);
    for permission in admin {
        assert_eq!(permission.actions.len(), 4);
    }
}

#[test]
fn operator_cannot_touch_finance() {
    let roles = default_roles();
    let (_, operator) = roles
        .iter()
        .find(|(name, _)| *name == "operator")
        .unwrap();
    assert!(operator
        .iter()
        .all(|p| p.resource != Resource::Finance));
}

#[test]
fn finance_role_cannot_delete() {
    let roles = default_roles();
    let (_, finance) = roles
        .iter()
        .find(|(name, _)| *name == "finance")
        .unwrap();
    assert!(finance
        .iter()
        .all(|p| !p.actions.contains(&Action::Delete)));
}

#[test]
fn claim_string_serialization_matches_json_encoding() {
    let permission = Permission {
        resource: Resource::Whatsapp,
        actions: vec![Action::View],
    };
    assert_eq!(permission.claim_strings(), vec!["whatsapp:view"]);

    let json = serde_json::to_value(&permission).unwrap();
    assert_eq!(json["resource"], "whatsapp");
    assert_eq!(json["actions"][0], "view");
}
