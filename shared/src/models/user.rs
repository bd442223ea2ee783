//! User and role models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Language;

/// A user account on the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role_id: Uuid,
    pub preferred_language: Language,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A role defining permissions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub is_system_role: bool,
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
}

/// A permission granting access to a resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Permission {
    pub resource: Resource,
    pub actions: Vec<Action>,
}

impl Permission {
    /// Flatten to the `resource:action` strings carried in JWT claims
    pub fn claim_strings(&self) -> Vec<String> {
        self.actions
            .iter()
            .map(|a| format!("{}:{}", self.resource.as_str(), a.as_str()))
            .collect()
    }
}

/// Resources that can be accessed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Customer,
    Order,
    Production,
    Finance,
    Inventory,
    Whatsapp,
    User,
    Role,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Customer => "customer",
            Resource::Order => "order",
            Resource::Production => "production",
            Resource::Finance => "finance",
            Resource::Inventory => "inventory",
            Resource::Whatsapp => "whatsapp",
            Resource::User => "user",
            Resource::Role => "role",
        }
    }
}

/// Actions that can be performed on resources
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }
}

fn full_access(resource: Resource) -> Permission {
    Permission {
        resource,
        actions: vec![Action::View, Action::Create, Action::Edit, Action::Delete],
    }
}

/// Default roles seeded at first run
pub fn default_roles() -> Vec<(&'static str, Vec<Permission>)> {
    vec![
        (
            "admin",
            vec![
                full_access(Resource::Customer),
                full_access(Resource::Order),
                full_access(Resource::Production),
                full_access(Resource::Finance),
                full_access(Resource::Inventory),
                full_access(Resource::Whatsapp),
                full_access(Resource::User),
                full_access(Resource::Role),
            ],
        ),
        (
            "finance",
            vec![
                Permission {
                    resource: Resource::Finance,
                    actions: vec![Action::View, Action::Create, Action::Edit],
                },
                Permission {
                    resource: Resource::Order,
                    actions: vec![Action::View],
                },
                Permission {
                    resource: Resource::Customer,
                    actions: vec![Action::View],
                },
            ],
        ),
        (
            "operator",
            vec![
                Permission {
                    resource: Resource::Order,
                    actions: vec![Action::View],
                },
                Permission {
                    resource: Resource::Production,
                    actions: vec![Action::View, Action::Edit],
                },
                Permission {
                    resource: Resource::Inventory,
                    actions: vec![Action::View, Action::Create],
                },
            ],
        ),
    ]
}
