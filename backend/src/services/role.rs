//! Role management service
//!
//! Permissions are stored as a JSONB document on the role. System roles
//! (admin, finance, operator) are seeded at migration time and cannot be
//! renamed or deleted.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{Permission, Role, User};
use shared::types::Language;

/// Role service
#[derive(Clone)]
pub struct RoleService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
    is_system_role: bool,
    permissions: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<RoleRow> for Role {
    type Error = AppError;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        let permissions: Vec<Permission> = serde_json::from_value(row.permissions)
            .map_err(|e| AppError::Internal(format!("Malformed role permissions: {}", e)))?;
        Ok(Role {
            id: row.id,
            name: row.name,
            is_system_role: row.is_system_role,
            permissions,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    phone: Option<String>,
    role_id: Uuid,
    preferred_language: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let preferred_language = match row.preferred_language.as_str() {
            "en" => Language::English,
            _ => Language::Indonesian,
        };
        User {
            id: row.id,
            email: row.email,
            name: row.name,
            phone: row.phone,
            role_id: row.role_id,
            preferred_language,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const USER_COLUMNS: &str = "id, email, name, phone, role_id, preferred_language, is_active, \
     created_at, updated_at";

/// Input for creating a custom role
#[derive(Debug, Deserialize)]
pub struct CreateRoleInput {
    pub name: String,
    pub permissions: Vec<Permission>,
}

/// Input for updating a custom role
#[derive(Debug, Deserialize)]
pub struct UpdateRoleInput {
    pub name: Option<String>,
    pub permissions: Option<Vec<Permission>>,
}

impl RoleService {
    /// Create a new RoleService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List all roles, system roles first
    pub async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, is_system_role, permissions, created_at
            FROM roles
            ORDER BY is_system_role DESC, name ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// Get one role
    pub async fn get_role(&self, role_id: Uuid) -> AppResult<Role> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, is_system_role, permissions, created_at
            FROM roles
            WHERE id = $1
            "#,
        )
        .bind(role_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Role".to_string()))?;

        row.try_into()
    }

    /// Create a custom role
    pub async fn create_role(&self, input: CreateRoleInput) -> AppResult<Role> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Role name is required".to_string(),
                message_id: "Nama peran wajib diisi".to_string(),
            });
        }

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM roles WHERE LOWER(name) = LOWER($1)",
        )
        .bind(name)
        .fetch_one(&self.db)
        .await?;
        if existing > 0 {
            return Err(AppError::DuplicateEntry(format!(
                "Role '{}' already exists",
                name
            )));
        }

        let permissions = serde_json::to_value(&input.permissions)
            .map_err(|e| AppError::Internal(format!("Permission serialization failed: {}", e)))?;

        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            INSERT INTO roles (name, is_system_role, permissions)
            VALUES ($1, false, $2)
            RETURNING id, name, is_system_role, permissions, created_at
            "#,
        )
        .bind(name)
        .bind(permissions)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    /// Update a custom role; system roles are immutable
    pub async fn update_role(&self, role_id: Uuid, input: UpdateRoleInput) -> AppResult<Role> {
        let current = self.get_role(role_id).await?;
        if current.is_system_role {
            return Err(AppError::Conflict {
                resource: "role".to_string(),
                message: "System roles cannot be modified".to_string(),
                message_id: "Peran bawaan tidak dapat diubah".to_string(),
            });
        }

        let name = input.name.unwrap_or(current.name);
        let permissions = input.permissions.unwrap_or(current.permissions);
        let permissions = serde_json::to_value(&permissions)
            .map_err(|e| AppError::Internal(format!("Permission serialization failed: {}", e)))?;

        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            UPDATE roles SET name = $1, permissions = $2
            WHERE id = $3
            RETURNING id, name, is_system_role, permissions, created_at
            "#,
        )
        .bind(name.trim())
        .bind(permissions)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    /// Delete a custom role with no users assigned
    pub async fn delete_role(&self, role_id: Uuid) -> AppResult<()> {
        let current = self.get_role(role_id).await?;
        if current.is_system_role {
            return Err(AppError::Conflict {
                resource: "role".to_string(),
                message: "System roles cannot be deleted".to_string(),
                message_id: "Peran bawaan tidak dapat dihapus".to_string(),
            });
        }

        let assigned = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE role_id = $1",
        )
        .bind(role_id)
        .fetch_one(&self.db)
        .await?;
        if assigned > 0 {
            return Err(AppError::Conflict {
                resource: "role".to_string(),
                message: "Role is assigned to users".to_string(),
                message_id: "Peran masih digunakan oleh pengguna".to_string(),
            });
        }

        sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(role_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// List users with their role assignment
    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY name"
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Move a user to another role
    pub async fn assign_role(&self, user_id: Uuid, role_id: Uuid) -> AppResult<User> {
        self.get_role(role_id).await?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users SET role_id = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(role_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        Ok(row.into())
    }

    /// Deactivate a user account
    pub async fn deactivate_user(&self, user_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE users SET is_active = false, updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }
        Ok(())
    }
}
