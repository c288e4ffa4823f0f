// src/db/rbac_repo.rs

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::rbac::{PermissionTable, Role, RoleName, RoleScope},
};

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Role>, AppError>;

    /// Cargos de sistema + cargos da própria empresa.
    async fn list_visible(&self, company_id: Uuid) -> Result<Vec<Role>, AppError>;

    async fn create_role(&self, role: &Role) -> Result<Role, AppError>;
}

// Linha crua da tabela `roles`; o escopo vira `RoleScope` na conversão.
#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    permissions: Json<PermissionTable>,
    is_system_role: bool,
    company_id: Option<Uuid>,
}

impl TryFrom<RoleRow> for Role {
    type Error = AppError;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        let scope = match (row.is_system_role, row.company_id) {
            (true, None) => RoleScope::System,
            (false, Some(company_id)) => RoleScope::Company { company_id },
            _ => {
                return Err(anyhow!("cargo {} com escopo inconsistente", row.id).into());
            }
        };

        Ok(Role {
            id: row.id,
            name: RoleName::from(row.name.as_str()),
            description: row.description,
            permissions: row.permissions.0,
            scope,
        })
    }
}

#[derive(Clone)]
pub struct PgRoleRepository {
    pool: PgPool,
}

impl PgRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Role>, AppError> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, description, permissions, is_system_role, company_id
            FROM roles
            WHERE id = $1
            "#,
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Role::try_from).transpose()
    }

    async fn list_visible(&self, company_id: Uuid) -> Result<Vec<Role>, AppError> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, description, permissions, is_system_role, company_id
            FROM roles
            WHERE is_system_role = true OR company_id = $1
            ORDER BY is_system_role DESC, name
            "#,
        )
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Role::try_from).collect()
    }

    async fn create_role(&self, role: &Role) -> Result<Role, AppError> {
        let (is_system_role, company_id) = match role.scope {
            RoleScope::System => (true, None),
            RoleScope::Company { company_id } => (false, Some(company_id)),
        };

        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            INSERT INTO roles (id, name, description, permissions, is_system_role, company_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, description, permissions, is_system_role, company_id
            "#,
        )
            .bind(role.id)
            .bind(role.name.as_str())
            .bind(role.description.as_deref())
            .bind(Json(&role.permissions))
            .bind(is_system_role)
            .bind(company_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                // Empresa inexistente ou nome repetido viram erro de negócio, não 500
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_foreign_key_violation() {
                        return AppError::InvalidCompany;
                    }
                    if db_err.is_unique_violation() {
                        return AppError::RoleAlreadyExists;
                    }
                }
                e.into()
            })?;

        Role::try_from(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rbac::RoleTemplate;

    fn row(is_system_role: bool, company_id: Option<Uuid>) -> RoleRow {
        RoleRow {
            id: Uuid::new_v4(),
            name: "manager".into(),
            description: None,
            permissions: Json(RoleTemplate::Manager.permissions()),
            is_system_role,
            company_id,
        }
    }

    #[test]
    fn row_scope_becomes_tagged_variant() {
        let company = Uuid::new_v4();
        let role = Role::try_from(row(false, Some(company))).unwrap();
        assert_eq!(role.scope, RoleScope::Company { company_id: company });
        assert_eq!(role.name, RoleName::Manager);

        let role = Role::try_from(row(true, None)).unwrap();
        assert!(role.is_system());
    }

    #[test]
    fn inconsistent_scope_is_rejected() {
        assert!(Role::try_from(row(true, Some(Uuid::new_v4()))).is_err());
        assert!(Role::try_from(row(false, None)).is_err());
    }
}
