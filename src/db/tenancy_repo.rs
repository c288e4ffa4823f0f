// src/db/tenancy_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        rbac::PermissionTable,
        tenancy::{AssignedLocation, Company, Location, LocationType, UserLocation},
    },
};

#[async_trait]
pub trait TenancyRepository: Send + Sync {
    async fn find_company(&self, id: Uuid) -> Result<Option<Company>, AppError>;

    /// Retorna `false` se a empresa não existe.
    async fn set_company_active(&self, id: Uuid, is_active: bool) -> Result<bool, AppError>;

    async fn find_location(&self, id: Uuid) -> Result<Option<Location>, AppError>;

    async fn list_locations(&self, company_id: Uuid) -> Result<Vec<Location>, AppError>;

    /// Vínculos ativos do usuário, já com o local carregado.
    async fn active_assignments(&self, user_id: Uuid) -> Result<Vec<AssignedLocation>, AppError>;

    /// Cria (ou reativa) o vínculo usuário-local. O par é único.
    async fn assign_location(
        &self,
        user_id: Uuid,
        location_id: Uuid,
        is_primary: bool,
        permissions: Option<PermissionTable>,
    ) -> Result<UserLocation, AppError>;

    /// Retorna `false` se o vínculo não existe.
    async fn set_assignment_active(
        &self,
        user_id: Uuid,
        location_id: Uuid,
        is_active: bool,
    ) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgTenancyRepository {
    pool: PgPool,
}

impl PgTenancyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Resultado do JOIN user_locations x locations
#[derive(Debug, FromRow)]
struct AssignmentRow {
    assignment_id: Uuid,
    user_id: Uuid,
    is_primary: bool,
    assignment_active: bool,
    permissions: Option<Json<PermissionTable>>,
    assigned_at: DateTime<Utc>,
    location_id: Uuid,
    company_id: Uuid,
    name: String,
    location_type: LocationType,
    address: Option<String>,
    location_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AssignmentRow> for AssignedLocation {
    fn from(row: AssignmentRow) -> Self {
        let assignment = UserLocation {
            id: row.assignment_id,
            user_id: row.user_id,
            location_id: row.location_id,
            is_primary: row.is_primary,
            is_active: row.assignment_active,
            permissions: row.permissions,
            created_at: row.assigned_at,
        };
        let location = Location {
            id: row.location_id,
            company_id: row.company_id,
            name: row.name,
            location_type: row.location_type,
            address: row.address,
            is_active: row.location_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        AssignedLocation::new(assignment, location)
    }
}

#[async_trait]
impl TenancyRepository for PgTenancyRepository {
    async fn find_company(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>(
            "SELECT id, name, is_active, settings, created_at, updated_at FROM companies WHERE id = $1",
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    async fn set_company_active(&self, id: Uuid, is_active: bool) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE companies SET is_active = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_location(&self, id: Uuid) -> Result<Option<Location>, AppError> {
        let location = sqlx::query_as::<_, Location>(
            r#"
            SELECT id, company_id, name, location_type, address, is_active, created_at, updated_at
            FROM locations
            WHERE id = $1
            "#,
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(location)
    }

    async fn list_locations(&self, company_id: Uuid) -> Result<Vec<Location>, AppError> {
        let locations = sqlx::query_as::<_, Location>(
            r#"
            SELECT id, company_id, name, location_type, address, is_active, created_at, updated_at
            FROM locations
            WHERE company_id = $1
            ORDER BY name
            "#,
        )
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(locations)
    }

    async fn active_assignments(&self, user_id: Uuid) -> Result<Vec<AssignedLocation>, AppError> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT
                ul.id AS assignment_id,
                ul.user_id,
                ul.is_primary,
                ul.is_active AS assignment_active,
                ul.permissions,
                ul.created_at AS assigned_at,
                l.id AS location_id,
                l.company_id,
                l.name,
                l.location_type,
                l.address,
                l.is_active AS location_active,
                l.created_at,
                l.updated_at
            FROM user_locations ul
            JOIN locations l ON l.id = ul.location_id
            WHERE ul.user_id = $1 AND ul.is_active = true
            ORDER BY ul.is_primary DESC, l.name
            "#,
        )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(AssignedLocation::from).collect())
    }

    async fn assign_location(
        &self,
        user_id: Uuid,
        location_id: Uuid,
        is_primary: bool,
        permissions: Option<PermissionTable>,
    ) -> Result<UserLocation, AppError> {
        let assignment = sqlx::query_as::<_, UserLocation>(
            r#"
            INSERT INTO user_locations (user_id, location_id, is_primary, permissions)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, location_id)
            DO UPDATE SET
                is_primary = EXCLUDED.is_primary,
                permissions = EXCLUDED.permissions,
                is_active = true
            RETURNING id, user_id, location_id, is_primary, is_active, permissions, created_at
            "#,
        )
            .bind(user_id)
            .bind(location_id)
            .bind(is_primary)
            .bind(permissions.map(Json))
            .fetch_one(&self.pool)
            .await?;
        Ok(assignment)
    }

    async fn set_assignment_active(
        &self,
        user_id: Uuid,
        location_id: Uuid,
        is_active: bool,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE user_locations SET is_active = $3 WHERE user_id = $1 AND location_id = $2",
        )
            .bind(user_id)
            .bind(location_id)
            .bind(is_active)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
