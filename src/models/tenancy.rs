// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::rbac::PermissionTable;

// ---
// 1. Company (O "Tenant")
// ---
// Fronteira de isolamento: usuários, locais e cargos não-sistema pertencem a uma empresa.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,

    #[schema(example = "Padaria Central")]
    pub name: String,

    pub is_active: bool,

    #[schema(value_type = Object)]
    pub settings: sqlx::types::Json<serde_json::Value>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 2. Location (O "Local")
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "location_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Store,
    Kiosk,
    Warehouse,
    Office,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Uuid,
    pub company_id: Uuid,

    #[schema(example = "Loja Centro")]
    pub name: String,

    pub location_type: LocationType,
    pub address: Option<String>,
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 3. UserLocation (A "Ponte" Usuário-Local)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserLocation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub location_id: Uuid,
    pub is_primary: bool,
    pub is_active: bool,

    // Override opcional por vínculo (só restringe, nunca amplia)
    #[schema(value_type = Option<PermissionTable>)]
    pub permissions: Option<sqlx::types::Json<PermissionTable>>,

    pub created_at: DateTime<Utc>,
}

/// Vínculo ativo já resolvido com o seu local.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignedLocation {
    pub location: Location,
    pub is_primary: bool,
    pub permissions: Option<PermissionTable>,
}

impl AssignedLocation {
    pub fn new(assignment: UserLocation, location: Location) -> Self {
        Self {
            location,
            is_primary: assignment.is_primary,
            permissions: assignment.permissions.map(|json| json.0),
        }
    }
}
