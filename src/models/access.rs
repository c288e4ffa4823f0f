// src/models/access.rs

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::rbac::{Capability, RoleName};

/// O que a rota exige: uma capability da tabela do cargo, ou um cargo de uma
/// lista fechada (ex.: exclusão de empresa).
#[derive(Debug, Clone, Copy)]
pub enum Requirement<'a> {
    Capability(Capability),
    AnyRole(&'a [RoleName]),
}

/// Alvo da requisição, montado uma única vez pela camada HTTP.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestTarget {
    pub company_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
}

impl RequestTarget {
    pub fn company(company_id: Uuid) -> Self {
        Self { company_id: Some(company_id), location_id: None }
    }

    pub fn location(location_id: Uuid) -> Self {
        Self { company_id: None, location_id: Some(location_id) }
    }
}

/// Local alvo depois da consulta ao repositório.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationTarget {
    Known { id: Uuid, company_id: Uuid, is_active: bool },
    Unknown(Uuid),
}

/// Alvo com a posse do local já verificada (nunca confiamos no que veio na requisição).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub company_id: Option<Uuid>,
    pub location: Option<LocationTarget>,
}

impl ResolvedTarget {
    pub fn none() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Error)]
#[serde(rename_all = "snake_case")]
pub enum AccessDenied {
    #[error("permission denied")]
    PermissionDenied,

    #[error("cross-tenant access")]
    CrossTenantAccess,

    #[error("location access denied")]
    LocationAccessDenied,

    #[error("location inactive")]
    LocationInactive,

    #[error("role not allowed")]
    RoleNotAllowed,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessCheckResponse {
    #[schema(example = "sales.create")]
    pub capability: String,
    pub allowed: bool,
    pub reason: Option<AccessDenied>,
}
