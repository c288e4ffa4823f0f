// src/models/identity.rs

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{
    auth::User,
    rbac::Role,
    tenancy::{AssignedLocation, Company},
};

/// Contexto completo do usuário autenticado, carregado a cada requisição.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user: User,
    pub role: Role,
    pub company: Company,
    pub locations: Vec<AssignedLocation>,
}

impl Identity {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    pub fn company_id(&self) -> Uuid {
        self.company.id
    }

    /// Vínculo ativo com o local, se houver.
    pub fn assignment(&self, location_id: Uuid) -> Option<&AssignedLocation> {
        self.locations.iter().find(|a| a.location.id == location_id)
    }

    pub fn primary_location(&self) -> Option<&AssignedLocation> {
        self.locations.iter().find(|a| a.is_primary)
    }
}
