// src/services/access_service.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::TenancyRepository,
    models::{
        access::{AccessDenied, LocationTarget, RequestTarget, Requirement, ResolvedTarget},
        identity::Identity,
        rbac::Capability,
    },
};

/// Decisão de acesso. Função pura: não faz IO nem guarda estado.
///
/// Ordem: permissão do cargo, isolamento de empresa, escopo de local e, para
/// requisitos por lista de cargos, pertencimento à lista. Cargos de sistema
/// pulam empresa e local depois que a permissão passa.
pub fn authorize(
    identity: &Identity,
    requirement: Requirement<'_>,
    target: &ResolvedTarget,
) -> Result<(), AccessDenied> {
    // 1. Permissão (default-deny)
    if let Requirement::Capability(capability) = requirement {
        if !identity.role.permissions.allows(capability) {
            return Err(AccessDenied::PermissionDenied);
        }
    }

    if !identity.role.is_system() {
        // 2. Empresa: explícita no alvo, ou a dona do local alvo
        let location_company = match target.location {
            Some(LocationTarget::Known { company_id, .. }) => Some(company_id),
            _ => None,
        };
        for company_id in target.company_id.into_iter().chain(location_company) {
            if company_id != identity.company_id() {
                return Err(AccessDenied::CrossTenantAccess);
            }
        }

        // 3. Local
        if let Some(location) = target.location {
            check_location(identity, requirement, location)?;
        }
    }

    // 4. Lista fechada de cargos
    if let Requirement::AnyRole(allowed) = requirement {
        if !allowed.contains(&identity.role.name) {
            return Err(AccessDenied::RoleNotAllowed);
        }
    }

    Ok(())
}

fn check_location(
    identity: &Identity,
    requirement: Requirement<'_>,
    location: LocationTarget,
) -> Result<(), AccessDenied> {
    let (location_id, is_active) = match location {
        LocationTarget::Known { id, is_active, .. } => (id, is_active),
        // Local inexistente: mesma resposta de "sem acesso", sem revelar nada
        LocationTarget::Unknown(_) => return Err(AccessDenied::LocationAccessDenied),
    };

    // Admin acessa qualquer local da própria empresa (posse já conferida acima)
    if identity.role.is_administrative() {
        return Ok(());
    }

    let assignment = identity
        .assignment(location_id)
        .ok_or(AccessDenied::LocationAccessDenied)?;

    if !is_active {
        return Err(AccessDenied::LocationInactive);
    }

    // Override do vínculo só restringe
    if let (Requirement::Capability(capability), Some(overrides)) = (requirement, &assignment.permissions) {
        if !overrides.allows(capability) {
            return Err(AccessDenied::PermissionDenied);
        }
    }

    Ok(())
}

/// Resolve o alvo da requisição contra o repositório e aplica `authorize`.
#[derive(Clone)]
pub struct AccessService {
    tenancy: Arc<dyn TenancyRepository>,
}

impl AccessService {
    pub fn new(tenancy: Arc<dyn TenancyRepository>) -> Self {
        Self { tenancy }
    }

    /// A empresa dona do local vem sempre do cadastro, nunca da requisição.
    pub async fn resolve_target(&self, target: RequestTarget) -> Result<ResolvedTarget, AppError> {
        let location = match target.location_id {
            Some(id) => Some(match self.tenancy.find_location(id).await? {
                Some(location) => LocationTarget::Known {
                    id: location.id,
                    company_id: location.company_id,
                    is_active: location.is_active,
                },
                None => LocationTarget::Unknown(id),
            }),
            None => None,
        };

        Ok(ResolvedTarget {
            company_id: target.company_id,
            location,
        })
    }

    pub async fn evaluate(
        &self,
        identity: &Identity,
        requirement: Requirement<'_>,
        target: RequestTarget,
    ) -> Result<Result<(), AccessDenied>, AppError> {
        let resolved = self.resolve_target(target).await?;
        Ok(authorize(identity, requirement, &resolved))
    }

    /// Como `evaluate`, mas a negação vira `AppError::Forbidden` (403).
    pub async fn require(
        &self,
        identity: &Identity,
        requirement: Requirement<'_>,
        target: RequestTarget,
    ) -> Result<(), AppError> {
        self.evaluate(identity, requirement, target).await?.map_err(|reason| {
            tracing::warn!(
                user_id = %identity.user_id(),
                role = %identity.role.name,
                ?requirement,
                ?target,
                ?reason,
                "acesso negado"
            );
            AppError::Forbidden(reason)
        })
    }

    pub async fn require_capability(
        &self,
        identity: &Identity,
        capability: Capability,
        target: RequestTarget,
    ) -> Result<(), AppError> {
        self.require(identity, Requirement::Capability(capability), target).await
    }
}
