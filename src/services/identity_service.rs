// src/services/identity_service.rs

use std::sync::Arc;

use anyhow::anyhow;

use crate::{
    common::error::AppError,
    db::{RoleRepository, TenancyRepository, UserRepository},
    models::{auth::AccessClaims, identity::Identity},
};

/// Monta o `Identity` do usuário a partir de um access token já validado.
///
/// Nada é cacheado no token além do ID: usuário, cargo, empresa e vínculos
/// são relidos a cada requisição para que uma desativação valha na hora.
#[derive(Clone)]
pub struct IdentityResolver {
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
    tenancy: Arc<dyn TenancyRepository>,
}

impl IdentityResolver {
    pub fn new(
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleRepository>,
        tenancy: Arc<dyn TenancyRepository>,
    ) -> Self {
        Self { users, roles, tenancy }
    }

    pub async fn resolve(&self, claims: &AccessClaims) -> Result<Identity, AppError> {
        // 1. Usuário (precisa existir e estar ativo)
        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if !user.is_active {
            return Err(AppError::UserInactive);
        }

        // 2. Cargo e empresa vêm do cadastro atual, não do token
        let role = self
            .roles
            .find_by_id(user.role_id)
            .await?
            .ok_or_else(|| anyhow!("usuário {} aponta para cargo inexistente {}", user.id, user.role_id))?;

        if !role.usable_in(user.company_id) {
            return Err(anyhow!("cargo {} não pertence à empresa {}", role.id, user.company_id).into());
        }

        let company = self
            .tenancy
            .find_company(user.company_id)
            .await?
            .ok_or_else(|| anyhow!("usuário {} aponta para empresa inexistente {}", user.id, user.company_id))?;

        if !company.is_active && !role.is_system() {
            return Err(AppError::CompanyInactive);
        }

        // 3. Vínculos ativos com locais
        let locations = self.tenancy.active_assignments(user.id).await?;

        Ok(Identity { user, role, company, locations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::InMemoryStore,
        models::{
            auth::{NewUser, TokenKind},
            rbac::RoleTemplate,
            tenancy::LocationType,
        },
    };
    use chrono::Utc;
    use uuid::Uuid;

    struct Fixture {
        store: Arc<InMemoryStore>,
        resolver: IdentityResolver,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let resolver = IdentityResolver::new(store.clone(), store.clone(), store.clone());
        Fixture { store, resolver }
    }

    fn claims_for(user_id: Uuid) -> AccessClaims {
        AccessClaims {
            sub: user_id,
            email: "x@y.com".into(),
            role_id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 60,
            typ: TokenKind::Access,
        }
    }

    async fn user_with(fx: &Fixture, template: RoleTemplate) -> (Uuid, Uuid) {
        let company = fx.store.insert_company("Loja").unwrap();
        let role = fx.store.insert_role(template.instantiate(Some(company.id)).unwrap()).unwrap();
        let user = fx
            .store
            .create_user(NewUser {
                email: format!("{}@loja.com", Uuid::new_v4()),
                password_hash: "hash".into(),
                first_name: "Ana".into(),
                last_name: "Souza".into(),
                role_id: role.id,
                company_id: company.id,
            })
            .await
            .unwrap();
        (user.id, company.id)
    }

    #[tokio::test]
    async fn loads_role_company_and_active_locations() {
        let fx = fixture();
        let (user_id, company_id) = user_with(&fx, RoleTemplate::Cashier).await;
        let l1 = fx.store.insert_location(company_id, "L1", LocationType::Store).unwrap();
        let l2 = fx.store.insert_location(company_id, "L2", LocationType::Kiosk).unwrap();
        fx.store.assign_location(user_id, l1.id, true, None).await.unwrap();
        fx.store.assign_location(user_id, l2.id, false, None).await.unwrap();
        fx.store.set_assignment_active(user_id, l2.id, false).await.unwrap();

        let identity = fx.resolver.resolve(&claims_for(user_id)).await.unwrap();
        assert_eq!(identity.company_id(), company_id);
        assert_eq!(identity.role.name.as_str(), "cashier");
        assert_eq!(identity.locations.len(), 1);
        assert_eq!(identity.primary_location().unwrap().location.id, l1.id);
    }

    #[tokio::test]
    async fn missing_user_is_rejected() {
        let fx = fixture();
        let err = fx.resolver.resolve(&claims_for(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, AppError::UserNotFound));
    }

    #[tokio::test]
    async fn deactivation_takes_effect_on_next_request() {
        let fx = fixture();
        let (user_id, _) = user_with(&fx, RoleTemplate::Manager).await;
        let claims = claims_for(user_id);

        assert!(fx.resolver.resolve(&claims).await.is_ok());
        fx.store.set_user_active(user_id, false).unwrap();

        let err = fx.resolver.resolve(&claims).await.unwrap_err();
        assert!(matches!(err, AppError::UserInactive));
    }

    #[tokio::test]
    async fn inactive_company_blocks_company_roles_only() {
        let fx = fixture();
        let (cashier, company_id) = user_with(&fx, RoleTemplate::Cashier).await;
        let (root, root_company) = user_with(&fx, RoleTemplate::SuperAdmin).await;

        fx.store.set_company_active(company_id, false).await.unwrap();
        fx.store.set_company_active(root_company, false).await.unwrap();

        let err = fx.resolver.resolve(&claims_for(cashier)).await.unwrap_err();
        assert!(matches!(err, AppError::CompanyInactive));
        assert!(fx.resolver.resolve(&claims_for(root)).await.is_ok());
    }
}
