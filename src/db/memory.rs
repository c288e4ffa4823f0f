// src/db/memory.rs

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{RoleRepository, TenancyRepository, UserRepository},
    models::{
        auth::{NewUser, User},
        rbac::{PermissionTable, Role, RoleScope, RoleTemplate},
        tenancy::{AssignedLocation, Company, Location, LocationType, UserLocation},
    },
};

#[derive(Debug, Default)]
struct Tables {
    companies: HashMap<Uuid, Company>,
    roles: HashMap<Uuid, Role>,
    users: HashMap<Uuid, User>,
    locations: HashMap<Uuid, Location>,
    user_locations: Vec<UserLocation>,
}

/// Armazenamento em memória com o mesmo contrato dos repositórios Postgres.
///
/// Usado no modo demonstração (sem `DATABASE_URL`) e nos testes. É criado
/// no `main` e passado adiante pelo `AppState`, como qualquer outro store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, AppError> {
        self.tables
            .read()
            .map_err(|_| AppError::InternalServerError(anyhow!("lock do store em memória envenenado")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, AppError> {
        self.tables
            .write()
            .map_err(|_| AppError::InternalServerError(anyhow!("lock do store em memória envenenado")))
    }

    // ---
    // Cadastro direto (seed e testes)
    // ---

    pub fn insert_company(&self, name: &str) -> Result<Company, AppError> {
        let now = Utc::now();
        let company = Company {
            id: Uuid::new_v4(),
            name: name.to_string(),
            is_active: true,
            settings: Json(serde_json::json!({})),
            created_at: now,
            updated_at: now,
        };
        self.write()?.companies.insert(company.id, company.clone());
        Ok(company)
    }

    pub fn insert_role(&self, role: Role) -> Result<Role, AppError> {
        self.write()?.roles.insert(role.id, role.clone());
        Ok(role)
    }

    pub fn insert_location(
        &self,
        company_id: Uuid,
        name: &str,
        location_type: LocationType,
    ) -> Result<Location, AppError> {
        let now = Utc::now();
        let location = Location {
            id: Uuid::new_v4(),
            company_id,
            name: name.to_string(),
            location_type,
            address: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.write()?.locations.insert(location.id, location.clone());
        Ok(location)
    }

    pub fn set_location_active(&self, id: Uuid, is_active: bool) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        match tables.locations.get_mut(&id) {
            Some(location) => {
                location.is_active = is_active;
                location.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn set_user_active(&self, id: Uuid, is_active: bool) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        match tables.users.get_mut(&id) {
            Some(user) => {
                user.is_active = is_active;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn update_user<F>(&self, user_id: Uuid, apply: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut User),
    {
        let mut tables = self.write()?;
        if let Some(user) = tables.users.get_mut(&user_id) {
            apply(user);
            user.updated_at = Utc::now();
        }
        Ok(())
    }
}

/// Dados criados pelo `seed_demo`, para log e testes.
#[derive(Debug, Clone)]
pub struct DemoSeed {
    pub company: Company,
    pub locations: Vec<Location>,
    pub roles: Vec<Role>,
    pub users: Vec<User>,
}

impl DemoSeed {
    /// Usuário demo do cargo criado a partir do template.
    pub fn user(&self, template: RoleTemplate) -> Option<&User> {
        let role = self.roles.iter().find(|r| r.name == template.name())?;
        self.users.iter().find(|u| u.role_id == role.id)
    }
}

impl InMemoryStore {
    /// Popula o modo demonstração: uma empresa, três locais, os quatro
    /// cargos padrão e um usuário por cargo (todos com a mesma senha).
    pub async fn seed_demo(&self, password_hash: &str) -> Result<DemoSeed, AppError> {
        let company = self.insert_company("Demo POS")?;
        let centro = self.insert_location(company.id, "Loja Centro", LocationType::Store)?;
        let quiosque = self.insert_location(company.id, "Quiosque Shopping", LocationType::Kiosk)?;
        let deposito = self.insert_location(company.id, "Depósito", LocationType::Warehouse)?;

        let mut roles = Vec::new();
        let mut users = Vec::new();
        for template in RoleTemplate::ALL {
            let role = template
                .instantiate(Some(company.id))
                .ok_or_else(|| anyhow!("template {:?} sem escopo", template))?;
            let role = self.insert_role(role)?;

            let user = self
                .create_user(NewUser {
                    email: format!("{}@demo.local", role.name.as_str().replace('_', "")),
                    password_hash: password_hash.to_string(),
                    first_name: "Demo".into(),
                    last_name: role.name.to_string(),
                    role_id: role.id,
                    company_id: company.id,
                })
                .await?;

            // Só os cargos sem acesso administrativo precisam de vínculo
            let assignments = match template {
                RoleTemplate::Manager => vec![(centro.id, true), (quiosque.id, false)],
                RoleTemplate::Cashier => vec![(centro.id, true)],
                RoleTemplate::SuperAdmin | RoleTemplate::Admin => Vec::new(),
            };
            for (location_id, is_primary) in assignments {
                self.assign_location(user.id, location_id, is_primary, None).await?;
            }

            roles.push(role);
            users.push(user);
        }

        Ok(DemoSeed {
            company,
            locations: vec![centro, quiosque, deposito],
            roles,
            users,
        })
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.password_reset_token.as_deref() == Some(token))
            .cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut tables = self.write()?;
        if tables.users.values().any(|u| u.email.eq_ignore_ascii_case(&new_user.email)) {
            return Err(AppError::EmailAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            is_active: true,
            email_verified: false,
            refresh_token: None,
            password_reset_token: None,
            password_reset_expires: None,
            last_login_at: None,
            role_id: new_user.role_id,
            company_id: new_user.company_id,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn set_refresh_token(&self, user_id: Uuid, token: Option<&str>) -> Result<(), AppError> {
        self.update_user(user_id, |user| user.refresh_token = token.map(str::to_string))
    }

    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<(), AppError> {
        self.update_user(user_id, |user| user.last_login_at = Some(at))
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<(), AppError> {
        self.update_user(user_id, |user| user.password_hash = password_hash.to_string())
    }

    async fn set_password_reset(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.update_user(user_id, |user| {
            user.password_reset_token = Some(token.to_string());
            user.password_reset_expires = Some(expires_at);
        })
    }

    async fn complete_password_reset(&self, user_id: Uuid, password_hash: &str) -> Result<(), AppError> {
        self.update_user(user_id, |user| {
            user.password_hash = password_hash.to_string();
            user.password_reset_token = None;
            user.password_reset_expires = None;
            user.refresh_token = None;
        })
    }
}

#[async_trait]
impl RoleRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Role>, AppError> {
        Ok(self.read()?.roles.get(&id).cloned())
    }

    async fn list_visible(&self, company_id: Uuid) -> Result<Vec<Role>, AppError> {
        let mut roles: Vec<Role> = self
            .read()?
            .roles
            .values()
            .filter(|r| r.usable_in(company_id))
            .cloned()
            .collect();
        roles.sort_by(|a, b| b.is_system().cmp(&a.is_system()).then_with(|| a.name.as_str().cmp(b.name.as_str())));
        Ok(roles)
    }

    async fn create_role(&self, role: &Role) -> Result<Role, AppError> {
        let mut tables = self.write()?;
        if let RoleScope::Company { company_id } = role.scope {
            if !tables.companies.contains_key(&company_id) {
                return Err(AppError::InvalidCompany);
            }
        }
        // Mesma regra do UNIQUE (company_id, name) do Postgres
        if tables.roles.values().any(|r| r.scope == role.scope && r.name == role.name) {
            return Err(AppError::RoleAlreadyExists);
        }
        tables.roles.insert(role.id, role.clone());
        Ok(role.clone())
    }
}

#[async_trait]
impl TenancyRepository for InMemoryStore {
    async fn find_company(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        Ok(self.read()?.companies.get(&id).cloned())
    }

    async fn set_company_active(&self, id: Uuid, is_active: bool) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        match tables.companies.get_mut(&id) {
            Some(company) => {
                company.is_active = is_active;
                company.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_location(&self, id: Uuid) -> Result<Option<Location>, AppError> {
        Ok(self.read()?.locations.get(&id).cloned())
    }

    async fn list_locations(&self, company_id: Uuid) -> Result<Vec<Location>, AppError> {
        let mut locations: Vec<Location> = self
            .read()?
            .locations
            .values()
            .filter(|l| l.company_id == company_id)
            .cloned()
            .collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }

    async fn active_assignments(&self, user_id: Uuid) -> Result<Vec<AssignedLocation>, AppError> {
        let tables = self.read()?;
        let mut assigned: Vec<AssignedLocation> = tables
            .user_locations
            .iter()
            .filter(|ul| ul.user_id == user_id && ul.is_active)
            .filter_map(|ul| {
                tables
                    .locations
                    .get(&ul.location_id)
                    .map(|location| AssignedLocation::new(ul.clone(), location.clone()))
            })
            .collect();
        assigned.sort_by(|a, b| {
            b.is_primary
                .cmp(&a.is_primary)
                .then_with(|| a.location.name.cmp(&b.location.name))
        });
        Ok(assigned)
    }

    async fn assign_location(
        &self,
        user_id: Uuid,
        location_id: Uuid,
        is_primary: bool,
        permissions: Option<PermissionTable>,
    ) -> Result<UserLocation, AppError> {
        let mut tables = self.write()?;
        if !tables.locations.contains_key(&location_id) {
            return Err(AppError::NotFound("location"));
        }

        // (user_id, location_id) é único: reaproveita o vínculo existente
        if let Some(existing) = tables
            .user_locations
            .iter_mut()
            .find(|ul| ul.user_id == user_id && ul.location_id == location_id)
        {
            existing.is_primary = is_primary;
            existing.permissions = permissions.map(Json);
            existing.is_active = true;
            return Ok(existing.clone());
        }

        let assignment = UserLocation {
            id: Uuid::new_v4(),
            user_id,
            location_id,
            is_primary,
            is_active: true,
            permissions: permissions.map(Json),
            created_at: Utc::now(),
        };
        tables.user_locations.push(assignment.clone());
        Ok(assignment)
    }

    async fn set_assignment_active(
        &self,
        user_id: Uuid,
        location_id: Uuid,
        is_active: bool,
    ) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        match tables
            .user_locations
            .iter_mut()
            .find(|ul| ul.user_id == user_id && ul.location_id == location_id)
        {
            Some(assignment) => {
                assignment.is_active = is_active;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
