// src/models/rbac.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// ---
// 1. Recursos e Ações
// ---

/// Recursos protegidos pelo modelo de permissões.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Products,
    Sales,
    Locations,
    Reports,
    Users,
    Companies,
    Roles,
    Backups,
    Invoices,
    Integrations,
}

impl Resource {
    pub const ALL: [Resource; 10] = [
        Resource::Products,
        Resource::Sales,
        Resource::Locations,
        Resource::Reports,
        Resource::Users,
        Resource::Companies,
        Resource::Roles,
        Resource::Backups,
        Resource::Invoices,
        Resource::Integrations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Products => "products",
            Resource::Sales => "sales",
            Resource::Locations => "locations",
            Resource::Reports => "reports",
            Resource::Users => "users",
            Resource::Companies => "companies",
            Resource::Roles => "roles",
            Resource::Backups => "backups",
            Resource::Invoices => "invoices",
            Resource::Integrations => "integrations",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = ParseCapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ParseCapabilityError(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ParseCapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| ParseCapabilityError(s.to_string()))
    }
}

// ---
// 2. Capability ("products.create")
// ---

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("capability inválida: '{0}'")]
pub struct ParseCapabilityError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capability {
    pub resource: Resource,
    pub action: Action,
}

impl Capability {
    pub const fn new(resource: Resource, action: Action) -> Self {
        Self { resource, action }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource, self.action)
    }
}

impl FromStr for Capability {
    type Err = ParseCapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (resource, action) = s
            .split_once('.')
            .ok_or_else(|| ParseCapabilityError(s.to_string()))?;
        let resource = resource.parse().map_err(|_| ParseCapabilityError(s.to_string()))?;
        let action = action.parse().map_err(|_| ParseCapabilityError(s.to_string()))?;
        Ok(Self { resource, action })
    }
}

impl Serialize for Capability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Capability {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---
// 3. Tabela de Permissões (formato fixo)
// ---

/// Conjunto de ações permitidas sobre um recurso. Campo ausente = `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default, deny_unknown_fields)]
pub struct ActionSet {
    pub create: bool,
    pub read: bool,
    pub update: bool,
    pub delete: bool,
}

impl ActionSet {
    pub const NONE: ActionSet = ActionSet { create: false, read: false, update: false, delete: false };
    pub const ALL: ActionSet = ActionSet { create: true, read: true, update: true, delete: true };

    pub const fn new(create: bool, read: bool, update: bool, delete: bool) -> Self {
        Self { create, read, update, delete }
    }

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Create => self.create,
            Action::Read => self.read,
            Action::Update => self.update,
            Action::Delete => self.delete,
        }
    }
}

/// Tabela de permissões de um cargo: um `ActionSet` por recurso conhecido.
///
/// Recursos ausentes no JSON valem "tudo negado"; chaves desconhecidas são
/// rejeitadas na desserialização.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default, deny_unknown_fields)]
pub struct PermissionTable {
    pub products: ActionSet,
    pub sales: ActionSet,
    pub locations: ActionSet,
    pub reports: ActionSet,
    pub users: ActionSet,
    pub companies: ActionSet,
    pub roles: ActionSet,
    pub backups: ActionSet,
    pub invoices: ActionSet,
    pub integrations: ActionSet,
}

impl PermissionTable {
    /// Tabela sem nenhuma permissão.
    pub fn deny_all() -> Self {
        Self::default()
    }

    pub fn allow_all() -> Self {
        let mut table = Self::default();
        for resource in Resource::ALL {
            table.set(resource, ActionSet::ALL);
        }
        table
    }

    pub fn get(&self, resource: Resource) -> ActionSet {
        match resource {
            Resource::Products => self.products,
            Resource::Sales => self.sales,
            Resource::Locations => self.locations,
            Resource::Reports => self.reports,
            Resource::Users => self.users,
            Resource::Companies => self.companies,
            Resource::Roles => self.roles,
            Resource::Backups => self.backups,
            Resource::Invoices => self.invoices,
            Resource::Integrations => self.integrations,
        }
    }

    pub fn set(&mut self, resource: Resource, actions: ActionSet) {
        let slot = match resource {
            Resource::Products => &mut self.products,
            Resource::Sales => &mut self.sales,
            Resource::Locations => &mut self.locations,
            Resource::Reports => &mut self.reports,
            Resource::Users => &mut self.users,
            Resource::Companies => &mut self.companies,
            Resource::Roles => &mut self.roles,
            Resource::Backups => &mut self.backups,
            Resource::Invoices => &mut self.invoices,
            Resource::Integrations => &mut self.integrations,
        };
        *slot = actions;
    }

    pub fn with(mut self, resource: Resource, actions: ActionSet) -> Self {
        self.set(resource, actions);
        self
    }

    pub fn allows(&self, capability: Capability) -> bool {
        self.get(capability.resource).allows(capability.action)
    }

    /// Nada aqui vai além do que `other` concede.
    pub fn is_subset_of(&self, other: &PermissionTable) -> bool {
        self.granted().into_iter().all(|cap| other.allows(cap))
    }

    /// Lista de capabilities concedidas, na ordem de `Resource::ALL`.
    pub fn granted(&self) -> Vec<Capability> {
        Resource::ALL
            .into_iter()
            .flat_map(|resource| Action::ALL.into_iter().map(move |action| Capability::new(resource, action)))
            .filter(|cap| self.allows(*cap))
            .collect()
    }
}

// ---
// 4. Cargos
// ---

/// Nome tipado do cargo. Os quatro níveis padrão têm variantes próprias;
/// cargos criados por uma empresa caem em `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoleName {
    SuperAdmin,
    Admin,
    Manager,
    Cashier,
    Custom(String),
}

impl RoleName {
    pub fn as_str(&self) -> &str {
        match self {
            RoleName::SuperAdmin => "super_admin",
            RoleName::Admin => "admin",
            RoleName::Manager => "manager",
            RoleName::Cashier => "cashier",
            RoleName::Custom(name) => name,
        }
    }
}

impl From<&str> for RoleName {
    fn from(value: &str) -> Self {
        match value {
            "super_admin" => RoleName::SuperAdmin,
            "admin" => RoleName::Admin,
            "manager" => RoleName::Manager,
            "cashier" => RoleName::Cashier,
            other => RoleName::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RoleName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RoleName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(RoleName::from(raw.as_str()))
    }
}

/// Escopo do cargo: do sistema (vale em todas as empresas) ou de uma empresa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoleScope {
    System,
    Company { company_id: Uuid },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: Uuid,
    #[schema(value_type = String, example = "manager")]
    pub name: RoleName,
    pub description: Option<String>,
    pub permissions: PermissionTable,
    pub scope: RoleScope,
}

impl Role {
    pub fn is_system(&self) -> bool {
        matches!(self.scope, RoleScope::System)
    }

    /// Cargos administrativos não precisam de vínculo explícito com locais.
    pub fn is_administrative(&self) -> bool {
        self.is_system() || self.name == RoleName::Admin
    }

    /// Um cargo de sistema pode ser usado em qualquer empresa; os demais só
    /// na empresa dona.
    pub fn usable_in(&self, company_id: Uuid) -> bool {
        match self.scope {
            RoleScope::System => true,
            RoleScope::Company { company_id: owner } => owner == company_id,
        }
    }
}

// ---
// 5. Templates de cargos
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoleTemplate {
    SuperAdmin,
    Admin,
    Manager,
    Cashier,
}

impl RoleTemplate {
    pub const ALL: [RoleTemplate; 4] = [
        RoleTemplate::SuperAdmin,
        RoleTemplate::Admin,
        RoleTemplate::Manager,
        RoleTemplate::Cashier,
    ];

    /// Template dono do nome, se for um dos nomes padrão.
    pub fn for_name(name: &RoleName) -> Option<RoleTemplate> {
        RoleTemplate::ALL.into_iter().find(|t| t.name() == *name)
    }

    pub fn name(&self) -> RoleName {
        match self {
            RoleTemplate::SuperAdmin => RoleName::SuperAdmin,
            RoleTemplate::Admin => RoleName::Admin,
            RoleTemplate::Manager => RoleName::Manager,
            RoleTemplate::Cashier => RoleName::Cashier,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RoleTemplate::SuperAdmin => "Acesso total ao sistema, em todas as empresas",
            RoleTemplate::Admin => "Acesso total dentro da empresa",
            RoleTemplate::Manager => "Gestão de produtos, locais e vendas",
            RoleTemplate::Cashier => "Operação de caixa nos locais atribuídos",
        }
    }

    pub fn permissions(&self) -> PermissionTable {
        match self {
            RoleTemplate::SuperAdmin => PermissionTable::allow_all(),
            RoleTemplate::Admin => PermissionTable::allow_all()
                .with(Resource::Companies, ActionSet::new(true, true, true, false))
                .with(Resource::Roles, ActionSet::new(true, true, true, false)),
            RoleTemplate::Manager => PermissionTable::deny_all()
                .with(Resource::Products, ActionSet::new(false, true, true, false))
                .with(Resource::Locations, ActionSet::new(false, true, true, false))
                .with(Resource::Sales, ActionSet::new(true, true, true, false))
                .with(Resource::Reports, ActionSet::new(false, true, false, false)),
            RoleTemplate::Cashier => PermissionTable::deny_all()
                .with(Resource::Products, ActionSet::new(false, true, false, false))
                .with(Resource::Locations, ActionSet::new(false, true, false, false))
                .with(Resource::Sales, ActionSet::new(true, true, false, false)),
        }
    }

    /// `super_admin` é sempre de sistema; os outros precisam de uma empresa.
    pub fn scope(&self, company_id: Option<Uuid>) -> Option<RoleScope> {
        match (self, company_id) {
            (RoleTemplate::SuperAdmin, _) => Some(RoleScope::System),
            (_, Some(company_id)) => Some(RoleScope::Company { company_id }),
            (_, None) => None,
        }
    }

    /// Materializa o template como um cargo novo.
    pub fn instantiate(&self, company_id: Option<Uuid>) -> Option<Role> {
        let scope = self.scope(company_id)?;
        Some(Role {
            id: Uuid::new_v4(),
            name: self.name(),
            description: Some(self.description().to_string()),
            permissions: self.permissions(),
            scope,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleTemplateResponse {
    pub template: RoleTemplate,
    pub description: String,
    pub is_system_role: bool,
    pub permissions: PermissionTable,
}

impl From<RoleTemplate> for RoleTemplateResponse {
    fn from(template: RoleTemplate) -> Self {
        Self {
            template,
            description: template.description().to_string(),
            is_system_role: template == RoleTemplate::SuperAdmin,
            permissions: template.permissions(),
        }
    }
}

/// Cargo novo da empresa: a partir de um template ou com tabela própria.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRolePayload {
    #[validate(length(min = 1, max = 100, message = "O nome do cargo é obrigatório."))]
    #[schema(example = "estoquista")]
    pub name: String,
    pub description: Option<String>,
    /// Usado quando `permissions` não é informado.
    pub template: Option<RoleTemplate>,
    pub permissions: Option<PermissionTable>,
}
