// src/handlers/rbac.rs

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::{
        error::{ApiError, AppError},
        response::ApiResponse,
    },
    config::AppState,
    middleware::{
        auth::CurrentIdentity,
        i18n::Locale,
        rbac::{PermRolesCreate, PermRolesRead, RequireCapability},
    },
    models::{
        access::{AccessCheckResponse, AccessDenied, RequestTarget, Requirement},
        rbac::{
            Capability, CreateRolePayload, PermissionTable, Role, RoleName, RoleScope, RoleTemplate,
            RoleTemplateResponse,
        },
    },
};

fn validate_capability(raw: &str) -> Result<(), ValidationError> {
    raw.parse::<Capability>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("capability").with_message("Use o formato 'recurso.ação', ex.: sales.create".into()))
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AccessCheckQuery {
    /// Capability no formato `recurso.ação`
    #[validate(custom(function = "validate_capability"))]
    #[param(example = "sales.create")]
    pub capability: String,
}

/// Tabela do cargo novo. Nomes padrão (`admin`, `manager`, `cashier`) só
/// recebem a tabela do próprio template; `super_admin` só existe via migração.
fn requested_permissions(
    name: &RoleName,
    template: Option<RoleTemplate>,
    permissions: Option<PermissionTable>,
) -> Result<PermissionTable, AppError> {
    match RoleTemplate::for_name(name) {
        Some(RoleTemplate::SuperAdmin) => Err(AppError::InvalidRole),
        Some(built_in) => {
            if permissions.is_some() || template.is_some_and(|t| t != built_in) {
                return Err(AppError::InvalidRole);
            }
            Ok(built_in.permissions())
        }
        None => Ok(permissions
            .or_else(|| template.map(|t| t.permissions()))
            .unwrap_or_else(PermissionTable::deny_all)),
    }
}

// GET /api/roles
#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "RBAC",
    responses((status = 200, description = "Cargos de sistema e da empresa", body = [Role])),
    security(("api_jwt" = []))
)]
pub async fn list_roles(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<PermRolesRead>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<impl IntoResponse, ApiError> {
    let roles = app_state
        .role_repo
        .list_visible(identity.company_id())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok(roles)))
}

// POST /api/roles
#[utoipa::path(
    post,
    path = "/api/roles",
    tag = "RBAC",
    request_body = CreateRolePayload,
    params(("x-company-id" = Option<Uuid>, Header, description = "Empresa dona do cargo (super admin)")),
    responses(
        (status = 201, description = "Cargo criado", body = Role),
        (status = 400, description = "Nome reservado ou empresa inválida"),
        (status = 403, description = "Permissões acima das do criador"),
        (status = 409, description = "Nome já usado na empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_role(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<PermRolesCreate>,
    CurrentIdentity(identity): CurrentIdentity,
    target: Result<RequestTarget, AppError>,
    payload: Result<Json<CreateRolePayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api_error = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let target = target.map_err(to_api_error)?;
    let Json(payload) = payload.map_err(|e| to_api_error(e.into()))?;
    payload.validate().map_err(|e| to_api_error(e.into()))?;

    let name = RoleName::from(payload.name.trim());
    let permissions = requested_permissions(&name, payload.template, payload.permissions).map_err(to_api_error)?;

    // Ninguém concede o que não tem
    if !permissions.is_subset_of(&identity.role.permissions) {
        tracing::warn!(user_id = %identity.user_id(), role = %name, "Cargo com permissões acima das do criador");
        return Err(to_api_error(AccessDenied::PermissionDenied.into()));
    }

    let role = Role {
        id: Uuid::new_v4(),
        name,
        description: payload.description,
        permissions,
        scope: RoleScope::Company {
            company_id: target.company_id.unwrap_or(identity.company_id()),
        },
    };

    let created = app_state.role_repo.create_role(&role).await.map_err(to_api_error)?;
    tracing::info!(role_id = %created.id, by = %identity.user_id(), "Cargo criado");

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

// GET /api/roles/templates (Para o frontend montar a tela de criação de cargos)
#[utoipa::path(
    get,
    path = "/api/roles/templates",
    tag = "RBAC",
    responses((status = 200, description = "Templates de cargos", body = [RoleTemplateResponse])),
    security(("api_jwt" = []))
)]
pub async fn list_templates() -> Json<ApiResponse<Vec<RoleTemplateResponse>>> {
    let templates = RoleTemplate::ALL.into_iter().map(RoleTemplateResponse::from).collect();
    Json(ApiResponse::ok(templates))
}

// GET /api/access/check?capability=sales.create
#[utoipa::path(
    get,
    path = "/api/access/check",
    tag = "RBAC",
    params(
        AccessCheckQuery,
        ("x-company-id" = Option<Uuid>, Header, description = "Empresa alvo"),
        ("x-location-id" = Option<Uuid>, Header, description = "Local alvo")
    ),
    responses((status = 200, description = "Resultado da decisão, sem efeito colateral", body = AccessCheckResponse)),
    security(("api_jwt" = []))
)]
pub async fn check_access(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentIdentity(identity): CurrentIdentity,
    target: Result<RequestTarget, AppError>,
    query: Result<Query<AccessCheckQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api_error = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let target = target.map_err(to_api_error)?;
    let Query(query) = query.map_err(|e| to_api_error(e.into()))?;
    query.validate().map_err(|e| to_api_error(e.into()))?;
    let capability: Capability = query
        .capability
        .parse()
        .map_err(|e| to_api_error(anyhow::Error::from(e).into()))?;

    let decision = app_state
        .access_service
        .evaluate(&identity, Requirement::Capability(capability), target)
        .await
        .map_err(to_api_error)?;

    Ok(Json(ApiResponse::ok(AccessCheckResponse {
        capability: capability.to_string(),
        allowed: decision.is_ok(),
        reason: decision.err(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rbac::{ActionSet, Resource};

    #[test]
    fn built_in_names_keep_their_template_table() {
        let admin = RoleName::Admin;
        assert_eq!(
            requested_permissions(&admin, None, None).unwrap(),
            RoleTemplate::Admin.permissions()
        );
        assert_eq!(
            requested_permissions(&admin, Some(RoleTemplate::Admin), None).unwrap(),
            RoleTemplate::Admin.permissions()
        );

        let widened = PermissionTable::allow_all();
        assert!(matches!(
            requested_permissions(&admin, None, Some(widened)),
            Err(AppError::InvalidRole)
        ));
        assert!(matches!(
            requested_permissions(&RoleName::Cashier, Some(RoleTemplate::Manager), None),
            Err(AppError::InvalidRole)
        ));
        assert!(matches!(
            requested_permissions(&RoleName::SuperAdmin, None, None),
            Err(AppError::InvalidRole)
        ));
    }

    #[test]
    fn custom_names_take_table_then_template_then_nothing() {
        let name = RoleName::from("estoquista");
        let table = PermissionTable::deny_all().with(Resource::Products, ActionSet::new(false, true, true, false));

        assert_eq!(
            requested_permissions(&name, Some(RoleTemplate::Cashier), Some(table.clone())).unwrap(),
            table
        );
        assert_eq!(
            requested_permissions(&name, Some(RoleTemplate::Cashier), None).unwrap(),
            RoleTemplate::Cashier.permissions()
        );
        assert_eq!(requested_permissions(&name, None, None).unwrap(), PermissionTable::deny_all());
    }
}
