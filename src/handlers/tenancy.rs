// src/handlers/tenancy.rs

use axum::{
    extract::{rejection::PathRejection, Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{
        error::{ApiError, AppError},
        response::ApiResponse,
    },
    config::AppState,
    middleware::{
        auth::CurrentIdentity,
        i18n::Locale,
        rbac::{CapabilityDef, PermCompaniesDelete, PermLocationsRead, RequireCapability},
    },
    models::{
        access::{RequestTarget, Requirement},
        rbac::RoleName,
        tenancy::Location,
    },
};

// Só o super admin desativa empresas
const COMPANY_DEACTIVATORS: &[RoleName] = &[RoleName::SuperAdmin];

// GET /api/locations
#[utoipa::path(
    get,
    path = "/api/locations",
    tag = "Tenancy",
    params(("x-company-id" = Option<Uuid>, Header, description = "Empresa alvo (super admin)")),
    responses((status = 200, description = "Admin: todos os locais da empresa; demais: locais vinculados", body = [Location])),
    security(("api_jwt" = []))
)]
pub async fn list_locations(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<PermLocationsRead>,
    CurrentIdentity(identity): CurrentIdentity,
    target: Result<RequestTarget, AppError>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api_error = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);
    let target = target.map_err(to_api_error)?;

    if !identity.role.is_administrative() {
        let assigned: Vec<Location> = identity.locations.into_iter().map(|a| a.location).collect();
        return Ok(Json(ApiResponse::ok(assigned)));
    }

    // O guardião já barrou empresa alheia para quem não é de sistema
    let company_id = target.company_id.unwrap_or(identity.company_id());
    let locations = app_state
        .tenancy_repo
        .list_locations(company_id)
        .await
        .map_err(to_api_error)?;

    Ok(Json(ApiResponse::ok(locations)))
}

// GET /api/locations/{id}
#[utoipa::path(
    get,
    path = "/api/locations/{id}",
    tag = "Tenancy",
    params(("id" = Uuid, Path, description = "ID do local")),
    responses(
        (status = 200, description = "Local", body = Location),
        (status = 403, description = "Local de outra empresa ou sem vínculo"),
        (status = 404, description = "Local não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_location(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentIdentity(identity): CurrentIdentity,
    location_id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api_error = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);
    let Path(location_id) = location_id.map_err(|e| to_api_error(e.into()))?;

    app_state
        .access_service
        .require_capability(&identity, PermLocationsRead::CAPABILITY, RequestTarget::location(location_id))
        .await
        .map_err(to_api_error)?;

    let location = app_state
        .tenancy_repo
        .find_location(location_id)
        .await
        .map_err(to_api_error)?
        .ok_or(AppError::NotFound("location"))
        .map_err(to_api_error)?;

    Ok(Json(ApiResponse::ok(location)))
}

// DELETE /api/companies/{id} (desativa; nada é apagado)
#[utoipa::path(
    delete,
    path = "/api/companies/{id}",
    tag = "Tenancy",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Empresa desativada"),
        (status = 403, description = "Cargo sem permissão"),
        (status = 404, description = "Empresa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_company(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentIdentity(identity): CurrentIdentity,
    company_id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api_error = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);
    let Path(company_id) = company_id.map_err(|e| to_api_error(e.into()))?;
    let target = RequestTarget::company(company_id);

    app_state
        .access_service
        .require(&identity, Requirement::AnyRole(COMPANY_DEACTIVATORS), target)
        .await
        .map_err(to_api_error)?;
    app_state
        .access_service
        .require_capability(&identity, PermCompaniesDelete::CAPABILITY, target)
        .await
        .map_err(to_api_error)?;

    let found = app_state
        .tenancy_repo
        .set_company_active(company_id, false)
        .await
        .map_err(to_api_error)?;
    if !found {
        return Err(to_api_error(AppError::NotFound("company")));
    }

    tracing::info!(%company_id, by = %identity.user_id(), "Empresa desativada");

    let message = app_state.i18n_store.translate(&locale.0, "company.deactivated");
    Ok(Json(ApiResponse::message(message)))
}
