// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::{
        access::RequestTarget,
        identity::Identity,
        rbac::{Action, Capability, Resource},
    },
};

/// Capability exigida por uma rota, resolvida em tempo de compilação.
pub trait CapabilityDef: Send + Sync + 'static {
    const CAPABILITY: Capability;
}

/// Guardião: exige a capability `T` sobre o alvo dos cabeçalhos
/// `X-Company-Id` / `X-Location-Id`. Roda depois do `auth_guard`.
pub struct RequireCapability<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireCapability<T>
where
    T: CapabilityDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_parts(parts);
        let to_api_error = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

        let identity = parts
            .extensions
            .get::<Identity>()
            .ok_or(AppError::MissingToken)
            .map_err(to_api_error)?;

        let target = RequestTarget::from_headers(&parts.headers).map_err(to_api_error)?;

        app_state
            .access_service
            .require_capability(identity, T::CAPABILITY, target)
            .await
            .map_err(to_api_error)?;

        Ok(RequireCapability(PhantomData))
    }
}

// ---
// Capabilities usadas pelas rotas
// ---

pub struct PermRolesRead;
impl CapabilityDef for PermRolesRead {
    const CAPABILITY: Capability = Capability::new(Resource::Roles, Action::Read);
}

pub struct PermRolesCreate;
impl CapabilityDef for PermRolesCreate {
    const CAPABILITY: Capability = Capability::new(Resource::Roles, Action::Create);
}

pub struct PermLocationsRead;
impl CapabilityDef for PermLocationsRead {
    const CAPABILITY: Capability = Capability::new(Resource::Locations, Action::Read);
}

pub struct PermCompaniesDelete;
impl CapabilityDef for PermCompaniesDelete {
    const CAPABILITY: Capability = Capability::new(Resource::Companies, Action::Delete);
}
