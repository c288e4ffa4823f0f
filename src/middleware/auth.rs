// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{
    authorization::{Authorization, Bearer},
    HeaderMapExt,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::identity::Identity,
};

/// Valida o Bearer token e resolve o `Identity` da requisição.
pub async fn authenticate(app_state: &AppState, headers: &HeaderMap) -> Result<Identity, AppError> {
    let bearer = headers
        .typed_try_get::<Authorization<Bearer>>()
        .map_err(|_| AppError::InvalidToken)?
        .ok_or(AppError::MissingToken)?;

    let claims = app_state.token_service.verify_access_token(bearer.token())?;
    app_state.identity_resolver.resolve(&claims).await
}

// O middleware em si: coloca o `Identity` nos "extensions" da requisição
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = authenticate(&app_state, request.headers())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentIdentity)
            .ok_or(AppError::MissingToken)
    }
}
