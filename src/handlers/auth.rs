// src/handlers/auth.rs

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        response::ApiResponse,
    },
    config::AppState,
    middleware::{auth::CurrentIdentity, i18n::Locale},
    models::{
        auth::{
            AccessTokenResponse, AuthResponse, ChangePasswordPayload, ForgotPasswordPayload,
            LoginUserPayload, RefreshTokenPayload, RegisterUserPayload, ResetPasswordPayload,
        },
        identity::Identity,
    },
    services::auth::Registration,
};

// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Usuário criado e autenticado", body = AuthResponse),
        (status = 400, description = "E-mail em uso, cargo ou empresa inválidos")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    locale: Locale,
    payload: Result<Json<RegisterUserPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api_error = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let Json(payload) = payload.map_err(|e| to_api_error(e.into()))?;
    payload.validate().map_err(|e| to_api_error(e.into()))?;

    let response = app_state
        .auth_service
        .register(Registration {
            email: payload.email,
            password: payload.password,
            first_name: payload.first_name,
            last_name: payload.last_name,
            role_id: payload.role_id,
            company_id: payload.company_id,
        })
        .await
        .map_err(to_api_error)?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(response))))
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Login realizado", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    payload: Result<Json<LoginUserPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api_error = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let Json(payload) = payload.map_err(|e| to_api_error(e.into()))?;
    payload.validate().map_err(|e| to_api_error(e.into()))?;

    let response = app_state
        .auth_service
        .login(&payload.email, &payload.password)
        .await
        .map_err(to_api_error)?;

    Ok(Json(ApiResponse::ok(response)))
}

// POST /api/auth/refresh
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "Auth",
    request_body = RefreshTokenPayload,
    responses(
        (status = 200, description = "Novo access token", body = AccessTokenResponse),
        (status = 401, description = "Refresh token inválido")
    )
)]
pub async fn refresh(
    State(app_state): State<AppState>,
    locale: Locale,
    payload: Result<Json<RefreshTokenPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api_error = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let Json(payload) = payload.map_err(|e| to_api_error(e.into()))?;
    payload.validate().map_err(|e| to_api_error(e.into()))?;

    let response = app_state
        .auth_service
        .refresh(&payload.refresh_token)
        .await
        .map_err(to_api_error)?;

    Ok(Json(ApiResponse::ok(response)))
}

// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Sessão encerrada")),
    security(("api_jwt" = []))
)]
pub async fn logout(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .auth_service
        .logout(identity.user_id())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "auth.logged_out");
    Ok(Json(ApiResponse::message(message)))
}

// PUT /api/auth/change-password
#[utoipa::path(
    put,
    path = "/api/auth/change-password",
    tag = "Auth",
    request_body = ChangePasswordPayload,
    responses(
        (status = 200, description = "Senha alterada"),
        (status = 401, description = "Senha atual incorreta")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_password(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentIdentity(identity): CurrentIdentity,
    payload: Result<Json<ChangePasswordPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api_error = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let Json(payload) = payload.map_err(|e| to_api_error(e.into()))?;
    payload.validate().map_err(|e| to_api_error(e.into()))?;

    app_state
        .auth_service
        .change_password(identity.user_id(), &payload.current_password, &payload.new_password)
        .await
        .map_err(to_api_error)?;

    let message = app_state.i18n_store.translate(&locale.0, "auth.password_changed");
    Ok(Json(ApiResponse::message(message)))
}

// POST /api/auth/forgot-password
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    tag = "Auth",
    request_body = ForgotPasswordPayload,
    responses((status = 200, description = "Sempre responde com sucesso"))
)]
pub async fn forgot_password(
    State(app_state): State<AppState>,
    locale: Locale,
    payload: Result<Json<ForgotPasswordPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api_error = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let Json(payload) = payload.map_err(|e| to_api_error(e.into()))?;
    payload.validate().map_err(|e| to_api_error(e.into()))?;

    app_state
        .auth_service
        .forgot_password(&payload.email)
        .await
        .map_err(to_api_error)?;

    let message = app_state.i18n_store.translate(&locale.0, "auth.forgot_password_sent");
    Ok(Json(ApiResponse::message(message)))
}

// POST /api/auth/reset-password
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    tag = "Auth",
    request_body = ResetPasswordPayload,
    responses(
        (status = 200, description = "Senha redefinida"),
        (status = 400, description = "Token inválido ou expirado")
    )
)]
pub async fn reset_password(
    State(app_state): State<AppState>,
    locale: Locale,
    payload: Result<Json<ResetPasswordPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api_error = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let Json(payload) = payload.map_err(|e| to_api_error(e.into()))?;
    payload.validate().map_err(|e| to_api_error(e.into()))?;

    app_state
        .auth_service
        .reset_password(&payload.token, &payload.new_password)
        .await
        .map_err(to_api_error)?;

    let message = app_state.i18n_store.translate(&locale.0, "auth.password_reset");
    Ok(Json(ApiResponse::message(message)))
}

// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Users",
    responses((status = 200, description = "Usuário, cargo, empresa e locais", body = Identity)),
    security(("api_jwt" = []))
)]
pub async fn me(CurrentIdentity(identity): CurrentIdentity) -> Json<ApiResponse<Identity>> {
    Json(ApiResponse::ok(identity))
}
