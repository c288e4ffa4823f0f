// src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::{config::AppState, docs::ApiDoc, middleware::auth::auth_guard};

/// Todas as rotas da API, com o estado já aplicado.
pub fn app_router(app_state: AppState) -> Router {
    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .route("/api/auth/forgot-password", post(handlers::auth::forgot_password))
        .route("/api/auth/reset-password", post(handlers::auth::reset_password));

    // Rotas protegidas pelo middleware
    let protected_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/change-password", put(handlers::auth::change_password))
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/access/check", get(handlers::rbac::check_access))
        .route("/api/roles", get(handlers::rbac::list_roles).post(handlers::rbac::create_role))
        .route("/api/roles/templates", get(handlers::rbac::list_templates))
        .route("/api/locations", get(handlers::tenancy::list_locations))
        .route("/api/locations/{id}", get(handlers::tenancy::get_location))
        .route("/api/companies/{id}", delete(handlers::tenancy::deactivate_company))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .route("/api/health", get(handlers::health))
        .merge(auth_routes)
        .merge(protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}
