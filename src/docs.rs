// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,

        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::auth::change_password,
        handlers::auth::forgot_password,
        handlers::auth::reset_password,

        // --- Users ---
        handlers::auth::me,

        // --- RBAC ---
        handlers::rbac::list_roles,
        handlers::rbac::create_role,
        handlers::rbac::list_templates,
        handlers::rbac::check_access,

        // --- Tenancy ---
        handlers::tenancy::list_locations,
        handlers::tenancy::get_location,
        handlers::tenancy::deactivate_company,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::RefreshTokenPayload,
            models::auth::ChangePasswordPayload,
            models::auth::ForgotPasswordPayload,
            models::auth::ResetPasswordPayload,
            models::auth::AuthResponse,
            models::auth::AccessTokenResponse,

            // --- RBAC ---
            models::rbac::Resource,
            models::rbac::Action,
            models::rbac::ActionSet,
            models::rbac::PermissionTable,
            models::rbac::RoleScope,
            models::rbac::Role,
            models::rbac::RoleTemplate,
            models::rbac::RoleTemplateResponse,
            models::rbac::CreateRolePayload,

            // --- Tenancy ---
            models::tenancy::Company,
            models::tenancy::LocationType,
            models::tenancy::Location,
            models::tenancy::AssignedLocation,

            // --- Acesso ---
            models::identity::Identity,
            models::access::AccessDenied,
            models::access::AccessCheckResponse,
        )
    ),
    tags(
        (name = "Health", description = "Disponibilidade do serviço"),
        (name = "Auth", description = "Autenticação, Sessão e Senhas"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "RBAC", description = "Controle de Acesso (Cargos e Permissões)"),
        (name = "Tenancy", description = "Empresas e Locais")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("api_jwt", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}
