// src/common/error.rs

use std::collections::HashMap;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    common::i18n::{I18nStore, DEFAULT_LANG},
    middleware::i18n::Locale,
    models::access::AccessDenied,
};

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // --- Autenticação (401) ---
    #[error("Token ausente")]
    MissingToken,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Token expirado")]
    ExpiredToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Usuário inativo")]
    UserInactive,

    #[error("Empresa inativa")]
    CompanyInactive,

    // --- Autorização (403) ---
    #[error("Acesso negado: {0}")]
    Forbidden(#[from] AccessDenied),

    // --- Fluxos de credencial ---
    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Cargo inválido")]
    InvalidRole,

    #[error("Empresa inválida")]
    InvalidCompany,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Refresh token inválido")]
    InvalidRefreshToken,

    #[error("Token de redefinição inválido ou expirado")]
    InvalidOrExpiredToken,

    #[error("Recurso não encontrado: {0}")]
    NotFound(&'static str),

    #[error("Cabeçalho inválido: {0}")]
    InvalidHeader(&'static str),

    #[error("Já existe um cargo com esse nome na empresa")]
    RoleAlreadyExists,

    // Corpo JSON ou query string que nem chegam a desserializar
    #[error("Requisição malformada: {0}")]
    MalformedRequest(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::MissingToken
            | AppError::InvalidToken
            | AppError::ExpiredToken
            | AppError::UserNotFound
            | AppError::UserInactive
            | AppError::CompanyInactive => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::EmailAlreadyExists
            | AppError::InvalidRole
            | AppError::InvalidCompany
            | AppError::InvalidOrExpiredToken
            | AppError::InvalidHeader(_)
            | AppError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            AppError::RoleAlreadyExists => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Chave do catálogo de mensagens (ver `common::i18n`).
    pub fn message_key(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation.failed",
            AppError::MissingToken => "auth.missing_token",
            AppError::InvalidToken => "auth.invalid_token",
            AppError::ExpiredToken => "auth.expired_token",
            AppError::UserNotFound => "auth.user_not_found",
            AppError::UserInactive => "auth.user_inactive",
            AppError::CompanyInactive => "auth.company_inactive",
            AppError::Forbidden(reason) => match reason {
                AccessDenied::PermissionDenied => "access.permission_denied",
                AccessDenied::CrossTenantAccess => "access.cross_tenant",
                AccessDenied::LocationAccessDenied => "access.location_denied",
                AccessDenied::LocationInactive => "access.location_inactive",
                AccessDenied::RoleNotAllowed => "access.role_not_allowed",
            },
            AppError::EmailAlreadyExists => "auth.email_exists",
            AppError::InvalidRole => "auth.invalid_role",
            AppError::InvalidCompany => "auth.invalid_company",
            AppError::InvalidCredentials => "auth.invalid_credentials",
            AppError::InvalidRefreshToken => "auth.invalid_refresh_token",
            AppError::InvalidOrExpiredToken => "auth.invalid_reset_token",
            AppError::NotFound(_) => "resource.not_found",
            AppError::InvalidHeader(_) => "request.invalid_header",
            AppError::RoleAlreadyExists => "role.already_exists",
            AppError::MalformedRequest(_) => "request.malformed",
            _ => "internal.error",
        }
    }

    /// Converte para a resposta da API, traduzida para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // O detalhe vai para o log, nunca para o cliente
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let details = match self {
            AppError::ValidationError(errors) => Some(validation_details(errors)),
            AppError::InvalidHeader(header) => Some(json!({ "header": header })),
            AppError::MalformedRequest(reason) => Some(json!({ "reason": reason })),
            _ => None,
        };

        ApiError {
            status,
            message: i18n.translate(&locale.0, self.message_key()),
            details,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::MalformedRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::MalformedRequest(rejection.body_text())
    }
}

fn validation_details(errors: &validator::ValidationErrors) -> Value {
    let mut details = HashMap::new();
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<String> = field_errors
            .iter()
            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .collect();
        details.insert(field.to_string(), messages);
    }
    json!(details)
}

/// Erro já pronto para virar resposta HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "success": false, "message": self.message, "details": details }),
            None => json!({ "success": false, "message": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

// Usado quando não há `Locale` disponível (ex.: rejeição de extrator)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale(DEFAULT_LANG.to_string()), &I18nStore::new())
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_failures_are_401_and_authorization_failures_403() {
        for err in [
            AppError::MissingToken,
            AppError::InvalidToken,
            AppError::ExpiredToken,
            AppError::UserInactive,
            AppError::CompanyInactive,
        ] {
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        }
        for reason in [
            AccessDenied::PermissionDenied,
            AccessDenied::CrossTenantAccess,
            AccessDenied::LocationAccessDenied,
            AccessDenied::RoleNotAllowed,
        ] {
            assert_eq!(AppError::Forbidden(reason).status(), StatusCode::FORBIDDEN);
        }
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = AppError::InternalServerError(anyhow::anyhow!("pool exhausted at 10.0.0.3"));
        let api = err.to_api_error(&Locale("en".into()), &I18nStore::new());
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, "An unexpected error occurred.");
    }

    #[test]
    fn malformed_requests_are_400_with_reason() {
        let err = AppError::MalformedRequest("missing field `capability`".into());
        let api = err.to_api_error(&Locale("pt".into()), &I18nStore::new());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.message, "A requisição está malformada.");
        assert_eq!(api.details, Some(json!({ "reason": "missing field `capability`" })));
    }

    #[test]
    fn duplicate_role_is_a_conflict() {
        assert_eq!(AppError::RoleAlreadyExists.status(), StatusCode::CONFLICT);
    }
}
