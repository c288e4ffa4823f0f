// src/common/i18n.rs

use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_LANG: &str = "en";

// (chave, inglês, português)
const MESSAGES: &[(&str, &str, &str)] = &[
    ("validation.failed", "One or more fields are invalid.", "Um ou mais campos são inválidos."),
    ("auth.missing_token", "Authentication token is missing.", "Token de autenticação ausente."),
    ("auth.invalid_token", "Invalid authentication token.", "Token de autenticação inválido."),
    ("auth.expired_token", "Authentication token has expired.", "Token de autenticação expirado."),
    ("auth.user_not_found", "User not found.", "Usuário não encontrado."),
    ("auth.user_inactive", "User account is inactive.", "A conta do usuário está inativa."),
    ("auth.company_inactive", "Company is inactive.", "A empresa está inativa."),
    ("auth.invalid_credentials", "Invalid email or password.", "E-mail ou senha inválidos."),
    ("auth.invalid_refresh_token", "Invalid refresh token.", "Refresh token inválido."),
    ("auth.invalid_reset_token", "Invalid or expired reset token.", "Token de redefinição inválido ou expirado."),
    ("auth.email_exists", "This email is already in use.", "Este e-mail já está em uso."),
    ("auth.invalid_role", "Invalid role.", "Cargo inválido."),
    ("auth.invalid_company", "Invalid company.", "Empresa inválida."),
    ("auth.logged_out", "Logged out successfully.", "Sessão encerrada com sucesso."),
    ("auth.password_changed", "Password changed successfully.", "Senha alterada com sucesso."),
    ("auth.password_reset", "Password reset successfully.", "Senha redefinida com sucesso."),
    (
        "auth.forgot_password_sent",
        "If that email exists, a password reset link has been sent.",
        "Se o e-mail existir, um link de redefinição de senha foi enviado.",
    ),
    ("access.permission_denied", "You do not have permission to perform this action.", "Você não tem permissão para realizar esta ação."),
    ("access.cross_tenant", "Access to another company's data is not allowed.", "Acesso a dados de outra empresa não é permitido."),
    ("access.location_denied", "You do not have access to this location.", "Você não tem acesso a este local."),
    ("access.location_inactive", "This location is inactive.", "Este local está inativo."),
    ("access.role_not_allowed", "Your role is not allowed to perform this action.", "O seu cargo não pode realizar esta ação."),
    ("request.invalid_header", "A request header has an invalid value.", "Um cabeçalho da requisição tem valor inválido."),
    ("request.malformed", "The request is malformed.", "A requisição está malformada."),
    ("role.already_exists", "A role with this name already exists in the company.", "Já existe um cargo com esse nome na empresa."),
    ("resource.not_found", "Resource not found.", "Recurso não encontrado."),
    ("company.deactivated", "Company deactivated.", "Empresa desativada."),
    ("internal.error", "An unexpected error occurred.", "Ocorreu um erro inesperado."),
];

/// Catálogo de mensagens por idioma.
#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: Arc<HashMap<&'static str, HashMap<&'static str, &'static str>>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

impl I18nStore {
    pub fn new() -> Self {
        let mut en = HashMap::new();
        let mut pt = HashMap::new();
        for (key, en_msg, pt_msg) in MESSAGES {
            en.insert(*key, *en_msg);
            pt.insert(*key, *pt_msg);
        }

        let mut catalogs = HashMap::new();
        catalogs.insert("en", en);
        catalogs.insert("pt", pt);

        Self { catalogs: Arc::new(catalogs) }
    }

    /// Traduz a chave; cai para o idioma padrão e, por último, para a própria chave.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.catalogs
            .get(lang)
            .and_then(|catalog| catalog.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|catalog| catalog.get(key)))
            .map(|msg| msg.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}
