// src/services/auth.rs

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{RoleRepository, TenancyRepository, UserRepository},
    models::auth::{AccessTokenResponse, AuthResponse, NewUser, TokenSubject, User},
    services::{notifier::PasswordResetNotifier, password::PasswordHasher, token_service::TokenService},
};

const TOKEN_TYPE: &str = "Bearer";

/// Dados de cadastro já validados pelo handler.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role_id: Uuid,
    pub company_id: Uuid,
}

/// Ciclo de vida da sessão: cadastro, login, refresh, logout e senhas.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
    tenancy: Arc<dyn TenancyRepository>,
    hasher: PasswordHasher,
    tokens: TokenService,
    notifier: Arc<dyn PasswordResetNotifier>,
    reset_ttl: Duration,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleRepository>,
        tenancy: Arc<dyn TenancyRepository>,
        hasher: PasswordHasher,
        tokens: TokenService,
        notifier: Arc<dyn PasswordResetNotifier>,
        reset_ttl: Duration,
    ) -> Self {
        Self { users, roles, tenancy, hasher, tokens, notifier, reset_ttl }
    }

    pub async fn register(&self, registration: Registration) -> Result<AuthResponse, AppError> {
        let email = normalize_email(&registration.email);

        // 1. E-mail único
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::EmailAlreadyExists);
        }

        // 2. Cargo: precisa existir e ser da empresa (cargos de sistema não
        // podem ser obtidos por cadastro público)
        let role = self
            .roles
            .find_by_id(registration.role_id)
            .await?
            .ok_or(AppError::InvalidRole)?;
        if role.is_system() || !role.usable_in(registration.company_id) {
            return Err(AppError::InvalidRole);
        }

        // 3. Empresa ativa
        match self.tenancy.find_company(registration.company_id).await? {
            Some(company) if company.is_active => {}
            _ => return Err(AppError::InvalidCompany),
        }

        // 4. Cria o usuário
        let password_hash = self.hasher.hash(&registration.password).await?;
        let user = self
            .users
            .create_user(NewUser {
                email,
                password_hash,
                first_name: registration.first_name,
                last_name: registration.last_name,
                role_id: role.id,
                company_id: registration.company_id,
            })
            .await?;

        tracing::info!(user_id = %user.id, company_id = %user.company_id, "Usuário cadastrado");

        self.start_session(user).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let email = normalize_email(email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            // Mesmo custo de uma verificação real
            self.hasher.verify_dummy(password).await?;
            return Err(AppError::InvalidCredentials);
        };

        let is_password_valid = self.hasher.verify(password, &user.password_hash).await?;
        if !is_password_valid || !user.is_active {
            return Err(AppError::InvalidCredentials);
        }

        let now = Utc::now();
        self.users.record_login(user.id, now).await?;
        tracing::info!(user_id = %user.id, "Login realizado");

        self.start_session(User { last_login_at: Some(now), ..user }).await
    }

    /// Novo access token. O refresh token apresentado precisa ser o mesmo
    /// que está gravado para o usuário (logout e reset o invalidam).
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessTokenResponse, AppError> {
        let claims = self
            .tokens
            .verify_refresh_token(refresh_token)
            .map_err(|_| AppError::InvalidRefreshToken)?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidRefreshToken)?;

        if !user.is_active || user.refresh_token.as_deref() != Some(refresh_token) {
            return Err(AppError::InvalidRefreshToken);
        }

        let access_token = self.tokens.issue_access_token(&TokenSubject::from(&user))?;
        Ok(AccessTokenResponse {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: self.tokens.access_ttl().num_seconds(),
        })
    }

    pub async fn logout(&self, user_id: Uuid) -> Result<(), AppError> {
        self.users.set_refresh_token(user_id, None).await?;
        tracing::info!(%user_id, "Logout realizado");
        Ok(())
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if !self.hasher.verify(current_password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        let password_hash = self.hasher.hash(new_password).await?;
        self.users.update_password(user_id, &password_hash).await?;
        tracing::info!(%user_id, "Senha alterada");
        Ok(())
    }

    /// Sempre responde com sucesso, para não revelar quais e-mails existem.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AppError> {
        let email = normalize_email(email);

        let user = match self.users.find_by_email(&email).await? {
            Some(user) if user.is_active => user,
            _ => return Ok(()),
        };

        let token = Uuid::new_v4().simple().to_string();
        let expires_at = Utc::now() + self.reset_ttl;
        self.users.set_password_reset(user.id, &token, expires_at).await?;
        // Falha na entrega não pode mudar a resposta (revelaria que o e-mail existe)
        if let Err(e) = self.notifier.send_reset_token(&user, &token, expires_at).await {
            tracing::error!(user_id = %user.id, error = %e, "Falha ao entregar o token de redefinição");
        }

        Ok(())
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        let user = self
            .users
            .find_by_reset_token(token)
            .await?
            .ok_or(AppError::InvalidOrExpiredToken)?;

        match user.password_reset_expires {
            Some(expires_at) if expires_at > Utc::now() => {}
            _ => return Err(AppError::InvalidOrExpiredToken),
        }

        let password_hash = self.hasher.hash(new_password).await?;
        self.users.complete_password_reset(user.id, &password_hash).await?;
        tracing::info!(user_id = %user.id, "Senha redefinida");
        Ok(())
    }

    // O refresh token é gravado antes de ser devolvido ao cliente
    async fn start_session(&self, user: User) -> Result<AuthResponse, AppError> {
        let access_token = self.tokens.issue_access_token(&TokenSubject::from(&user))?;
        let refresh_token = self.tokens.issue_refresh_token(user.id)?;
        self.users.set_refresh_token(user.id, Some(&refresh_token)).await?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: self.tokens.access_ttl().num_seconds(),
            user,
        })
    }
}
