// src/services/notifier.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{common::error::AppError, models::auth::User};

/// Entrega do token de redefinição ao usuário (e-mail, SMS...).
#[async_trait]
pub trait PasswordResetNotifier: Send + Sync {
    async fn send_reset_token(
        &self,
        user: &User,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;
}

/// Sem provedor de e-mail configurado: só registra o pedido (sem o token).
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl PasswordResetNotifier for LoggingNotifier {
    async fn send_reset_token(
        &self,
        user: &User,
        _token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        tracing::info!(
            user_id = %user.id,
            %expires_at,
            "Token de redefinição de senha gerado"
        );
        Ok(())
    }
}
