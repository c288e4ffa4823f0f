// src/services/password.rs

use std::sync::Arc;

use bcrypt::{hash, verify};

use crate::common::error::AppError;

// Senha usada só para gerar o hash "isca" (ver `verify_dummy`)
const DUMMY_PASSWORD: &str = "not-a-real-password";

/// Hash de senhas com bcrypt, sempre fora do runtime async.
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    dummy_hash: Arc<str>,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, AppError> {
        let dummy_hash = hash(DUMMY_PASSWORD, cost)?;
        Ok(Self { cost, dummy_hash: dummy_hash.into() })
    }

    pub async fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        let password_clone = plaintext.to_owned();
        let cost = self.cost;

        let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        Ok(hashed)
    }

    pub async fn verify(&self, plaintext: &str, password_hash: &str) -> Result<bool, AppError> {
        let password_clone = plaintext.to_owned();
        let password_hash_clone = password_hash.to_owned();

        // Executa a verificação em um thread separado
        let is_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        Ok(is_valid)
    }

    /// Gasta o mesmo tempo de uma verificação real quando o usuário não existe,
    /// para que o tempo de resposta do login não revele e-mails cadastrados.
    pub async fn verify_dummy(&self, plaintext: &str) -> Result<(), AppError> {
        let dummy = self.dummy_hash.to_string();
        self.verify(plaintext, &dummy).await.map(|_| ())
    }
}
