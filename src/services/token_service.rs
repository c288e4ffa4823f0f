// src/services/token_service.rs

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{AccessClaims, RefreshClaims, TokenKind, TokenSubject},
};

/// Emissão e validação dos JWTs de sessão (HS256).
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn issue_access_token(&self, subject: &TokenSubject) -> Result<String, AppError> {
        self.issue_access_token_at(subject, Utc::now())
    }

    pub fn issue_access_token_at(&self, subject: &TokenSubject, now: DateTime<Utc>) -> Result<String, AppError> {
        let claims = AccessClaims {
            sub: subject.user_id,
            email: subject.email.clone(),
            role_id: subject.role_id,
            company_id: subject.company_id,
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
            typ: TokenKind::Access,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    pub fn issue_refresh_token(&self, user_id: Uuid) -> Result<String, AppError> {
        self.issue_refresh_token_at(user_id, Utc::now())
    }

    pub fn issue_refresh_token_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<String, AppError> {
        let claims = RefreshClaims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
            typ: TokenKind::Refresh,
            jti: Uuid::new_v4(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Falha com `InvalidToken` (assinatura, formato ou classe errada) ou
    /// `ExpiredToken` (claim `exp` no passado, sem tolerância).
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AppError> {
        let claims: AccessClaims = self.decode_claims(token)?;
        if claims.typ != TokenKind::Access {
            return Err(AppError::InvalidToken);
        }
        Ok(claims)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, AppError> {
        let claims: RefreshClaims = self.decode_claims(token)?;
        if claims.typ != TokenKind::Refresh {
            return Err(AppError::InvalidToken);
        }
        Ok(claims)
    }

    fn decode_claims<T: DeserializeOwned>(&self, token: &str) -> Result<T, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<T>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::InvalidToken,
            })
    }
}
