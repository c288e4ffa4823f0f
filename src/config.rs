// src/config.rs

use std::{sync::Arc, time::Duration as StdDuration};

use anyhow::{anyhow, bail, Context};
use chrono::Duration;
use sqlx::postgres::PgPoolOptions;

use crate::{
    common::i18n::I18nStore,
    db::{
        memory::DemoSeed, InMemoryStore, PgRoleRepository, PgTenancyRepository, PgUserRepository,
        RoleRepository, TenancyRepository, UserRepository,
    },
    services::{
        access_service::AccessService, auth::AuthService, identity_service::IdentityResolver,
        notifier::LoggingNotifier, password::PasswordHasher, token_service::TokenService,
    },
};

/// Senha de todos os usuários do modo demonstração.
pub const DEMO_PASSWORD: &str = "demo1234";

/// Configuração lida do ambiente (e do `.env`, via `dotenvy`).
#[derive(Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub bcrypt_cost: u32,
    pub reset_ttl: Duration,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub bind_addr: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Monta a configuração a partir de uma função de busca (ambiente, mapa de testes...).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = var("JWT_SECRET").ok_or_else(|| anyhow!("JWT_SECRET deve ser definido"))?;

        let duration = |key: &str, default: &str| -> anyhow::Result<Duration> {
            let raw = var(key).unwrap_or_else(|| default.to_string());
            parse_duration(&raw).with_context(|| format!("{} inválido: '{}'", key, raw))
        };

        let bcrypt_cost = match var("BCRYPT_ROUNDS") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|cost| (4..=31).contains(cost))
                .ok_or_else(|| anyhow!("BCRYPT_ROUNDS deve estar entre 4 e 31, recebido '{}'", raw))?,
            None => 12,
        };

        let database_max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| anyhow!("DATABASE_MAX_CONNECTIONS inválido: '{}'", raw))?,
            None => 5,
        };

        Ok(Self {
            jwt_secret,
            access_ttl: duration("JWT_EXPIRES_IN", "24h")?,
            refresh_ttl: duration("JWT_REFRESH_EXPIRES_IN", "7d")?,
            bcrypt_cost,
            reset_ttl: duration("PASSWORD_RESET_EXPIRES_IN", "1h")?,
            database_url: var("DATABASE_URL"),
            database_max_connections,
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        })
    }
}

/// Aceita `30m`, `24h`, `7d`, `45s` ou só o número de segundos.
pub fn parse_duration(raw: &str) -> anyhow::Result<Duration> {
    let raw = raw.trim();
    let (number, unit) = match raw.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&raw[..idx], Some(c.to_ascii_lowercase())),
        _ => (raw, None),
    };

    let value: i64 = number.parse().with_context(|| format!("duração inválida: '{}'", raw))?;
    if value <= 0 {
        bail!("duração deve ser positiva: '{}'", raw);
    }

    match unit {
        None | Some('s') => Ok(Duration::seconds(value)),
        Some('m') => Ok(Duration::minutes(value)),
        Some('h') => Ok(Duration::hours(value)),
        Some('d') => Ok(Duration::days(value)),
        Some(other) => bail!("unidade de duração desconhecida '{}' em '{}'", other, raw),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub identity_resolver: IdentityResolver,
    pub access_service: AccessService,
    pub token_service: TokenService,
    pub role_repo: Arc<dyn RoleRepository>,
    pub tenancy_repo: Arc<dyn TenancyRepository>,
    pub i18n_store: I18nStore,
}

impl AppState {
    /// Postgres quando `DATABASE_URL` está definida; caso contrário, store em
    /// memória com dados de demonstração.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let Some(database_url) = &config.database_url else {
            tracing::warn!("⚠️ DATABASE_URL não definida: usando store em memória (modo demonstração)");
            let (state, seed) = Self::in_memory(config).await?;
            for user in &seed.users {
                tracing::info!("👤 Usuário demo: {} / {}", user.email, DEMO_PASSWORD);
            }
            return Ok(state);
        };

        let db_pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(StdDuration::from_secs(3))
            .connect(database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;
        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        sqlx::migrate!()
            .run(&db_pool)
            .await
            .context("Falha ao rodar as migrações do banco de dados")?;
        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

        Self::with_repositories(
            config,
            PasswordHasher::new(config.bcrypt_cost)?,
            Arc::new(PgUserRepository::new(db_pool.clone())),
            Arc::new(PgRoleRepository::new(db_pool.clone())),
            Arc::new(PgTenancyRepository::new(db_pool)),
        )
    }

    /// Estado sobre um `InMemoryStore` recém-populado com `seed_demo`.
    pub async fn in_memory(config: &AppConfig) -> anyhow::Result<(Self, DemoSeed)> {
        let hasher = PasswordHasher::new(config.bcrypt_cost)?;
        let store = Arc::new(InMemoryStore::new());
        let seed = store.seed_demo(&hasher.hash(DEMO_PASSWORD).await?).await?;

        let state = Self::with_repositories(config, hasher, store.clone(), store.clone(), store)?;
        Ok((state, seed))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_repositories(
        config: &AppConfig,
        hasher: PasswordHasher,
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleRepository>,
        tenancy: Arc<dyn TenancyRepository>,
    ) -> anyhow::Result<Self> {
        let token_service = TokenService::new(&config.jwt_secret, config.access_ttl, config.refresh_ttl);

        let auth_service = AuthService::new(
            users.clone(),
            roles.clone(),
            tenancy.clone(),
            hasher,
            token_service.clone(),
            Arc::new(LoggingNotifier),
            config.reset_ttl,
        );
        let identity_resolver = IdentityResolver::new(users, roles.clone(), tenancy.clone());
        let access_service = AccessService::new(tenancy.clone());

        Ok(Self {
            auth_service,
            identity_resolver,
            access_service,
            token_service,
            role_repo: roles,
            tenancy_repo: tenancy,
            i18n_store: I18nStore::new(),
        })
    }
}
