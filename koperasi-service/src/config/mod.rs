use anyhow::Result;
use dotenvy::dotenv;
use rust_decimal::Decimal;
use secrecy::Secret;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

#[derive(Deserialize, Clone, Debug)]
pub struct KoperasiConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub rules: RulesConfig,
    pub service_name: String,
    pub log_level: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
    pub token_expiry_minutes: i64,
}

/// Business rules, configured in one place and threaded through
/// `AppState`.
#[derive(Deserialize, Clone, Debug)]
pub struct RulesConfig {
    /// Upper bound on a member's outstanding hutang. A hutang-financed
    /// purchase must fit inside `debt_limit - hutang`.
    pub debt_limit: Decimal,
}

impl KoperasiConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("KOPERASI_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("KOPERASI_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()?;

        let db_url = env::var("KOPERASI_DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("KOPERASI_DATABASE_URL must be set"))?;
        let max_connections = env::var("KOPERASI_DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()?;
        let min_connections = env::var("KOPERASI_DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()?;

        let jwt_secret = env::var("KOPERASI_JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("KOPERASI_JWT_SECRET must be set"))?;
        let token_expiry_minutes = env::var("KOPERASI_TOKEN_EXPIRY_MINUTES")
            .unwrap_or_else(|_| "60".to_string())
            .parse()?;

        let debt_limit = env::var("KOPERASI_DEBT_LIMIT")
            .unwrap_or_else(|_| "1000000".to_string());
        let debt_limit = Decimal::from_str(&debt_limit)
            .map_err(|e| anyhow::anyhow!("Invalid KOPERASI_DEBT_LIMIT: {}", e))?;
        if debt_limit < Decimal::ZERO {
            return Err(anyhow::anyhow!("KOPERASI_DEBT_LIMIT must be non-negative"));
        }

        let log_level = env::var("KOPERASI_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: Secret::new(db_url),
                max_connections,
                min_connections,
            },
            auth: AuthConfig {
                jwt_secret: Secret::new(jwt_secret),
                token_expiry_minutes,
            },
            rules: RulesConfig { debt_limit },
            service_name: "koperasi-service".to_string(),
            log_level,
        })
    }
}
