//! Configuration module for subscription-service.

use secrecy::{ExposeSecret, Secret};
use service_core::config as core_config;
use service_core::error::AppError;
use sqlx::postgres::PgConnectOptions;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SubscriptionConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub shutdown_grace: Duration,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Secret<String>,
    pub name: String,
    /// Schema placed first on `search_path`, if any.
    pub schema: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(self.password.expose_secret())
            .database(&self.name);

        match &self.schema {
            Some(schema) => options.options([("search_path", schema.as_str())]),
            None => options,
        }
    }
}

fn required(key: &str) -> Result<String, AppError> {
    env::var(key).map_err(|_| AppError::ConfigError(anyhow::anyhow!("{} is required", key)))
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl SubscriptionConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let default_level = if common.is_production() { "info" } else { "debug" };

        let port = required("DB_PORT")?
            .parse()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("DB_PORT is invalid: {}", e)))?;

        Ok(Self {
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "subscription-service".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| default_level.to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok(),
            shutdown_grace: Duration::from_secs(parsed_or("SHUTDOWN_GRACE_SECONDS", 5)),
            database: DatabaseConfig {
                host: required("DB_HOST")?,
                port,
                user: required("DB_USER")?,
                password: Secret::new(required("DB_PASSWORD")?),
                name: required("DB_NAME")?,
                schema: env::var("DB_SCHEMA").ok().filter(|s| !s.is_empty()),
                max_connections: parsed_or("DB_MAX_CONNECTIONS", 10),
                min_connections: parsed_or("DB_MIN_CONNECTIONS", 2),
            },
            common,
        })
    }
}
