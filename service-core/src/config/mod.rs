use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Deployment environment; `prod` switches logging to JSON.
    #[serde(default = "default_env")]
    pub env: String,
    /// Bind address in `host:port` form.
    pub server_url: String,
}

fn default_env() -> String {
    "local".to_string()
}

impl Config {
    /// Load from an optional `configuration.*` file, an optional file named by
    /// `CONFIG_PATH`, and finally the process environment.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let mut builder = Cfg::builder().add_source(File::with_name("configuration").required(false));

        if let Ok(path) = std::env::var("CONFIG_PATH") {
            if !Path::new(&path).exists() {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "config file does not exist: {}",
                    path
                )));
            }
            builder = builder.add_source(File::with_name(&path).required(true));
        }

        let config = builder.add_source(Environment::default()).build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn is_production(&self) -> bool {
        self.env == "prod"
    }
}
