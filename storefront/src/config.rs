// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
  #[default]
  Pretty,
  Json,
}

impl FromStr for LogFormat {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_ascii_lowercase().as_str() {
      "pretty" | "text" => Ok(LogFormat::Pretty),
      "json" => Ok(LogFormat::Json),
      other => Err(AppError::Config(format!("Invalid LOG_FORMAT '{}': expected 'pretty' or 'json'", other))),
    }
  }
}

/// Credentials of the admin account created on first start.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminAccount {
  pub username: String,
  pub email: String,
  pub password: String,
}

impl std::fmt::Debug for AdminAccount {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AdminAccount")
      .field("username", &self.username)
      .field("email", &self.email)
      .field("password", &"[REDACTED]")
      .finish()
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub database_url: String,
  pub db_max_connections: u32,
  pub apply_schema: bool,
  pub seed_db: bool,
  pub admin: AdminAccount,
  pub log_format: LogFormat,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from any variable source, e.g. a map in tests.
  pub fn from_lookup<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let or_default = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

    let database_url = lookup("DATABASE_URL")
      .filter(|v| !v.trim().is_empty())
      .ok_or_else(|| AppError::Config("Missing environment variable 'DATABASE_URL'".to_string()))?;

    let db_max_connections = or_default("DB_MAX_CONNECTIONS", "5")
      .parse::<u32>()
      .map_err(|e| AppError::Config(format!("Invalid DB_MAX_CONNECTIONS: {}", e)))?;
    if db_max_connections == 0 {
      return Err(AppError::Config("DB_MAX_CONNECTIONS must be at least 1".to_string()));
    }

    let apply_schema = or_default("APPLY_SCHEMA", "true")
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid APPLY_SCHEMA value: {}", e)))?;
    let seed_db = or_default("SEED_DB", "false")
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid SEED_DB value: {}", e)))?;

    let admin = AdminAccount {
      username: or_default("ADMIN_USERNAME", "admin"),
      email: or_default("ADMIN_EMAIL", "admin@example.com"),
      password: or_default("ADMIN_PASSWORD", "admin123"),
    };

    let log_format = match lookup("LOG_FORMAT") {
      Some(v) => v.parse()?,
      None => LogFormat::default(),
    };

    Ok(Self {
      database_url,
      db_max_connections,
      apply_schema,
      seed_db,
      admin,
      log_format,
    })
  }
}
