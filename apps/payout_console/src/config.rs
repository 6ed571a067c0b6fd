// apps/payout_console/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use payout_engine::{FeeConfig, SettlementConfig};
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Text,
  Json,
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub database_max_connections: u32,
  pub run_migrations: bool,

  pub settlement: SettlementConfig,

  // Simulated processor
  pub processor_webhook_secret: String,
  pub processor_simulated_latency_ms: u64,
  pub processor_onboarding_base_url: String,

  pub log_format: LogFormat,
}

// Secrets stay out of logs.
impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("database_url", &"[REDACTED]")
      .field("database_max_connections", &self.database_max_connections)
      .field("run_migrations", &self.run_migrations)
      .field("settlement", &self.settlement)
      .field("processor_webhook_secret", &"[REDACTED]")
      .field("processor_simulated_latency_ms", &self.processor_simulated_latency_ms)
      .field("processor_onboarding_base_url", &self.processor_onboarding_base_url)
      .field("log_format", &self.log_format)
      .finish()
  }
}

fn parse_env<T: FromStr>(var_name: &str, default: &str) -> Result<T>
where
  T::Err: std::fmt::Display,
{
  env::var(var_name)
    .unwrap_or_else(|_| default.to_string())
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {}: {}", var_name, e)))
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = parse_env::<u16>("SERVER_PORT", "8080")?;
    let database_url = get_env("DATABASE_URL")?;
    let database_max_connections = parse_env::<u32>("DATABASE_MAX_CONNECTIONS", "10")?;
    let run_migrations = parse_env::<bool>("RUN_MIGRATIONS", "true")?;

    let currency = get_env("PAYOUT_CURRENCY").unwrap_or_else(|_| "USD".to_string());
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
      return Err(AppError::Config(format!(
        "PAYOUT_CURRENCY must be a three-letter ISO code, got '{}'",
        currency
      )));
    }
    let fee_percent = parse_env::<Decimal>("PAYOUT_FEE_PERCENT", "0.25")?;
    let fixed_fee = parse_env::<Decimal>("PAYOUT_FEE_FIXED", "0.25")?;
    let fee = FeeConfig::new(fee_percent, fixed_fee).map_err(|e| AppError::Config(e.to_string()))?;

    let processor_webhook_secret = get_env("PROCESSOR_WEBHOOK_SECRET")?;
    let processor_simulated_latency_ms = parse_env::<u64>("PROCESSOR_SIMULATED_LATENCY_MS", "150")?;
    let processor_onboarding_base_url = get_env("PROCESSOR_ONBOARDING_BASE_URL")
      .unwrap_or_else(|_| format!("http://{}:{}/onboarding", server_host, server_port));

    let log_format = match get_env("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()).as_str() {
      "json" => LogFormat::Json,
      "text" => LogFormat::Text,
      other => return Err(AppError::Config(format!("Invalid LOG_FORMAT '{}': expected text or json", other))),
    };

    Ok(Self {
      server_host,
      server_port,
      database_url,
      database_max_connections,
      run_migrations,
      settlement: SettlementConfig { fee, currency },
      processor_webhook_secret,
      processor_simulated_latency_ms,
      processor_onboarding_base_url,
      log_format,
    })
  }
}
