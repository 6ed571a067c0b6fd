// apps/payout_console/src/main.rs

mod config;
mod db;
mod errors;
mod models;
mod pipelines;
mod services;
mod state;
mod web;

use crate::config::{AppConfig, LogFormat};
use crate::errors::AppError;
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE); // Log when spans close, showing duration
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Text => builder.init(),
  }
}

async fn build_state(app_config: Arc<AppConfig>) -> Result<AppState, AppError> {
  let db_pool = PgPoolOptions::new()
    .max_connections(app_config.database_max_connections)
    .connect(&app_config.database_url)
    .await?;
  tracing::info!("Successfully connected to the database.");

  if app_config.run_migrations {
    sqlx::migrate!("./migrations")
      .run(&db_pool)
      .await
      .map_err(|e| AppError::Config(format!("Database migration failed: {}", e)))?;
    tracing::info!("Database migrations applied.");
  }

  AppState::new(db_pool, app_config)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  // Config first: it decides the log format.
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      eprintln!("Failed to load application configuration: {}", e);
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };
  init_tracing(app_config.log_format);
  tracing::info!(config = ?app_config, "Starting payout console server...");

  let app_state = match build_state(app_config.clone()).await {
    Ok(state) => state,
    Err(e) => {
      tracing::error!(error = %e, "Failed to initialise application state.");
      return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
    }
  };

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
