// apps/payout_console/src/state.rs

use crate::config::AppConfig;
use crate::db::PgStore;
use crate::errors::{AppError, Result};
use crate::pipelines::contexts::WebhookCtxData;
use crate::pipelines::webhook_pipeline::build_webhook_pipeline;
use crate::services::processor_mock::SimulatedProcessor;
use payout_engine::{AccountLifecycle, PayoutLedger, PayoutOrchestrator, PayoutServices, Pipeline, Reconciler};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
  pub db_pool: PgPool,
  pub config: Arc<AppConfig>, // Share loaded config
  pub orchestrator: PayoutOrchestrator,
  pub accounts: AccountLifecycle,
  pub ledger: PayoutLedger,
  pub reconciler: Reconciler,
  pub webhook_pipeline: Arc<Pipeline<WebhookCtxData, AppError>>,
}

impl AppState {
  /// Postgres stores plus the simulated processor.
  pub fn new(db_pool: PgPool, config: Arc<AppConfig>) -> Result<Self> {
    let store = Arc::new(PgStore::new(db_pool.clone()));
    let processor = Arc::new(SimulatedProcessor::new(
      Duration::from_millis(config.processor_simulated_latency_ms),
      config.processor_onboarding_base_url.clone(),
    ));
    let services = PayoutServices {
      orders: store.clone(),
      rates: store.clone(),
      accounts: store.clone(),
      payouts: store,
      processor,
      config: Arc::new(config.settlement.clone()),
    };
    Self::with_services(db_pool, config, services)
  }

  /// Wires the settlement services over any set of ports.
  pub fn with_services(db_pool: PgPool, config: Arc<AppConfig>, services: PayoutServices) -> Result<Self> {
    Ok(Self {
      db_pool,
      config,
      orchestrator: PayoutOrchestrator::new(services.clone())?,
      accounts: AccountLifecycle::new(services.clone()),
      ledger: PayoutLedger::new(services.clone()),
      reconciler: Reconciler::new(services),
      webhook_pipeline: Arc::new(build_webhook_pipeline()?),
    })
  }

  pub fn services(&self) -> &PayoutServices {
    self.orchestrator.services()
  }
}
