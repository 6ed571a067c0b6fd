// apps/payout_console/src/web/handlers/commission_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use payout_engine::{CommissionRate, PayoutError};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;

#[instrument(name = "handler::list_commission_rates", skip(app_state))]
pub async fn list_commission_rates_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let rates = app_state
    .services()
    .rates
    .commission_rates()
    .await
    .map_err(PayoutError::from)?;
  Ok(HttpResponse::Ok().json(rates))
}

#[derive(Deserialize, Debug)]
pub struct UpsertCommissionRate {
  pub rate_percent: Decimal,
}

#[instrument(name = "handler::upsert_commission_rate", skip(app_state, path, body), fields(category = %path.as_ref()))]
pub async fn upsert_commission_rate_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  body: web::Json<UpsertCommissionRate>,
) -> Result<HttpResponse, AppError> {
  let category = path.into_inner();
  let rate = CommissionRate::new(&category, body.rate_percent, Utc::now())?;
  let stored = app_state
    .services()
    .rates
    .upsert_commission_rate(rate)
    .await
    .map_err(PayoutError::from)?;
  info!(rate_percent = %stored.rate_percent, "Commission rate saved.");
  Ok(HttpResponse::Ok().json(stored))
}
