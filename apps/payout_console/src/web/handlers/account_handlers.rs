// apps/payout_console/src/web/handlers/account_handlers.rs

use actix_web::{web, HttpResponse};
use payout_engine::AccountStatus;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

#[instrument(name = "handler::create_connected_account", skip(app_state, path), fields(seller_id = %path.as_ref()))]
pub async fn create_account_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let account = app_state.accounts.ensure_account(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(account))
}

/// `status` is `none` (and `account` null) until an account is created.
#[instrument(name = "handler::get_connected_account", skip(app_state, path), fields(seller_id = %path.as_ref()))]
pub async fn get_account_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let seller_id = path.into_inner();
  let account = app_state.accounts.account(seller_id).await?;
  let status = account.as_ref().map(|a| a.status).unwrap_or(AccountStatus::None);
  Ok(HttpResponse::Ok().json(json!({
      "seller_id": seller_id,
      "status": status,
      "account": account,
  })))
}

#[instrument(name = "handler::refresh_connected_account", skip(app_state, path), fields(seller_id = %path.as_ref()))]
pub async fn refresh_account_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let account = app_state.accounts.refresh_status(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(account))
}

#[instrument(name = "handler::onboarding_link", skip(app_state, path), fields(seller_id = %path.as_ref()))]
pub async fn onboarding_link_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let url = app_state.accounts.onboarding_link(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "url": url })))
}
