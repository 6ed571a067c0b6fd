// apps/payout_console/src/web/handlers/settlement_handlers.rs

use actix_web::{web, HttpResponse};
use payout_engine::PayoutError;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

/// Rounded preview plus anything the operator must see before confirming.
#[instrument(name = "handler::settlement_preview", skip(app_state, path), fields(order_item_id = %path.as_ref()))]
pub async fn settlement_preview_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order_item_id = path.into_inner();
  let preview = app_state.orchestrator.preview_settlement(order_item_id).await?;
  let warnings = preview.warnings();
  Ok(HttpResponse::Ok().json(json!({
      "preview": preview,
      "warnings": warnings,
  })))
}

#[instrument(name = "handler::request_payout", skip(app_state, path), fields(order_item_id = %path.as_ref()))]
pub async fn request_payout_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order_item_id = path.into_inner();
  match app_state.orchestrator.request_payout(order_item_id).await {
    Ok(payout) => {
      info!(payout_id = %payout.id, status = %payout.status, "Payout created.");
      Ok(HttpResponse::Created().json(payout))
    }
    // A repeated request is an expected answer, not a failure.
    Err(PayoutError::AlreadyPaid { existing, .. }) => Ok(HttpResponse::Ok().json(json!({
        "status": "already_paid",
        "payout": existing,
    }))),
    Err(e) => Err(e.into()),
  }
}
