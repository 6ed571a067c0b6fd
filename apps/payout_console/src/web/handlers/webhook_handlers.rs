// apps/payout_console/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use payout_engine::{ContextData, PipelineResult};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::pipelines::contexts::WebhookCtxData;
use crate::services::signature::SIGNATURE_HEADER;
use crate::state::AppState;

#[instrument(name = "handler::processor_webhook", skip(app_state, req, body), fields(payload_bytes = body.len()))]
pub async fn processor_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let signature_header = req
    .headers()
    .get(SIGNATURE_HEADER)
    .and_then(|h_val| h_val.to_str().ok())
    .map(String::from);

  let ctx = ContextData::new(WebhookCtxData::new(app_state.get_ref().clone(), body, signature_header));

  match app_state.webhook_pipeline.run(ctx.clone()).await? {
    PipelineResult::Completed => {
      let guard = ctx.read();
      info!(acknowledged = guard.acknowledged, "Processor webhook handled.");
      Ok(HttpResponse::Ok().json(json!({
          "received": true,
          "event_id": guard.envelope.as_ref().map(|e| e.id.clone()),
          "outcome": guard.outcome,
      })))
    }
    PipelineResult::Stopped => {
      // Nothing stops this pipeline today; acknowledge so the processor does not retry.
      warn!("Processor webhook pipeline stopped early.");
      Ok(HttpResponse::Ok().json(json!({ "received": true })))
    }
  }
}
