// apps/payout_console/src/pipelines/webhook_pipeline.rs

//! Processor webhook intake: verify the signature over the raw body, parse
//! the event, apply it through the engine, acknowledge.

use crate::errors::AppError;
use crate::pipelines::contexts::{ProcessorEvent, ProcessorEventEnvelope, WebhookCtxData, WebhookOutcome};
use crate::services::signature;
use payout_engine::{ContextData, Pipeline, PipelineControl, PipelineError, StepDef};
use tracing::{info, warn};

pub const WEBHOOK_PIPELINE_NAME: &str = "processor_webhook";

type Ctx = ContextData<WebhookCtxData>;

pub fn build_webhook_pipeline() -> Result<Pipeline<WebhookCtxData, AppError>, PipelineError> {
  let mut p = Pipeline::<WebhookCtxData, AppError>::new(
    WEBHOOK_PIPELINE_NAME,
    vec![
      StepDef::required("verify_signature"),
      StepDef::required("parse_event"),
      StepDef::required("apply_event").skip_if(|ctx: &WebhookCtxData| {
        matches!(ctx.event, Some(ProcessorEvent::Unhandled(_)))
      }),
      StepDef::required("acknowledge"),
    ],
  )?;

  p.on("verify_signature", verify_signature)?;
  p.on("parse_event", parse_event)?;
  p.on("apply_event", apply_event)?;
  p.on("acknowledge", acknowledge)?;
  Ok(p)
}

async fn verify_signature(ctx: Ctx) -> Result<PipelineControl, AppError> {
  let (secret, payload, provided) = {
    let guard = ctx.read();
    (
      guard.app_state.config.processor_webhook_secret.clone(),
      guard.raw_payload.clone(),
      guard.signature_header.clone(),
    )
  };

  let Some(provided) = provided else {
    warn!("Processor webhook without a signature header.");
    return Err(AppError::Auth("Missing webhook signature.".to_string()));
  };
  if !signature::verify(&secret, &payload, &provided) {
    warn!(payload_bytes = payload.len(), "Processor webhook signature mismatch.");
    return Err(AppError::Auth("Webhook signature verification failed.".to_string()));
  }
  Ok(PipelineControl::Continue)
}

async fn parse_event(ctx: Ctx) -> Result<PipelineControl, AppError> {
  let payload = ctx.read().raw_payload.clone();
  let envelope: ProcessorEventEnvelope =
    serde_json::from_slice(&payload).map_err(|e| AppError::Validation(format!("Invalid JSON payload: {}", e)))?;
  let event = ProcessorEvent::from_envelope(&envelope)?;
  info!(event_id = %envelope.id, event_type = %envelope.event_type, "Processor event received.");

  let mut guard = ctx.write();
  if let ProcessorEvent::Unhandled(event_type) = &event {
    guard.outcome = Some(WebhookOutcome::Ignored {
      event_type: event_type.clone(),
    });
  }
  guard.envelope = Some(envelope);
  guard.event = Some(event);
  Ok(PipelineControl::Continue)
}

async fn apply_event(ctx: Ctx) -> Result<PipelineControl, AppError> {
  let (app_state, envelope, event) = {
    let guard = ctx.read();
    (guard.app_state.clone(), guard.envelope.clone(), guard.event.clone())
  };
  let (Some(envelope), Some(event)) = (envelope, event) else {
    return Err(PipelineError::Internal("apply_event ran before parse_event".to_string()).into());
  };

  let outcome = match event {
    ProcessorEvent::AccountUpdated(update) => {
      let account = app_state
        .accounts
        .apply_external_status(&update.account_id, update.status, envelope.created_at)
        .await?;
      WebhookOutcome::AccountStatus {
        account_id: account.external_account_id,
        status: account.status,
      }
    }
    ProcessorEvent::TransferUpdated(update) => {
      let payout = app_state
        .orchestrator
        .apply_transfer_status(&update.transfer_id, update.status, envelope.created_at)
        .await?;
      WebhookOutcome::TransferStatus {
        transfer_id: update.transfer_id,
        payout_id: payout.id,
        status: payout.status,
      }
    }
    ProcessorEvent::Unhandled(event_type) => WebhookOutcome::Ignored { event_type },
  };
  ctx.write().outcome = Some(outcome);
  Ok(PipelineControl::Continue)
}

async fn acknowledge(ctx: Ctx) -> Result<PipelineControl, AppError> {
  let mut guard = ctx.write();
  guard.acknowledged = true;
  info!(
    event_id = ?guard.envelope.as_ref().map(|e| e.id.as_str()),
    outcome = ?guard.outcome,
    "Processor event acknowledged."
  );
  Ok(PipelineControl::Continue)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn declares_steps_in_order() {
    let pipeline = build_webhook_pipeline().unwrap();
    assert_eq!(pipeline.name(), WEBHOOK_PIPELINE_NAME);
    assert_eq!(
      pipeline.step_names(),
      vec!["verify_signature", "parse_event", "apply_event", "acknowledge"]
    );
  }
}
