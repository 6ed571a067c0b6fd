// apps/payout_console/src/pipelines/contexts.rs

//! Context data for the console's pipelines and the processor event shapes
//! they carry.

use crate::errors::AppError;
use crate::state::AppState;
use actix_web::web::Bytes;
use chrono::{DateTime, Utc};
use payout_engine::{AccountStatus, PayoutStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Outer shape of every processor webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorEventEnvelope {
  pub id: String,
  #[serde(rename = "type")]
  pub event_type: String,
  /// When the processor observed the change; drives last-write-wins.
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub data: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdated {
  pub account_id: String,
  pub status: AccountStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferUpdated {
  pub transfer_id: String,
  pub status: PayoutStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessorEvent {
  AccountUpdated(AccountUpdated),
  TransferUpdated(TransferUpdated),
  /// Event types the console does not act on; acknowledged and dropped.
  Unhandled(String),
}

impl ProcessorEvent {
  pub fn from_envelope(envelope: &ProcessorEventEnvelope) -> Result<Self, AppError> {
    let invalid = |e: serde_json::Error| AppError::Validation(format!("Invalid '{}' payload: {}", envelope.event_type, e));
    match envelope.event_type.as_str() {
      "account.updated" => Ok(ProcessorEvent::AccountUpdated(
        serde_json::from_value(envelope.data.clone()).map_err(invalid)?,
      )),
      "transfer.updated" => Ok(ProcessorEvent::TransferUpdated(
        serde_json::from_value(envelope.data.clone()).map_err(invalid)?,
      )),
      other => Ok(ProcessorEvent::Unhandled(other.to_string())),
    }
  }
}

/// What applying an event changed, echoed back in the webhook response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "applied", rename_all = "snake_case")]
pub enum WebhookOutcome {
  AccountStatus { account_id: String, status: AccountStatus },
  TransferStatus { transfer_id: String, payout_id: Uuid, status: PayoutStatus },
  Ignored { event_type: String },
}

#[derive(Clone)]
pub struct WebhookCtxData {
  pub app_state: AppState,
  pub raw_payload: Bytes,
  pub signature_header: Option<String>,
  // Filled in by the pipeline:
  pub envelope: Option<ProcessorEventEnvelope>,
  pub event: Option<ProcessorEvent>,
  pub outcome: Option<WebhookOutcome>,
  pub acknowledged: bool,
}

impl WebhookCtxData {
  pub fn new(app_state: AppState, raw_payload: Bytes, signature_header: Option<String>) -> Self {
    Self {
      app_state,
      raw_payload,
      signature_header,
      envelope: None,
      event: None,
      outcome: None,
      acknowledged: false,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn envelope(event_type: &str, data: JsonValue) -> ProcessorEventEnvelope {
    ProcessorEventEnvelope {
      id: "evt_1".to_string(),
      event_type: event_type.to_string(),
      created_at: Utc::now(),
      data,
    }
  }

  #[test]
  fn parses_known_event_types() {
    let account = envelope("account.updated", json!({"account_id": "acct_1", "status": "ready"}));
    assert_eq!(
      ProcessorEvent::from_envelope(&account).unwrap(),
      ProcessorEvent::AccountUpdated(AccountUpdated {
        account_id: "acct_1".to_string(),
        status: AccountStatus::Ready,
      })
    );

    let transfer = envelope("transfer.updated", json!({"transfer_id": "tr_1", "status": "failed"}));
    assert_eq!(
      ProcessorEvent::from_envelope(&transfer).unwrap(),
      ProcessorEvent::TransferUpdated(TransferUpdated {
        transfer_id: "tr_1".to_string(),
        status: PayoutStatus::Failed,
      })
    );
  }

  #[test]
  fn unknown_types_are_unhandled_and_bad_payloads_rejected() {
    let other = envelope("balance.available", json!({}));
    assert_eq!(
      ProcessorEvent::from_envelope(&other).unwrap(),
      ProcessorEvent::Unhandled("balance.available".to_string())
    );

    let broken = envelope("account.updated", json!({"account_id": "acct_1", "status": "verified"}));
    assert!(matches!(
      ProcessorEvent::from_envelope(&broken),
      Err(AppError::Validation(_))
    ));
  }
}
