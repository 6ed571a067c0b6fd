// payout_engine/src/orchestrator/mod.rs

//! Payout orchestration: the only component that moves money.
//!
//! `request_payout` runs a fixed pipeline:
//!
//! 1. `load_order_item`        – missing item → `NotFound`
//! 2. `check_eligibility`      – not shipped → `NotEligible`
//! 3. `check_not_already_paid` – flagged or active payout → `AlreadyPaid`
//! 4. `check_account_ready`    – account not `ready` → `AccountNotReady`
//! 5. `compute_settlement`     – fresh preview from current rates and fees
//! 6. `dispatch_transfer`      – skipped when the rounded net is zero
//! 7. `record_payout`          – unique per order item, enforced by the store
//! 8. `mark_order_item_paid`   – conditional flip of `seller_paid`
//!
//! The order item id is the processor idempotency key, so a retried request
//! never moves money twice.

pub mod context;
mod steps;

pub use context::PayoutCtxData;

use crate::commission::CommissionSchedule;
use crate::error::{PayoutError, PipelineError};
use crate::model::{Payout, PayoutStatus};
use crate::pipeline::{ContextData, Pipeline, PipelineResult, StepDef};
use crate::ports::PayoutServices;
use crate::settlement::{SettlementCalculator, SettlementPreview};
use chrono::{DateTime, Utc};
use context::produced;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

pub const PAYOUT_PIPELINE_NAME: &str = "request_payout";

/// Builds the payout pipeline with all handlers registered.
pub fn build_payout_pipeline() -> Result<Pipeline<PayoutCtxData, PayoutError>, PipelineError> {
  let mut p = Pipeline::new(
    PAYOUT_PIPELINE_NAME,
    vec![
      StepDef::required("load_order_item"),
      StepDef::required("check_eligibility"),
      StepDef::required("check_not_already_paid"),
      StepDef::required("check_account_ready"),
      StepDef::required("compute_settlement"),
      StepDef::required("dispatch_transfer").skip_if(steps::nothing_to_transfer),
      StepDef::required("record_payout"),
      StepDef::required("mark_order_item_paid"),
    ],
  )?;

  p.on("load_order_item", steps::load_order_item)?
    .on("check_eligibility", steps::check_eligibility)?
    .on("check_not_already_paid", steps::check_not_already_paid)?
    .on("check_account_ready", steps::check_account_ready)?
    .on("compute_settlement", steps::compute_settlement)?
    .on("dispatch_transfer", steps::dispatch_transfer)?
    .on("record_payout", steps::record_payout)?
    .on("mark_order_item_paid", steps::mark_order_item_paid)?;

  Ok(p)
}

/// Settlement previews, payout requests and asynchronous transfer confirmation.
#[derive(Clone)]
pub struct PayoutOrchestrator {
  services: PayoutServices,
  pipeline: Arc<Pipeline<PayoutCtxData, PayoutError>>,
}

impl std::fmt::Debug for PayoutOrchestrator {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PayoutOrchestrator")
      .field("services", &self.services)
      .field("pipeline", &self.pipeline.name())
      .finish()
  }
}

impl PayoutOrchestrator {
  pub fn new(services: PayoutServices) -> Result<Self, PayoutError> {
    Ok(Self {
      services,
      pipeline: Arc::new(build_payout_pipeline()?),
    })
  }

  pub fn services(&self) -> &PayoutServices {
    &self.services
  }

  /// What the seller would be paid for the item right now, rounded to cents.
  /// Side-effect free; eligibility is checked only when the payout is requested.
  #[instrument(name = "PayoutOrchestrator::preview_settlement", skip(self), err(Display))]
  pub async fn preview_settlement(&self, order_item_id: Uuid) -> Result<SettlementPreview, PayoutError> {
    let item = self
      .services
      .orders
      .get_order_item(order_item_id)
      .await?
      .ok_or_else(|| PayoutError::NotFound(format!("order item {}", order_item_id)))?;
    let schedule = CommissionSchedule::from_rates(self.services.rates.commission_rates().await?)?;
    let preview = SettlementCalculator::new(&schedule, &self.services.config).preview(&item)?;
    Ok(preview.rounded())
  }

  /// Settles one order item. Safe to call repeatedly and concurrently for the
  /// same item: at most one payout is recorded and later calls get `AlreadyPaid`.
  #[instrument(name = "PayoutOrchestrator::request_payout", skip(self), err(Display))]
  pub async fn request_payout(&self, order_item_id: Uuid) -> Result<Payout, PayoutError> {
    let ctx = ContextData::new(PayoutCtxData::new(self.services.clone(), order_item_id));
    match self.pipeline.run(ctx.clone()).await? {
      PipelineResult::Completed => {
        let payout = produced(&ctx.read().payout, "payout")?;
        info!(%order_item_id, payout_id = %payout.id, "Payout completed.");
        Ok(payout)
      }
      PipelineResult::Stopped => Err(
        PipelineError::Internal(format!("payout pipeline stopped before settling order item {}", order_item_id)).into(),
      ),
    }
  }

  /// Applies a processor confirmation for a transfer. Only `pending` payouts
  /// move; repeated or out-of-order confirmations are ignored.
  #[instrument(name = "PayoutOrchestrator::apply_transfer_status", skip(self), err(Display))]
  pub async fn apply_transfer_status(
    &self,
    transfer_id: &str,
    status: PayoutStatus,
    at: DateTime<Utc>,
  ) -> Result<Payout, PayoutError> {
    let payout = self
      .services
      .payouts
      .get_payout_by_transfer(transfer_id)
      .await?
      .ok_or_else(|| PayoutError::NotFound(format!("payout for transfer {}", transfer_id)))?;

    if payout.status == status {
      return Ok(payout);
    }
    if !payout.status.can_transition_to(status) {
      warn!(transfer_id, payout_id = %payout.id, from = %payout.status, to = %status, "Ignoring transfer status change.");
      return Ok(payout);
    }

    let updated = match self.services.payouts.update_payout_status(payout.id, status, at).await {
      Ok(Some(updated)) => updated,
      Ok(None) => return Err(PayoutError::NotFound(format!("payout {}", payout.id))),
      Err(crate::error::StoreError::Conflict(_)) => {
        // A concurrent confirmation got there first.
        return self
          .services
          .payouts
          .get_payout(payout.id)
          .await?
          .ok_or_else(|| PayoutError::NotFound(format!("payout {}", payout.id)));
      }
      Err(e) => return Err(e.into()),
    };
    info!(transfer_id, payout_id = %updated.id, status = %updated.status, "Transfer status applied.");

    if updated.status.is_failed() {
      let item = self.services.orders.get_order_item(updated.order_item_id).await?;
      if item.map_or(false, |i| i.seller_paid) {
        error!(
          transfer_id,
          payout_id = %updated.id,
          order_item_id = %updated.order_item_id,
          "Transfer failed after the order item was flagged paid; manual remediation required."
        );
      }
    }
    Ok(updated)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pipeline_declares_every_step_with_a_handler() {
    let pipeline = build_payout_pipeline().unwrap();
    assert_eq!(
      pipeline.step_names(),
      vec![
        "load_order_item",
        "check_eligibility",
        "check_not_already_paid",
        "check_account_ready",
        "compute_settlement",
        "dispatch_transfer",
        "record_payout",
        "mark_order_item_paid",
      ]
    );
    for step in pipeline.step_names() {
      assert!(pipeline.has_any_handler(step), "{} has no handler", step);
    }
  }
}
