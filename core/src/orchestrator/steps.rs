// payout_engine/src/orchestrator/steps.rs

//! Step handlers of the payout pipeline. Every handler copies what it needs
//! out of the context, drops the guard, then talks to the ports.

use crate::account::AccountStatus;
use crate::commission::CommissionSchedule;
use crate::error::{PayoutError, StoreError};
use crate::model::Payout;
use crate::orchestrator::context::{produced, PayoutCtxData};
use crate::pipeline::{ContextData, PipelineControl};
use crate::ports::{PayoutServices, TransferReceipt, TransferRequest};
use crate::settlement::{SettlementCalculator, SettlementPreview};
use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

type Ctx = ContextData<PayoutCtxData>;
type StepResult = Result<PipelineControl, PayoutError>;

fn services_and_id(ctx: &Ctx) -> (PayoutServices, Uuid) {
  let guard = ctx.read();
  (guard.services.clone(), guard.order_item_id)
}

pub(crate) fn payout_description(order_item_id: Uuid) -> String {
  format!("Payout for order item {}", order_item_id)
}

pub(crate) async fn load_order_item(ctx: Ctx) -> StepResult {
  let (services, order_item_id) = services_and_id(&ctx);
  let item = services
    .orders
    .get_order_item(order_item_id)
    .await?
    .ok_or_else(|| PayoutError::NotFound(format!("order item {}", order_item_id)))?;
  ctx.write().order_item = Some(item);
  Ok(PipelineControl::Continue)
}

pub(crate) async fn check_eligibility(ctx: Ctx) -> StepResult {
  let item = produced(&ctx.read().order_item, "order item")?;
  if !item.is_shipped() {
    return Err(PayoutError::NotEligible {
      order_item_id: item.id,
      status: item.fulfillment_status,
    });
  }
  Ok(PipelineControl::Continue)
}

/// Rejects items that are flagged paid or already have an active payout.
/// An active payout on an unflagged item is the leftover of an interrupted
/// run; the flag is set before reporting it.
pub(crate) async fn check_not_already_paid(ctx: Ctx) -> StepResult {
  let (services, order_item_id) = services_and_id(&ctx);
  let item = produced(&ctx.read().order_item, "order item")?;

  let active = services.payouts.find_active_payout_for_item(order_item_id).await?;
  match (item.seller_paid, active) {
    (false, None) => Ok(PipelineControl::Continue),
    (false, Some(existing)) => {
      if services.orders.mark_order_item_paid(order_item_id, existing.id).await? {
        info!(%order_item_id, payout_id = %existing.id, "Flagged order item paid for a previously recorded payout.");
      }
      Err(PayoutError::AlreadyPaid {
        order_item_id,
        existing: Some(Box::new(existing)),
      })
    }
    (true, active) => {
      let existing = match (active, item.payout_id) {
        (Some(p), _) => Some(p),
        (None, Some(payout_id)) => services.payouts.get_payout(payout_id).await?,
        (None, None) => None,
      };
      Err(PayoutError::AlreadyPaid {
        order_item_id,
        existing: existing.map(Box::new),
      })
    }
  }
}

pub(crate) async fn check_account_ready(ctx: Ctx) -> StepResult {
  let services = ctx.read().services.clone();
  let item = produced(&ctx.read().order_item, "order item")?;

  let account = services.accounts.get_account_by_seller(item.seller_id).await?;
  match account {
    Some(account) if account.status.is_ready() => {
      ctx.write().account = Some(account);
      Ok(PipelineControl::Continue)
    }
    Some(account) => Err(PayoutError::AccountNotReady {
      seller_id: item.seller_id,
      status: account.status,
    }),
    None => Err(PayoutError::AccountNotReady {
      seller_id: item.seller_id,
      status: AccountStatus::None,
    }),
  }
}

/// Recomputes the preview from the current schedule; earlier previews shown
/// to the operator are never reused.
pub(crate) async fn compute_settlement(ctx: Ctx) -> StepResult {
  let services = ctx.read().services.clone();
  let item = produced(&ctx.read().order_item, "order item")?;

  let schedule = CommissionSchedule::from_rates(services.rates.commission_rates().await?)?;
  let preview = SettlementCalculator::new(&schedule, &services.config).preview(&item)?;
  info!(
    order_item_id = %item.id,
    net_payout = %preview.transfer_amount(),
    commission_found = preview.commission_found,
    "Settlement computed."
  );
  ctx.write().preview = Some(preview);
  Ok(PipelineControl::Continue)
}

pub(crate) async fn dispatch_transfer(ctx: Ctx) -> StepResult {
  let (services, order_item_id, item, account, preview) = {
    let guard = ctx.read();
    (
      guard.services.clone(),
      guard.order_item_id,
      produced(&guard.order_item, "order item")?,
      produced(&guard.account, "connected account")?,
      produced(&guard.preview, "settlement preview")?,
    )
  };

  let request = TransferRequest {
    account_id: account.external_account_id.clone(),
    amount: preview.transfer_amount(),
    currency: preview.currency.clone(),
    idempotency_key: order_item_id.to_string(),
    description: payout_description(order_item_id),
  };

  match services.processor.transfer(request).await {
    Ok(receipt) if receipt.status.is_failed() => {
      let message = format!("transfer {} was reported as failed", receipt.transfer_id);
      record_failed_attempt(&services, &preview, item.seller_id, Some(&receipt)).await;
      Err(PayoutError::Processor {
        retryable: false,
        message,
      })
    }
    Ok(receipt) => {
      info!(%order_item_id, transfer_id = %receipt.transfer_id, status = %receipt.status, "Transfer accepted.");
      ctx.write().receipt = Some(receipt);
      Ok(PipelineControl::Continue)
    }
    Err(e) => {
      warn!(%order_item_id, error = %e, retryable = e.is_retryable(), "Transfer failed.");
      record_failed_attempt(&services, &preview, item.seller_id, None).await;
      Err(e.into())
    }
  }
}

/// Failed attempts are audit records only. Losing one is logged, never
/// allowed to mask the processor error that caused it.
async fn record_failed_attempt(
  services: &PayoutServices,
  preview: &SettlementPreview,
  seller_id: Uuid,
  receipt: Option<&TransferReceipt>,
) {
  let mut payout = Payout::failed_attempt(
    preview,
    seller_id,
    payout_description(preview.order_item_id),
    Utc::now(),
  );
  payout.transfer_id = receipt.map(|r| r.transfer_id.clone());
  if let Err(e) = services.payouts.insert_payout(payout).await {
    error!(order_item_id = %preview.order_item_id, error = %e, "Could not record failed payout attempt.");
  }
}

pub(crate) async fn record_payout(ctx: Ctx) -> StepResult {
  let (services, order_item_id, item, preview, receipt) = {
    let guard = ctx.read();
    (
      guard.services.clone(),
      guard.order_item_id,
      produced(&guard.order_item, "order item")?,
      produced(&guard.preview, "settlement preview")?,
      guard.receipt.clone(),
    )
  };

  let payout = Payout::settled(
    &preview,
    item.seller_id,
    receipt.as_ref(),
    payout_description(order_item_id),
    Utc::now(),
  );

  match services.payouts.insert_payout(payout).await {
    Ok(stored) => {
      info!(%order_item_id, payout_id = %stored.id, status = %stored.status, net_amount = %stored.net_amount, "Payout recorded.");
      ctx.write().payout = Some(stored);
      Ok(PipelineControl::Continue)
    }
    Err(StoreError::Conflict(_)) => {
      let existing = services.payouts.find_active_payout_for_item(order_item_id).await?;
      info!(%order_item_id, "Lost the race to record the payout; another request settled the item.");
      Err(PayoutError::AlreadyPaid {
        order_item_id,
        existing: existing.map(Box::new),
      })
    }
    Err(source) => Err(not_recorded(order_item_id, receipt.as_ref(), source)),
  }
}

pub(crate) async fn mark_order_item_paid(ctx: Ctx) -> StepResult {
  let (services, order_item_id, payout, receipt) = {
    let guard = ctx.read();
    (
      guard.services.clone(),
      guard.order_item_id,
      produced(&guard.payout, "payout")?,
      guard.receipt.clone(),
    )
  };

  match services.orders.mark_order_item_paid(order_item_id, payout.id).await {
    Ok(true) => Ok(PipelineControl::Continue),
    Ok(false) => {
      warn!(%order_item_id, payout_id = %payout.id, "Order item was already flagged paid.");
      Ok(PipelineControl::Continue)
    }
    Err(source) => Err(not_recorded(order_item_id, receipt.as_ref(), source)),
  }
}

/// After a transfer went through, a failed local write is a partial failure
/// that retry or reconciliation must repair.
fn not_recorded(order_item_id: Uuid, receipt: Option<&TransferReceipt>, source: StoreError) -> PayoutError {
  match receipt {
    Some(receipt) => {
      error!(%order_item_id, transfer_id = %receipt.transfer_id, error = %source, "Transfer accepted but not recorded locally.");
      PayoutError::TransferNotRecorded {
        order_item_id,
        transfer_id: receipt.transfer_id.clone(),
        source,
      }
    }
    None => PayoutError::Storage(source),
  }
}

/// `true` when nothing would move; the transfer step is skipped.
pub(crate) fn nothing_to_transfer(data: &PayoutCtxData) -> bool {
  data.transfer_amount().map_or(false, |amount| amount.is_zero())
}
