// payout_engine/src/reconcile.rs

//! Processor-side transfers vs. local payout records.
//!
//! Repairs the partial failure where the processor accepted a transfer but
//! the payout was never recorded (or the order item never flagged paid).
//! Anything that cannot be repaired with certainty is reported, not fixed.

use crate::commission::CommissionSchedule;
use crate::error::{PayoutError, StoreError};
use crate::model::Payout;
use crate::money::round_money;
use crate::ports::{PayoutServices, TransferReceipt};
use crate::settlement::SettlementCalculator;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscrepancyKind {
  /// The idempotency key is not an order item id.
  UnknownIdempotencyKey { idempotency_key: String },
  OrderItemMissing,
  /// The transferred amount differs from what the item settles to today.
  AmountMismatch { expected: Decimal, transferred: Decimal },
  CurrencyMismatch { expected: String, transferred: String },
  /// The item already has an active payout backed by another transfer.
  DuplicateTransfer { existing_payout_id: Uuid },
  /// The order item's own data cannot be settled (empty category, negative price...).
  InvalidOrderItem { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
  pub transfer_id: String,
  pub order_item_id: Option<Uuid>,
  #[serde(flatten)]
  pub kind: DiscrepancyKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
  pub since: DateTime<Utc>,
  /// Transfers returned by the processor.
  pub checked: u64,
  /// Transfers with a consistent local record.
  pub matched: u64,
  /// Transfers whose payout was recorded or whose order item was flagged by this run.
  pub repaired: u64,
  /// Failed transfers without a local record; no money moved.
  pub skipped: u64,
  pub unresolved: Vec<Discrepancy>,
}

enum Outcome {
  Matched,
  Repaired,
  Skipped,
  Unresolved(Discrepancy),
}

#[derive(Debug, Clone)]
pub struct Reconciler {
  services: PayoutServices,
}

impl Reconciler {
  pub fn new(services: PayoutServices) -> Self {
    Self { services }
  }

  /// Checks every transfer the processor created at or after `since`.
  /// Running it twice over the same window repairs nothing the second time.
  #[instrument(name = "Reconciler::reconcile", skip(self), err(Display))]
  pub async fn reconcile(&self, since: DateTime<Utc>) -> Result<ReconciliationReport, PayoutError> {
    let transfers = self.services.processor.list_transfers(since).await?;
    let schedule = CommissionSchedule::from_rates(self.services.rates.commission_rates().await?)?;

    let mut report = ReconciliationReport {
      since,
      checked: 0,
      matched: 0,
      repaired: 0,
      skipped: 0,
      unresolved: Vec::new(),
    };

    for receipt in &transfers {
      report.checked += 1;
      match self.check_transfer(receipt, &schedule).await? {
        Outcome::Matched => report.matched += 1,
        Outcome::Repaired => report.repaired += 1,
        Outcome::Skipped => report.skipped += 1,
        Outcome::Unresolved(discrepancy) => {
          warn!(
            transfer_id = %discrepancy.transfer_id,
            order_item_id = ?discrepancy.order_item_id,
            kind = ?discrepancy.kind,
            "Unresolved transfer discrepancy."
          );
          report.unresolved.push(discrepancy);
        }
      }
    }

    info!(
      checked = report.checked,
      matched = report.matched,
      repaired = report.repaired,
      unresolved = report.unresolved.len(),
      "Reconciliation finished."
    );
    Ok(report)
  }

  async fn check_transfer(&self, receipt: &TransferReceipt, schedule: &CommissionSchedule) -> Result<Outcome, PayoutError> {
    let transfer_id = receipt.transfer_id.clone();
    let unresolved = |order_item_id: Option<Uuid>, kind: DiscrepancyKind| {
      Outcome::Unresolved(Discrepancy {
        transfer_id: transfer_id.clone(),
        order_item_id,
        kind,
      })
    };

    let Ok(order_item_id) = Uuid::parse_str(&receipt.idempotency_key) else {
      return Ok(unresolved(
        None,
        DiscrepancyKind::UnknownIdempotencyKey {
          idempotency_key: receipt.idempotency_key.clone(),
        },
      ));
    };

    if let Some(local) = self.services.payouts.get_payout_by_transfer(&receipt.transfer_id).await? {
      return self.ensure_flagged(&local).await;
    }
    if receipt.status.is_failed() {
      return Ok(Outcome::Skipped);
    }

    let Some(item) = self.services.orders.get_order_item(order_item_id).await? else {
      return Ok(unresolved(Some(order_item_id), DiscrepancyKind::OrderItemMissing));
    };
    if let Some(existing) = self.services.payouts.find_active_payout_for_item(order_item_id).await? {
      return Ok(unresolved(
        Some(order_item_id),
        DiscrepancyKind::DuplicateTransfer {
          existing_payout_id: existing.id,
        },
      ));
    }

    let preview = match SettlementCalculator::new(schedule, &self.services.config).preview(&item) {
      Ok(preview) => preview,
      Err(PayoutError::InvalidInput(reason)) => {
        return Ok(unresolved(Some(order_item_id), DiscrepancyKind::InvalidOrderItem { reason }));
      }
      Err(e) => return Err(e),
    };
    let transferred = round_money(receipt.amount);
    if preview.transfer_amount() != transferred {
      return Ok(unresolved(
        Some(order_item_id),
        DiscrepancyKind::AmountMismatch {
          expected: preview.transfer_amount(),
          transferred,
        },
      ));
    }
    if preview.currency != receipt.currency {
      return Ok(unresolved(
        Some(order_item_id),
        DiscrepancyKind::CurrencyMismatch {
          expected: preview.currency.clone(),
          transferred: receipt.currency.clone(),
        },
      ));
    }

    let payout = Payout::settled(
      &preview,
      item.seller_id,
      Some(receipt),
      format!("Reconciled payout for order item {}", order_item_id),
      Utc::now(),
    );
    let payout = match self.services.payouts.insert_payout(payout).await {
      Ok(payout) => payout,
      Err(StoreError::Conflict(_)) => {
        // Recorded concurrently by a retried request.
        return match self.services.payouts.find_active_payout_for_item(order_item_id).await? {
          Some(existing) if existing.transfer_id.as_deref() == Some(receipt.transfer_id.as_str()) => {
            self.ensure_flagged(&existing).await
          }
          Some(existing) => Ok(unresolved(
            Some(order_item_id),
            DiscrepancyKind::DuplicateTransfer {
              existing_payout_id: existing.id,
            },
          )),
          None => Err(StoreError::Conflict(format!("payout for order item {}", order_item_id)).into()),
        };
      }
      Err(e) => return Err(e.into()),
    };
    self.services.orders.mark_order_item_paid(order_item_id, payout.id).await?;
    info!(%order_item_id, payout_id = %payout.id, transfer_id = %receipt.transfer_id, "Recorded missing payout for accepted transfer.");
    Ok(Outcome::Repaired)
  }

  /// A recorded, non-failed payout whose item was never flagged gets flagged now.
  async fn ensure_flagged(&self, payout: &Payout) -> Result<Outcome, PayoutError> {
    if payout.status.is_failed() {
      return Ok(Outcome::Matched);
    }
    let item = self.services.orders.get_order_item(payout.order_item_id).await?;
    match item {
      Some(item) if !item.seller_paid => {
        if self.services.orders.mark_order_item_paid(item.id, payout.id).await? {
          info!(order_item_id = %item.id, payout_id = %payout.id, "Flagged order item paid for a recorded payout.");
          return Ok(Outcome::Repaired);
        }
        Ok(Outcome::Matched)
      }
      _ => Ok(Outcome::Matched),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn discrepancies_serialize_flat_with_kind_tag() {
    let item = Uuid::nil();
    let discrepancy = Discrepancy {
      transfer_id: "tr_9".to_string(),
      order_item_id: Some(item),
      kind: DiscrepancyKind::AmountMismatch {
        expected: Decimal::new(17_930, 2),
        transferred: Decimal::new(18_000, 2),
      },
    };
    assert_eq!(
      serde_json::to_value(&discrepancy).unwrap(),
      json!({
        "transfer_id": "tr_9",
        "order_item_id": item,
        "kind": "amount_mismatch",
        "expected": "179.30",
        "transferred": "180.00",
      })
    );
  }
}
