// payout_engine/src/ledger.rs

//! Read-only payout history and statistics. Pure aggregation over persisted
//! payout records; no business rules beyond grouping and summing.

use crate::error::PayoutError;
use crate::model::{Payout, PayoutStatus};
use crate::money::round_money;
use crate::ports::PayoutServices;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

pub const DEFAULT_HISTORY_LIMIT: u32 = 50;
pub const MAX_HISTORY_LIMIT: u32 = 500;
pub const TOP_SELLERS_LIMIT: usize = 10;

/// Selection over persisted payouts. `limit == None` means unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutFilter {
  pub seller_id: Option<Uuid>,
  pub status: Option<PayoutStatus>,
  pub order_item_id: Option<Uuid>,
  /// Inclusive.
  pub created_from: Option<DateTime<Utc>>,
  /// Exclusive.
  pub created_to: Option<DateTime<Utc>>,
  pub limit: Option<u32>,
  pub offset: u32,
}

impl PayoutFilter {
  /// Predicate part of the filter; pagination is applied by the store.
  pub fn matches(&self, payout: &Payout) -> bool {
    self.seller_id.map_or(true, |id| payout.seller_id == id)
      && self.status.map_or(true, |s| payout.status == s)
      && self.order_item_id.map_or(true, |id| payout.order_item_id == id)
      && self.created_from.map_or(true, |from| payout.created_at >= from)
      && self.created_to.map_or(true, |to| payout.created_at < to)
  }

  /// Applies the history page size rules (default 50, at most 500).
  pub fn paginated(mut self) -> Self {
    self.limit = Some(self.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT));
    self
  }
}

/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
  pub start: DateTime<Utc>,
  pub end: DateTime<Utc>,
}

impl DateRange {
  pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, PayoutError> {
    if start >= end {
      return Err(PayoutError::InvalidInput(format!(
        "range start {} must be before end {}",
        start, end
      )));
    }
    Ok(Self { start, end })
  }

  /// The equally long range immediately before this one.
  pub fn previous(&self) -> Self {
    let length = self.end - self.start;
    Self {
      start: self.start - length,
      end: self.start,
    }
  }

  pub fn contains(&self, at: DateTime<Utc>) -> bool {
    at >= self.start && at < self.end
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
  pub status: PayoutStatus,
  pub count: u64,
  pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SellerVolume {
  pub seller_id: Uuid,
  pub count: u64,
  pub amount: Decimal,
}

/// Summary of one period. Totals cover non-failed payouts only; failed
/// attempts show up in `by_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayoutStats {
  pub range: DateRange,
  pub seller_id: Option<Uuid>,
  pub total_amount: Decimal,
  pub total_net_amount: Decimal,
  pub total_fees: Decimal,
  pub count: u64,
  pub previous_total_amount: Decimal,
  pub previous_count: u64,
  /// Percent change against the previous period; `None` when that period had no volume.
  pub trend_percent: Option<Decimal>,
  pub by_status: Vec<StatusBreakdown>,
  pub top_sellers: Vec<SellerVolume>,
}

/// Aggregates `payouts` for `range` and the period before it. Records outside
/// both periods, or belonging to another seller when `seller_id` is set, are ignored.
pub fn aggregate_stats(range: DateRange, seller_id: Option<Uuid>, payouts: &[Payout]) -> PayoutStats {
  let previous = range.previous();
  let relevant = payouts
    .iter()
    .filter(|p| seller_id.map_or(true, |id| p.seller_id == id));

  let mut total_amount = Decimal::ZERO;
  let mut total_net_amount = Decimal::ZERO;
  let mut total_fees = Decimal::ZERO;
  let mut count = 0_u64;
  let mut previous_total_amount = Decimal::ZERO;
  let mut previous_count = 0_u64;
  let mut by_status: HashMap<PayoutStatus, (u64, Decimal)> = HashMap::new();
  let mut by_seller: HashMap<Uuid, (u64, Decimal)> = HashMap::new();

  for payout in relevant {
    if range.contains(payout.created_at) {
      let entry = by_status.entry(payout.status).or_insert((0, Decimal::ZERO));
      entry.0 += 1;
      entry.1 += payout.amount;

      if !payout.status.is_failed() {
        total_amount += payout.amount;
        total_net_amount += payout.net_amount;
        total_fees += payout.fee_amount;
        count += 1;
        let seller = by_seller.entry(payout.seller_id).or_insert((0, Decimal::ZERO));
        seller.0 += 1;
        seller.1 += payout.amount;
      }
    } else if previous.contains(payout.created_at) && !payout.status.is_failed() {
      previous_total_amount += payout.amount;
      previous_count += 1;
    }
  }

  let trend_percent = if previous_total_amount.is_zero() {
    None
  } else {
    Some(round_money(
      (total_amount - previous_total_amount) / previous_total_amount * Decimal::ONE_HUNDRED,
    ))
  };

  let by_status = PayoutStatus::ALL
    .iter()
    .filter_map(|status| {
      by_status.get(status).map(|(count, amount)| StatusBreakdown {
        status: *status,
        count: *count,
        amount: *amount,
      })
    })
    .collect();

  let mut top_sellers: Vec<SellerVolume> = by_seller
    .into_iter()
    .map(|(seller_id, (count, amount))| SellerVolume {
      seller_id,
      count,
      amount,
    })
    .collect();
  top_sellers.sort_by(|a, b| b.amount.cmp(&a.amount).then(a.seller_id.cmp(&b.seller_id)));
  top_sellers.truncate(TOP_SELLERS_LIMIT);

  PayoutStats {
    range,
    seller_id,
    total_amount,
    total_net_amount,
    total_fees,
    count,
    previous_total_amount,
    previous_count,
    trend_percent,
    by_status,
    top_sellers,
  }
}

/// History and stats over the payout store.
#[derive(Debug, Clone)]
pub struct PayoutLedger {
  services: PayoutServices,
}

impl PayoutLedger {
  pub fn new(services: PayoutServices) -> Self {
    Self { services }
  }

  pub async fn payout_history(&self, filter: PayoutFilter) -> Result<Vec<Payout>, PayoutError> {
    Ok(self.services.payouts.list_payouts(&filter.paginated()).await?)
  }

  #[instrument(name = "PayoutLedger::payout_stats", skip(self), err(Display))]
  pub async fn payout_stats(&self, range: DateRange, seller_id: Option<Uuid>) -> Result<PayoutStats, PayoutError> {
    let filter = PayoutFilter {
      seller_id,
      created_from: Some(range.previous().start),
      created_to: Some(range.end),
      ..PayoutFilter::default()
    };
    let payouts = self.services.payouts.list_payouts(&filter).await?;
    Ok(aggregate_stats(range, seller_id, &payouts))
  }
}
