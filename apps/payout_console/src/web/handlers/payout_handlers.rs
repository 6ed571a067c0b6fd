// apps/payout_console/src/web/handlers/payout_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Duration, Utc};
use payout_engine::{DateRange, PayoutFilter, PayoutStatus};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

const DEFAULT_STATS_DAYS: i64 = 30;
const DEFAULT_RECONCILE_HOURS: i64 = 24;

#[derive(Deserialize, Debug, Default)]
pub struct ListPayoutsQuery {
  pub seller_id: Option<Uuid>,
  pub status: Option<PayoutStatus>,
  pub order_item_id: Option<Uuid>,
  pub from: Option<DateTime<Utc>>,
  pub to: Option<DateTime<Utc>>,
  pub limit: Option<u32>,
  pub offset: Option<u32>,
}

impl From<ListPayoutsQuery> for PayoutFilter {
  fn from(query: ListPayoutsQuery) -> Self {
    PayoutFilter {
      seller_id: query.seller_id,
      status: query.status,
      order_item_id: query.order_item_id,
      created_from: query.from,
      created_to: query.to,
      limit: query.limit,
      offset: query.offset.unwrap_or(0),
    }
    .paginated()
  }
}

#[instrument(name = "handler::list_payouts", skip(app_state))]
pub async fn list_payouts_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ListPayoutsQuery>,
) -> Result<HttpResponse, AppError> {
  let payouts = app_state.ledger.payout_history(query.into_inner().into()).await?;
  info!(count = payouts.len(), "Payout history fetched.");
  Ok(HttpResponse::Ok().json(payouts))
}

#[derive(Deserialize, Debug)]
pub struct StatsQuery {
  pub from: Option<DateTime<Utc>>,
  pub to: Option<DateTime<Utc>>,
  pub seller_id: Option<Uuid>,
}

impl StatsQuery {
  /// Defaults to the last 30 days ending now.
  fn range(&self, now: DateTime<Utc>) -> Result<DateRange, AppError> {
    let end = self.to.unwrap_or(now);
    let start = self.from.unwrap_or(end - Duration::days(DEFAULT_STATS_DAYS));
    Ok(DateRange::new(start, end)?)
  }
}

#[instrument(name = "handler::payout_stats", skip(app_state))]
pub async fn payout_stats_handler(
  app_state: web::Data<AppState>,
  query: web::Query<StatsQuery>,
) -> Result<HttpResponse, AppError> {
  let range = query.range(Utc::now())?;
  let stats = app_state.ledger.payout_stats(range, query.seller_id).await?;
  Ok(HttpResponse::Ok().json(stats))
}

#[derive(Deserialize, Debug)]
pub struct ReconcileQuery {
  pub since: Option<DateTime<Utc>>,
}

#[instrument(name = "handler::reconcile_payouts", skip(app_state))]
pub async fn reconcile_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ReconcileQuery>,
) -> Result<HttpResponse, AppError> {
  let since = query
    .since
    .unwrap_or_else(|| Utc::now() - Duration::hours(DEFAULT_RECONCILE_HOURS));
  let report = app_state.reconciler.reconcile(since).await?;
  info!(
    checked = report.checked,
    repaired = report.repaired,
    unresolved = report.unresolved.len(),
    "Reconciliation finished."
  );
  Ok(HttpResponse::Ok().json(report))
}
