// tests/ledger_tests.rs
mod common;

use chrono::{Duration, Utc};
use common::*;
use payout_engine::{
  AccountStatus, DateRange, FulfillmentStatus, PayoutFilter, PayoutLedger, PayoutStatus, ProcessorError,
};
use rust_decimal::Decimal;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_stats_total_equals_sum_of_persisted_non_failed_amounts() {
  let h = harness();
  h.seed_rate("Core Drill Bits", "10");
  h.seed_rate("Safety Gloves", "12.5");
  let orchestrator = h.orchestrator();

  let items = vec![
    h.seed_item("Core Drill Bits", "100.00", 2, FulfillmentStatus::Shipped),
    h.seed_item("Safety Gloves", "19.99", 3, FulfillmentStatus::Shipped),
    h.seed_item("Unlisted Category", "7.45", 1, FulfillmentStatus::Shipped),
  ];
  for item in &items {
    h.seed_account(item.seller_id, AccountStatus::Ready);
  }
  // One failed attempt that must stay out of the totals.
  h.processor.fail_next_transfer(ProcessorError::Unavailable("timeout".into()));
  assert!(orchestrator.request_payout(items[0].id).await.is_err());
  for item in &items {
    orchestrator.request_payout(item.id).await.unwrap();
  }

  let ledger = PayoutLedger::new(h.services.clone());
  let now = Utc::now();
  let range = DateRange::new(now - Duration::hours(1), now + Duration::hours(1)).unwrap();
  let stats = ledger.payout_stats(range, None).await.unwrap();

  let history = ledger.payout_history(PayoutFilter::default()).await.unwrap();
  let expected_total: Decimal = history
    .iter()
    .filter(|p| !p.status.is_failed())
    .map(|p| p.amount)
    .sum();
  let expected_fees: Decimal = history
    .iter()
    .filter(|p| !p.status.is_failed())
    .map(|p| p.fee_amount)
    .sum();

  assert_eq!(history.len(), 4);
  assert_eq!(stats.count, 3);
  assert_eq!(stats.total_amount, expected_total);
  assert_eq!(stats.total_fees, expected_fees);
  assert_eq!(stats.previous_count, 0);
  assert_eq!(stats.trend_percent, None);
  let failed = stats
    .by_status
    .iter()
    .find(|s| s.status == PayoutStatus::Failed)
    .unwrap();
  assert_eq!(failed.count, 1);
  assert_eq!(stats.top_sellers.len(), 3);
  assert_eq!(stats.top_sellers[0].seller_id, items[0].seller_id);
}

#[tokio::test]
#[serial]
async fn test_history_filters_and_orders_newest_first() {
  let h = harness();
  h.seed_rate("Core Drill Bits", "10");
  let orchestrator = h.orchestrator();

  let mut seller_ids = Vec::new();
  for _ in 0..3 {
    let item = h.seed_item("Core Drill Bits", "10.00", 1, FulfillmentStatus::Shipped);
    h.seed_account(item.seller_id, AccountStatus::Ready);
    orchestrator.request_payout(item.id).await.unwrap();
    seller_ids.push(item.seller_id);
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
  }

  let ledger = PayoutLedger::new(h.services.clone());
  let all = ledger.payout_history(PayoutFilter::default()).await.unwrap();
  assert_eq!(all.len(), 3);
  assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));
  assert_eq!(all[0].seller_id, seller_ids[2]);

  let one_seller = ledger
    .payout_history(PayoutFilter {
      seller_id: Some(seller_ids[1]),
      ..PayoutFilter::default()
    })
    .await
    .unwrap();
  assert_eq!(one_seller.len(), 1);

  let page = ledger
    .payout_history(PayoutFilter {
      limit: Some(1),
      offset: 1,
      ..PayoutFilter::default()
    })
    .await
    .unwrap();
  assert_eq!(page.len(), 1);
  assert_eq!(page[0].seller_id, seller_ids[1]);
}
