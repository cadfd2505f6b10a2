// tests/session_tests.rs
mod common;

use common::*;
use laundrify::order::{CourierService, FulfillmentRoute};
use laundrify::realtime::{ChannelFeed, Effect};
use laundrify::{LaundrifyError, LiveOrders, OrderLifecycle, OrderStatus, Partition};
use serial_test::serial;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use uuid::Uuid;

struct Harness {
  shop: Uuid,
  store: Arc<MemoryOrderStore>,
  feed: Arc<ChannelFeed>,
  alerts: Arc<RecordingAlerts>,
  live: LiveOrders,
}

fn harness(orders: impl FnOnce(Uuid) -> Vec<laundrify::Order>) -> Harness {
  let shop = Uuid::new_v4();
  let store = Arc::new(MemoryOrderStore::with_orders(orders(shop)));
  let feed = Arc::new(ChannelFeed::new());
  let alerts = Arc::new(RecordingAlerts::default());
  let live = LiveOrders::new(shop, store.clone(), feed.clone(), alerts.clone());
  Harness {
    shop,
    store,
    feed,
    alerts,
    live,
  }
}

#[tokio::test]
#[serial]
async fn focus_subscribes_once_and_fetches_each_time() {
  setup_tracing();
  let mut h = harness(|shop| vec![order(shop, OrderStatus::Received), order(shop, OrderStatus::PickedUp)]);

  h.live.focus().await.unwrap();
  h.live.focus().await.unwrap();

  assert!(h.live.is_subscribed());
  assert_eq!(h.feed.subscriber_count(), 1);
  assert_eq!(h.store.list_calls.load(Ordering::SeqCst), 2);
  assert_eq!(h.live.view().orders().len(), 1);

  h.live.blur();
  assert!(!h.live.is_subscribed());
  assert_eq!(h.feed.subscriber_count(), 0);
}

#[tokio::test]
#[serial]
async fn delivered_paid_event_plays_alert_and_shows_notice() {
  setup_tracing();
  let mut h = harness(|_| Vec::new());
  h.live.focus().await.unwrap();

  let paid = order(h.shop, OrderStatus::Paid);
  let event = update_event(&paid, Some("received"));
  assert_eq!(h.feed.publish(&event), 1);
  assert_eq!(h.feed.publish(&event), 1);

  let effects = h.live.next_event().await.unwrap();
  assert!(effects.contains(&Effect::PlayAlert));
  let redelivered = h.live.next_event().await.unwrap();
  assert!(redelivered.is_empty());

  assert_eq!(h.alerts.sound_count(), 1);
  assert_eq!(h.alerts.notices.lock().len(), 1);
  assert_eq!(h.live.view().orders()[0].id, paid.id);
}

#[tokio::test]
#[serial]
async fn events_for_other_shops_are_not_delivered() {
  setup_tracing();
  let mut h = harness(|_| Vec::new());
  h.live.focus().await.unwrap();

  let foreign = order(Uuid::new_v4(), OrderStatus::Paid);
  assert_eq!(h.feed.publish(&update_event(&foreign, Some("received"))), 0);
  h.live.blur();
  assert!(h.live.next_event().await.is_none());
}

#[tokio::test]
#[serial]
async fn advance_moves_ready_order_out_of_ongoing() {
  setup_tracing();
  let mut h = harness(|shop| vec![order(shop, OrderStatus::Processing)]);
  h.live.focus().await.unwrap();
  let order_id = h.live.view().orders()[0].id;
  let lifecycle = OrderLifecycle::new(h.store.clone(), Arc::new(RecordingNotifier::default()));

  let advanced = h.live.advance(&lifecycle, order_id, OrderStatus::Ready).await.unwrap();

  assert_eq!(advanced.order.status, OrderStatus::Ready);
  assert!(advanced.needs_fulfillment_choice());
  assert!(h.live.view().order(order_id).is_none());
  assert_eq!(h.store.status_of(order_id), Some(OrderStatus::Ready));

  let err = h.live.advance(&lifecycle, order_id, OrderStatus::PickedUp).await.unwrap_err();
  assert!(matches!(err, LaundrifyError::NotFound(_)));
}

#[tokio::test]
#[serial]
async fn fulfillment_choice_switches_to_completed() {
  setup_tracing();
  let mut h = harness(|shop| vec![order(shop, OrderStatus::Ready), order(shop, OrderStatus::Processing)]);
  h.live.focus().await.unwrap();

  let link = h
    .live
    .choose_fulfillment(FulfillmentRoute::Courier(CourierService::Uber))
    .await
    .unwrap();

  assert_eq!(link, Some("https://m.uber.com/ul/"));
  assert_eq!(h.live.view().partition(), Partition::Completed);
  assert_eq!(h.live.view().orders().len(), 1);

  let pickup = h.live.choose_fulfillment(FulfillmentRoute::CustomerPickup).await.unwrap();
  assert_eq!(pickup, None);
}

#[tokio::test]
#[serial]
async fn failed_refresh_keeps_the_current_list() {
  setup_tracing();
  let mut h = harness(|shop| vec![order(shop, OrderStatus::Paid)]);
  h.live.focus().await.unwrap();
  *h.store.fail_lists.lock() = Some("offline".to_string());

  assert!(h.live.refresh().await.is_err());
  assert_eq!(h.live.view().orders().len(), 1);
}
