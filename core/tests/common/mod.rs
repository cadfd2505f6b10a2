// tests/common/mod.rs
#![allow(dead_code)] // Each test binary uses a different subset of these helpers

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use laundrify::notify::{AlertSink, CustomerNotifier, Notice, PermissionStatus, PushRegistrar};
use laundrify::profile::{BankDetails, ShopProfile, SubaccountCreated, SubaccountGateway, SubaccountRequest};
use laundrify::realtime::{ChangeKind, RealtimeEvent};
use laundrify::{LaundrifyError, LaundrifyResult, Order, OrderStatus, Partition, PaymentLedger, ProfileStore};
use laundrify::{OrderStore, PaymentMethod, PaymentStatus};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::Level;
use uuid::Uuid;

// --- Fixtures ---

pub fn order(laundry_id: Uuid, status: OrderStatus) -> Order {
  Order {
    id: Uuid::new_v4(),
    laundry_id,
    customer_name: Some("Ada".to_string()),
    customer_phone: Some("08031234567".to_string()),
    customer_address: Some("12 Allen Avenue, Ikeja".to_string()),
    items_summary: Some("3x Shirt, 1x Duvet".to_string()),
    total_price: Decimal::new(450_000, 2),
    currency_code: Some("NGN".to_string()),
    payment_method: PaymentMethod::Gateway("flutterwave".to_string()),
    payment_status: PaymentStatus::Paid,
    status,
    created_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
  }
}

fn row(order: &Order) -> Map<String, Value> {
  match serde_json::to_value(order).unwrap() {
    Value::Object(map) => map,
    other => panic!("order serialized to {other}"),
  }
}

/// An UPDATE on `orders` whose old snapshot carries `old_status` and whose new
/// snapshot is the full row of `order`.
pub fn update_event(order: &Order, old_status: Option<&str>) -> RealtimeEvent {
  let mut old = Map::new();
  old.insert("id".to_string(), json!(order.id));
  if let Some(status) = old_status {
    old.insert("status".to_string(), json!(status));
  }
  RealtimeEvent {
    schema: "public".to_string(),
    table: "orders".to_string(),
    event_type: ChangeKind::Update,
    commit_timestamp: Some(Utc::now()),
    old,
    new: row(order),
  }
}

// --- In-memory order store ---

#[derive(Default)]
pub struct MemoryOrderStore {
  pub orders: Mutex<HashMap<Uuid, Order>>,
  pub update_calls: AtomicUsize,
  pub list_calls: AtomicUsize,
  pub fail_updates: Mutex<Option<String>>,
  pub fail_lists: Mutex<Option<String>>,
}

impl MemoryOrderStore {
  pub fn with_orders(orders: impl IntoIterator<Item = Order>) -> Self {
    let store = Self::default();
    store.orders.lock().extend(orders.into_iter().map(|o| (o.id, o)));
    store
  }

  pub fn status_of(&self, order_id: Uuid) -> Option<OrderStatus> {
    self.orders.lock().get(&order_id).map(|o| o.status)
  }

  /// Simulates another writer changing the row behind our back.
  pub fn force_status(&self, order_id: Uuid, status: OrderStatus) {
    if let Some(order) = self.orders.lock().get_mut(&order_id) {
      order.status = status;
    }
  }

  pub fn insert(&self, order: Order) {
    self.orders.lock().insert(order.id, order);
  }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
  async fn list_orders(&self, laundry_id: Uuid, partition: Partition) -> LaundrifyResult<Vec<Order>> {
    self.list_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(msg) = self.fail_lists.lock().clone() {
      return Err(LaundrifyError::remote("list_orders", anyhow::anyhow!(msg)));
    }
    let mut orders: Vec<Order> = self
      .orders
      .lock()
      .values()
      .filter(|o| o.laundry_id == laundry_id && partition.statuses().contains(&o.status))
      .cloned()
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders)
  }

  async fn update_status(&self, order_id: Uuid, from: OrderStatus, to: OrderStatus) -> LaundrifyResult<bool> {
    self.update_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(msg) = self.fail_updates.lock().clone() {
      return Err(LaundrifyError::remote("update_status", anyhow::anyhow!(msg)));
    }
    let mut orders = self.orders.lock();
    match orders.get_mut(&order_id) {
      Some(order) if order.status == from => {
        order.status = to;
        Ok(true)
      }
      _ => Ok(false),
    }
  }
}

// --- Payment ledger ---

#[derive(Default)]
pub struct RecordingLedger {
  pub paid: Mutex<Vec<Uuid>>,
  pub fail_with: Mutex<Option<String>>,
}

impl RecordingLedger {
  pub fn calls(&self) -> usize {
    self.paid.lock().len()
  }
}

#[async_trait]
impl PaymentLedger for RecordingLedger {
  async fn mark_paid(&self, order_id: Uuid) -> LaundrifyResult<u64> {
    self.paid.lock().push(order_id);
    if let Some(msg) = self.fail_with.lock().clone() {
      return Err(LaundrifyError::remote("mark_paid", anyhow::anyhow!(msg)));
    }
    Ok(1)
  }
}

// --- Notifier and alert sink ---

#[derive(Default)]
pub struct RecordingNotifier {
  pub notified: Mutex<Vec<(Uuid, OrderStatus)>>,
  pub fail_with: Mutex<Option<String>>,
}

#[async_trait]
impl CustomerNotifier for RecordingNotifier {
  async fn notify_status_change(&self, order: &Order) -> LaundrifyResult<()> {
    if let Some(msg) = self.fail_with.lock().clone() {
      return Err(LaundrifyError::remote("notify_status_change", anyhow::anyhow!(msg)));
    }
    self.notified.lock().push((order.id, order.status));
    Ok(())
  }
}

#[derive(Default)]
pub struct RecordingAlerts {
  pub sounds: AtomicUsize,
  pub notices: Mutex<Vec<Notice>>,
}

impl RecordingAlerts {
  pub fn sound_count(&self) -> usize {
    self.sounds.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl AlertSink for RecordingAlerts {
  async fn play_alert(&self) -> LaundrifyResult<()> {
    self.sounds.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }

  async fn show_notice(&self, notice: &Notice) -> LaundrifyResult<()> {
    self.notices.lock().push(notice.clone());
    Ok(())
  }
}

// --- Profiles, push and payouts ---

#[derive(Default)]
pub struct MemoryProfiles {
  pub profiles: Mutex<HashMap<Uuid, ShopProfile>>,
  pub push_tokens: Mutex<HashMap<Uuid, Option<String>>>,
  pub bank_details: Mutex<HashMap<Uuid, BankDetails>>,
  pub saves: AtomicUsize,
}

#[async_trait]
impl ProfileStore for MemoryProfiles {
  async fn load_profile(&self, owner_id: Uuid) -> LaundrifyResult<ShopProfile> {
    self
      .profiles
      .lock()
      .values()
      .find(|p| p.owner_id == owner_id)
      .cloned()
      .ok_or_else(|| LaundrifyError::NotFound(format!("Shop profile for owner {owner_id}")))
  }

  async fn save_profile(&self, profile: &ShopProfile) -> LaundrifyResult<()> {
    self.saves.fetch_add(1, Ordering::SeqCst);
    self.profiles.lock().insert(profile.id, profile.clone());
    Ok(())
  }

  async fn set_push_token(&self, laundry_id: Uuid, token: Option<&str>) -> LaundrifyResult<()> {
    self.push_tokens.lock().insert(laundry_id, token.map(str::to_string));
    Ok(())
  }

  async fn save_bank_details(&self, laundry_id: Uuid, bank: &BankDetails) -> LaundrifyResult<()> {
    self.bank_details.lock().insert(laundry_id, bank.clone());
    Ok(())
  }
}

pub struct FakeRegistrar {
  pub physical: bool,
  pub status: PermissionStatus,
  pub grant_on_request: bool,
  pub requests: AtomicUsize,
}

impl FakeRegistrar {
  pub fn granted() -> Self {
    Self {
      physical: true,
      status: PermissionStatus::Granted,
      grant_on_request: false,
      requests: AtomicUsize::new(0),
    }
  }
}

#[async_trait]
impl PushRegistrar for FakeRegistrar {
  fn is_physical_device(&self) -> bool {
    self.physical
  }

  async fn permission_status(&self) -> PermissionStatus {
    self.status
  }

  async fn request_permission(&self) -> PermissionStatus {
    self.requests.fetch_add(1, Ordering::SeqCst);
    if self.grant_on_request {
      PermissionStatus::Granted
    } else {
      PermissionStatus::Denied
    }
  }

  async fn device_token(&self) -> LaundrifyResult<String> {
    Ok("ExponentPushToken[test-device]".to_string())
  }
}

#[derive(Default)]
pub struct FakeGateway {
  pub requests: Mutex<Vec<SubaccountRequest>>,
  pub reject_with: Mutex<Option<String>>,
}

#[async_trait]
impl SubaccountGateway for FakeGateway {
  async fn create_subaccount(&self, request: &SubaccountRequest) -> LaundrifyResult<SubaccountCreated> {
    self.requests.lock().push(request.clone());
    if let Some(msg) = self.reject_with.lock().clone() {
      return Err(LaundrifyError::Validation(msg));
    }
    Ok(SubaccountCreated {
      subaccount_id: "RS_TEST123".to_string(),
    })
  }
}

// --- Helper for Tracing Setup ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
