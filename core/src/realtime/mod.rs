// core/src/realtime/mod.rs

//! Server-pushed row-change events and the subscription seam that delivers them.

pub mod reconciler;
pub mod session;

use crate::error::{LaundrifyError, LaundrifyResult};
use crate::order::Order;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tokio::sync::mpsc;
use tracing::{debug, instrument};
use uuid::Uuid;

pub use reconciler::{enters_paid, reduce, Effect, OrdersView, Reduction};
pub use session::LiveOrders;

pub const ORDERS_TABLE: &str = "orders";
const SUBSCRIPTION_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
  Insert,
  Update,
  Delete,
}

/// One row mutation as delivered by the feed. Consumed once, never persisted.
///
/// `old` usually carries only the primary key unless the table replicates full
/// rows, so every accessor tolerates missing fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEvent {
  #[serde(default = "default_schema")]
  pub schema: String,
  pub table: String,
  #[serde(rename = "eventType")]
  pub event_type: ChangeKind,
  #[serde(default)]
  pub commit_timestamp: Option<DateTime<Utc>>,
  #[serde(default)]
  pub old: Map<String, Value>,
  #[serde(default)]
  pub new: Map<String, Value>,
}

fn default_schema() -> String {
  "public".to_string()
}

impl RealtimeEvent {
  pub fn old_status(&self) -> Option<&str> {
    self.old.get("status").and_then(Value::as_str)
  }

  pub fn new_status(&self) -> Option<&str> {
    self.new.get("status").and_then(Value::as_str)
  }

  pub fn laundry_id(&self) -> Option<Uuid> {
    self
      .new
      .get("laundry_id")
      .or_else(|| self.old.get("laundry_id"))
      .and_then(Value::as_str)
      .and_then(|raw| Uuid::parse_str(raw).ok())
  }

  /// The full row after the change.
  pub fn new_order(&self) -> LaundrifyResult<Order> {
    serde_json::from_value(Value::Object(self.new.clone()))
      .map_err(|e| LaundrifyError::InvalidPayload(format!("realtime row: {}", e)))
  }

  /// Identity of the old/new snapshot pair, used to recognise redeliveries.
  pub fn fingerprint(&self) -> u64 {
    let mut hasher = DefaultHasher::new();
    self.table.hash(&mut hasher);
    // serde_json maps are ordered, so equal snapshots serialize identically.
    Value::Object(self.old.clone()).to_string().hash(&mut hasher);
    Value::Object(self.new.clone()).to_string().hash(&mut hasher);
    hasher.finish()
  }
}

/// Server-side predicate a subscription is opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFilter {
  pub schema: String,
  pub table: String,
  pub event: ChangeKind,
  pub laundry_id: Uuid,
}

impl FeedFilter {
  /// Row updates on `orders` belonging to one shop.
  pub fn order_updates(laundry_id: Uuid) -> Self {
    Self {
      schema: default_schema(),
      table: ORDERS_TABLE.to_string(),
      event: ChangeKind::Update,
      laundry_id,
    }
  }

  /// Filter expression in the transport's `column=eq.value` syntax.
  pub fn expression(&self) -> String {
    format!("laundry_id=eq.{}", self.laundry_id)
  }

  pub fn matches(&self, event: &RealtimeEvent) -> bool {
    event.schema == self.schema
      && event.table == self.table
      && event.event_type == self.event
      && event.laundry_id() == Some(self.laundry_id)
  }
}

/// An open subscription. Dropping it tears the subscription down.
#[derive(Debug)]
pub struct Subscription {
  filter: FeedFilter,
  events: mpsc::Receiver<RealtimeEvent>,
}

impl Subscription {
  pub fn new(filter: FeedFilter, events: mpsc::Receiver<RealtimeEvent>) -> Self {
    Self { filter, events }
  }

  pub fn filter(&self) -> &FeedFilter {
    &self.filter
  }

  /// Next delivered event, or `None` once the transport has closed.
  pub async fn next(&mut self) -> Option<RealtimeEvent> {
    self.events.recv().await
  }
}

/// Transport delivering change events for a filter.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
  async fn subscribe(&self, filter: FeedFilter) -> LaundrifyResult<Subscription>;
}

/// In-process feed: whoever writes rows publishes the change here.
#[derive(Debug, Default)]
pub struct ChannelFeed {
  subscribers: Mutex<Vec<(FeedFilter, mpsc::Sender<RealtimeEvent>)>>,
}

impl ChannelFeed {
  pub fn new() -> Self {
    Self::default()
  }

  /// Delivers `event` to every live subscriber whose filter matches; returns how many.
  #[instrument(name = "ChannelFeed::publish", skip_all, fields(table = %event.table, kind = ?event.event_type))]
  pub fn publish(&self, event: &RealtimeEvent) -> usize {
    let mut subscribers = self.subscribers.lock();
    subscribers.retain(|(_, tx)| !tx.is_closed());

    let mut delivered = 0;
    for (filter, tx) in subscribers.iter() {
      if !filter.matches(event) {
        continue;
      }
      match tx.try_send(event.clone()) {
        Ok(()) => delivered += 1,
        Err(e) => debug!(error = %e, "Dropping event for a saturated subscriber."),
      }
    }
    delivered
  }

  pub fn subscriber_count(&self) -> usize {
    let mut subscribers = self.subscribers.lock();
    subscribers.retain(|(_, tx)| !tx.is_closed());
    subscribers.len()
  }
}

#[async_trait]
impl ChangeFeed for ChannelFeed {
  async fn subscribe(&self, filter: FeedFilter) -> LaundrifyResult<Subscription> {
    let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
    self.subscribers.lock().push((filter.clone(), tx));
    Ok(Subscription::new(filter, rx))
  }
}
