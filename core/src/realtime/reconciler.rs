// core/src/realtime/reconciler.rs

//! Folds realtime order events into the owner's order list.
//!
//! An event matters only when it moves an order *into* `paid`: the new status is
//! `paid` and the old one is not. Anything else (edits to an already-paid order,
//! a redundant `paid -> paid`, cash orders skipping `paid`) leaves the view alone.
//! Qualifying events merge by order id, so a redelivered event can never insert
//! the same order twice. Exact redeliveries are also remembered and suppressed,
//! so the alert does not sound twice either.

use crate::notify::Notice;
use crate::order::{display_name, FulfillmentRoute, Order, OrderStatus, Partition};
use crate::realtime::{ChangeKind, RealtimeEvent, ORDERS_TABLE};
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, warn};
use uuid::Uuid;

const RECENT_EVENT_CAPACITY: usize = 256;

/// Side effect requested by a reduction, performed by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
  PlayAlert,
  ShowNotice(Notice),
}

/// Bounded memory of event fingerprints already acted upon.
#[derive(Debug, Clone, Default)]
struct RecentEvents {
  order: VecDeque<u64>,
  seen: HashSet<u64>,
}

impl RecentEvents {
  /// Records `fingerprint`; returns `false` if it was already known.
  fn insert(&mut self, fingerprint: u64) -> bool {
    if !self.seen.insert(fingerprint) {
      return false;
    }
    self.order.push_back(fingerprint);
    if self.order.len() > RECENT_EVENT_CAPACITY {
      if let Some(evicted) = self.order.pop_front() {
        self.seen.remove(&evicted);
      }
    }
    true
  }
}

/// What the Orders screen shows for one shop.
#[derive(Debug, Clone)]
pub struct OrdersView {
  laundry_id: Uuid,
  partition: Partition,
  orders: Vec<Order>,
  has_new_order: bool,
  recent: RecentEvents,
}

/// The view after an event, plus what the caller should do about it.
#[derive(Debug, Clone)]
pub struct Reduction {
  pub view: OrdersView,
  pub effects: Vec<Effect>,
}

/// Pure fold of one event into a view.
pub fn reduce(mut view: OrdersView, event: &RealtimeEvent) -> Reduction {
  let effects = view.apply(event);
  Reduction { view, effects }
}

/// True when the event moves a row into `paid`.
pub fn enters_paid(event: &RealtimeEvent) -> bool {
  let paid = OrderStatus::Paid.as_str();
  event.new_status() == Some(paid) && event.old_status() != Some(paid)
}

impl OrdersView {
  pub fn new(laundry_id: Uuid) -> Self {
    Self {
      laundry_id,
      partition: Partition::Ongoing,
      orders: Vec::new(),
      has_new_order: false,
      recent: RecentEvents::default(),
    }
  }

  pub fn laundry_id(&self) -> Uuid {
    self.laundry_id
  }

  pub fn partition(&self) -> Partition {
    self.partition
  }

  pub fn orders(&self) -> &[Order] {
    &self.orders
  }

  pub fn order(&self, order_id: Uuid) -> Option<&Order> {
    self.orders.iter().find(|o| o.id == order_id)
  }

  /// Set when a paid order arrives while "Completed" is on screen.
  pub fn has_new_order(&self) -> bool {
    self.has_new_order
  }

  /// Switches the visible partition. The list is emptied until the next fetch.
  pub fn switch_partition(&mut self, partition: Partition) {
    if partition == Partition::Ongoing {
      self.has_new_order = false;
    }
    if partition != self.partition {
      self.partition = partition;
      self.orders.clear();
    }
  }

  /// Replaces the list with a fresh fetch of the current partition.
  pub fn replace_orders(&mut self, orders: Vec<Order>) {
    self.orders = orders;
  }

  /// Records the owner's fulfillment choice for a ready order; the view moves to "Completed".
  pub fn choose_fulfillment(&mut self, route: FulfillmentRoute) -> Option<&'static str> {
    self.switch_partition(Partition::Completed);
    route.handoff_link()
  }

  /// Reflects an owner-made change: replaced in place, or dropped if it left this partition.
  pub fn apply_local_update(&mut self, order: &Order) {
    if order.status.partition() == self.partition {
      self.upsert(order.clone());
    } else {
      self.orders.retain(|o| o.id != order.id);
    }
  }

  fn upsert(&mut self, order: Order) {
    match self.orders.iter_mut().find(|o| o.id == order.id) {
      Some(existing) => *existing = order,
      None => self.orders.insert(0, order),
    }
  }

  /// Applies one event in place and returns the side effects it calls for.
  pub fn apply(&mut self, event: &RealtimeEvent) -> Vec<Effect> {
    if event.table != ORDERS_TABLE || event.event_type != ChangeKind::Update {
      return Vec::new();
    }
    if let Some(owner) = event.laundry_id() {
      if owner != self.laundry_id {
        debug!(%owner, "Ignoring event for another shop.");
        return Vec::new();
      }
    }
    if !enters_paid(event) {
      return Vec::new();
    }

    let name = event.new.get("customer_name").and_then(Value::as_str);
    let notice = Notice {
      title: "New Paid Order!".to_string(),
      message: format!("Customer {} has just paid for an order!", display_name(name)),
    };
    if !self.recent.insert(event.fingerprint()) {
      debug!("Suppressing redelivered event.");
      return Vec::new();
    }

    if self.partition == Partition::Ongoing {
      match event.new_order() {
        Ok(order) => self.upsert(order),
        Err(e) => warn!(error = %e, "Paid event carried an unreadable row; list left for the next refresh."),
      }
    } else {
      self.has_new_order = true;
    }

    vec![Effect::PlayAlert, Effect::ShowNotice(notice)]
  }
}
