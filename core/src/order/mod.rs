// core/src/order/mod.rs

//! The order row as stored remotely, its two status axes and the view partitions.

pub mod fulfillment;
pub mod lifecycle;

use crate::error::LaundrifyError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub use fulfillment::{CourierService, FulfillmentRoute};
pub use lifecycle::{Advanced, OrderLifecycle};

pub const DEFAULT_CURRENCY: &str = "NGN";

/// Fulfillment state of an order. Only ever moves forward along
/// `paid -> received -> processing -> ready -> picked_up`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  Paid,
  Received,
  Processing,
  Ready,
  PickedUp,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 5] = [
    OrderStatus::Paid,
    OrderStatus::Received,
    OrderStatus::Processing,
    OrderStatus::Ready,
    OrderStatus::PickedUp,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Paid => "paid",
      OrderStatus::Received => "received",
      OrderStatus::Processing => "processing",
      OrderStatus::Ready => "ready",
      OrderStatus::PickedUp => "picked_up",
    }
  }

  /// The immediate successor in the forward chain, if any.
  pub fn next(self) -> Option<OrderStatus> {
    match self {
      OrderStatus::Paid => Some(OrderStatus::Received),
      OrderStatus::Received => Some(OrderStatus::Processing),
      OrderStatus::Processing => Some(OrderStatus::Ready),
      OrderStatus::Ready => Some(OrderStatus::PickedUp),
      OrderStatus::PickedUp => None,
    }
  }

  pub fn can_advance_to(self, target: OrderStatus) -> bool {
    self.next() == Some(target)
  }

  pub fn partition(self) -> Partition {
    match self {
      OrderStatus::Paid | OrderStatus::Received | OrderStatus::Processing => Partition::Ongoing,
      OrderStatus::Ready | OrderStatus::PickedUp => Partition::Completed,
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = LaundrifyError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OrderStatus::ALL
      .into_iter()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| LaundrifyError::InvalidPayload(format!("unknown order status '{}'", s)))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
  #[default]
  Unpaid,
  Paid,
}

impl PaymentStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      PaymentStatus::Unpaid => "unpaid",
      PaymentStatus::Paid => "paid",
    }
  }
}

/// `offline` for cash orders, otherwise the name of the gateway that took the payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentMethod {
  Offline,
  Gateway(String),
}

impl PaymentMethod {
  pub fn is_offline(&self) -> bool {
    matches!(self, PaymentMethod::Offline)
  }

  /// Badge shown next to the customer name in the order list.
  pub fn badge(&self) -> &'static str {
    match self {
      PaymentMethod::Offline => "CASH",
      PaymentMethod::Gateway(_) => "PAID ONLINE",
    }
  }
}

impl Default for PaymentMethod {
  fn default() -> Self {
    PaymentMethod::Offline
  }
}

impl From<String> for PaymentMethod {
  fn from(value: String) -> Self {
    if value == "offline" {
      PaymentMethod::Offline
    } else {
      PaymentMethod::Gateway(value)
    }
  }
}

impl From<PaymentMethod> for String {
  fn from(value: PaymentMethod) -> Self {
    match value {
      PaymentMethod::Offline => "offline".to_string(),
      PaymentMethod::Gateway(name) => name,
    }
  }
}

/// Presentation grouping of orders. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Partition {
  #[default]
  Ongoing,
  Completed,
}

impl Partition {
  pub fn statuses(self) -> &'static [OrderStatus] {
    match self {
      Partition::Ongoing => &[OrderStatus::Paid, OrderStatus::Received, OrderStatus::Processing],
      Partition::Completed => &[OrderStatus::Ready, OrderStatus::PickedUp],
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Partition::Ongoing => "Ongoing",
      Partition::Completed => "Completed",
    }
  }
}

/// Maps an order to the partition it is listed under.
pub fn classify(order: &Order) -> Partition {
  order.status.partition()
}

/// Rows written by older clients carry explicit nulls in columns that now have defaults.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de> + Default,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Name shown in notices, falling back to "Customer" when none is on file.
pub fn display_name(name: Option<&str>) -> &str {
  name.filter(|n| !n.is_empty()).unwrap_or("Customer")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
  pub id: Uuid,
  pub laundry_id: Uuid,
  #[serde(default)]
  pub customer_name: Option<String>,
  #[serde(default)]
  pub customer_phone: Option<String>,
  #[serde(default)]
  pub customer_address: Option<String>,
  #[serde(default)]
  pub items_summary: Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub total_price: Decimal,
  #[serde(default)]
  pub currency_code: Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub payment_method: PaymentMethod,
  #[serde(default, deserialize_with = "null_as_default")]
  pub payment_status: PaymentStatus,
  pub status: OrderStatus,
  pub created_at: DateTime<Utc>,
}

impl Order {
  pub fn customer_display_name(&self) -> &str {
    display_name(self.customer_name.as_deref())
  }

  /// Marked "NEW REQUEST" until the owner confirms receipt.
  pub fn is_new_request(&self) -> bool {
    self.status == OrderStatus::Paid
  }

  pub fn total_display(&self) -> String {
    format_amount(self.total_price, self.currency_code.as_deref())
  }
}

/// Renders an amount with its currency code, e.g. `NGN 1500.00`.
pub fn format_amount(amount: Decimal, currency: Option<&str>) -> String {
  let code = currency.filter(|c| !c.is_empty()).unwrap_or(DEFAULT_CURRENCY);
  format!("{} {:.2}", code, amount.round_dp(2))
}
