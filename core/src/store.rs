// core/src/store.rs

//! Seams to the managed relational store. Durability and query semantics live
//! on the other side of these traits.

use crate::error::LaundrifyResult;
use crate::order::{Order, OrderStatus, Partition};
use crate::profile::{BankDetails, ShopProfile};
use async_trait::async_trait;
use uuid::Uuid;

/// Order rows as visible to the shop owner.
#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Orders of one shop whose status falls in `partition`, newest first.
  async fn list_orders(&self, laundry_id: Uuid, partition: Partition) -> LaundrifyResult<Vec<Order>>;

  /// Writes `to` only if the row still has status `from`.
  /// Returns `false` when no row matched.
  async fn update_status(&self, order_id: Uuid, from: OrderStatus, to: OrderStatus) -> LaundrifyResult<bool>;
}

/// The single trusted writer of `payment_status`. Only the webhook host holds one.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
  /// Sets `payment_status = 'paid'` and `status = 'received'`; returns rows touched.
  async fn mark_paid(&self, order_id: Uuid) -> LaundrifyResult<u64>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
  async fn load_profile(&self, owner_id: Uuid) -> LaundrifyResult<ShopProfile>;

  async fn save_profile(&self, profile: &ShopProfile) -> LaundrifyResult<()>;

  /// Overwrites the device push token; `None` clears it.
  async fn set_push_token(&self, laundry_id: Uuid, token: Option<&str>) -> LaundrifyResult<()>;

  async fn save_bank_details(&self, laundry_id: Uuid, bank: &BankDetails) -> LaundrifyResult<()>;
}
