// src/lib.rs

//! Laundrify: the shop-owner side of a laundry ordering service.
//!
//! The crate covers:
//!  - The order lifecycle: a forward-only status chain advanced one step at a
//!    time, with a conditional write and a best-effort customer notification.
//!  - Live reconciliation of order change events into the owner's view, with
//!    exactly-once "new paid order" alerts.
//!  - The payment gateway webhook that marks orders paid.
//!  - Shop profile editing, push registration and payout account setup.
//!
//! Multi-step operations run on a small named-step [`Pipeline`] so every step
//! is traced and can stop the run early.

pub mod context;
pub mod error;
pub mod notify;
pub mod order;
pub mod pipeline;
pub mod profile;
pub mod realtime;
pub mod rest;
pub mod store;
pub mod webhook;

pub use crate::error::{LaundrifyError, LaundrifyResult, PipelineError};
pub use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult};

pub use crate::order::{
  classify, format_amount, Advanced, FulfillmentRoute, Order, OrderLifecycle, OrderStatus, Partition, PaymentMethod,
  PaymentStatus,
};
pub use crate::realtime::{ChangeFeed, LiveOrders, OrdersView, RealtimeEvent};
pub use crate::store::{OrderStore, PaymentLedger, ProfileStore};
pub use crate::webhook::{WebhookOutcome, WebhookProcessor, WebhookReply};
