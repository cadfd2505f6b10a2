// src/db.rs

//! Postgres side of the payment webhook. The service role bypasses row-level
//! security, so this is the only writer of `payment_status`.

use async_trait::async_trait;
use laundrify::{LaundrifyError, LaundrifyResult, PaymentLedger};
use sqlx::PgPool;
use tracing::{error, instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PgPaymentLedger {
  pool: PgPool,
}

impl PgPaymentLedger {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl PaymentLedger for PgPaymentLedger {
  #[instrument(name = "PgPaymentLedger::mark_paid", skip(self), err(Display))]
  async fn mark_paid(&self, order_id: Uuid) -> LaundrifyResult<u64> {
    let done = sqlx::query("UPDATE orders SET payment_status = 'paid', status = 'received' WHERE id = $1")
      .bind(order_id)
      .execute(&self.pool)
      .await
      .map_err(|e| {
        error!("Failed to mark order {} paid: {}", order_id, e);
        LaundrifyError::remote("mark_paid", e)
      })?;
    Ok(done.rows_affected())
  }
}
