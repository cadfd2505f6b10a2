// core/src/rest.rs

//! HTTP client for the managed backend: the PostgREST-style table API and
//! the hosted functions. Implements the store and notifier seams.

use crate::error::{LaundrifyError, LaundrifyResult};
use crate::notify::CustomerNotifier;
use crate::order::{Order, OrderStatus, Partition};
use crate::profile::{BankDetails, ShopProfile, SubaccountCreated, SubaccountGateway, SubaccountRequest};
use crate::store::{OrderStore, ProfileStore};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, instrument};
use uuid::Uuid;

pub const ORDER_NOTIFICATION_FUNCTION: &str = "send-order-notif";
pub const CREATE_SUBACCOUNT_FUNCTION: &str = "create-subaccount";

/// Where the backend lives and the public key every request carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
  pub backend_url: String,
  pub anon_key: String,
}

impl ClientConfig {
  pub fn from_env() -> LaundrifyResult<Self> {
    let var = |name: &str| {
      std::env::var(name)
        .map_err(|_| LaundrifyError::Validation(format!("{} must be set", name)))
    };
    Ok(Self {
      backend_url: var("LAUNDRIFY_BACKEND_URL")?.trim_end_matches('/').to_string(),
      anon_key: var("LAUNDRIFY_ANON_KEY")?,
    })
  }
}

pub struct RestClient {
  http: Client,
  config: ClientConfig,
  access_token: RwLock<Option<String>>,
}

impl RestClient {
  pub fn new(config: ClientConfig) -> Self {
    Self {
      http: Client::new(),
      config,
      access_token: RwLock::new(None),
    }
  }

  /// Requests made after this carry the signed-in user's token instead of the anon key.
  pub fn set_access_token(&self, token: Option<String>) {
    *self.access_token.write() = token;
  }

  fn table_url(&self, table: &str) -> String {
    format!("{}/rest/v1/{}", self.config.backend_url, table)
  }

  fn function_url(&self, function: &str) -> String {
    format!("{}/functions/v1/{}", self.config.backend_url, function)
  }

  fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
    let bearer = self
      .access_token
      .read()
      .clone()
      .unwrap_or_else(|| self.config.anon_key.clone());
    request.header("apikey", &self.config.anon_key).bearer_auth(bearer)
  }

  async fn send(&self, operation: &'static str, request: RequestBuilder) -> LaundrifyResult<Response> {
    let response = self
      .authorize(request)
      .send()
      .await
      .map_err(|e| LaundrifyError::remote(operation, e))?;
    if response.status().is_success() {
      return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(LaundrifyError::remote(operation, anyhow!("{} {}", status, error_message(&body))))
  }

  async fn send_json<T: DeserializeOwned>(&self, operation: &'static str, request: RequestBuilder) -> LaundrifyResult<T> {
    self
      .send(operation, request)
      .await?
      .json::<T>()
      .await
      .map_err(|e| LaundrifyError::remote(operation, e))
  }

  async fn patch_laundry(&self, operation: &'static str, laundry_id: Uuid, mut body: Value) -> LaundrifyResult<()> {
    if let Value::Object(fields) = &mut body {
      fields.insert("updated_at".to_string(), json!(Utc::now()));
    }
    let request = self
      .http
      .patch(self.table_url("laundries"))
      .query(&[("id", format!("eq.{}", laundry_id))])
      .json(&body);
    self.send(operation, request).await.map(|_| ())
  }
}

impl std::fmt::Debug for RestClient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RestClient")
      .field("backend_url", &self.config.backend_url)
      .field("signed_in", &self.access_token.read().is_some())
      .finish()
  }
}

/// Pulls `error` or `message` out of a JSON error body, else returns it verbatim.
fn error_message(body: &str) -> String {
  serde_json::from_str::<Value>(body)
    .ok()
    .and_then(|v| {
      v.get("error")
        .or_else(|| v.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
    })
    .unwrap_or_else(|| body.to_string())
}

/// PostgREST `in.(...)` filter over a partition's statuses.
fn status_filter(partition: Partition) -> String {
  let names: Vec<&str> = partition.statuses().iter().map(|s| s.as_str()).collect();
  format!("in.({})", names.join(","))
}

#[async_trait]
impl OrderStore for RestClient {
  #[instrument(skip(self), err(Display))]
  async fn list_orders(&self, laundry_id: Uuid, partition: Partition) -> LaundrifyResult<Vec<Order>> {
    let request = self.http.get(self.table_url("orders")).query(&[
      ("select", "*".to_string()),
      ("laundry_id", format!("eq.{}", laundry_id)),
      ("status", status_filter(partition)),
      ("order", "created_at.desc".to_string()),
    ]);
    let orders: Vec<Order> = self.send_json("list_orders", request).await?;
    debug!(count = orders.len(), "Fetched orders.");
    Ok(orders)
  }

  #[instrument(skip(self), err(Display))]
  async fn update_status(&self, order_id: Uuid, from: OrderStatus, to: OrderStatus) -> LaundrifyResult<bool> {
    let request = self
      .http
      .patch(self.table_url("orders"))
      .query(&[
        ("id", format!("eq.{}", order_id)),
        ("status", format!("eq.{}", from.as_str())),
      ])
      .header("Prefer", "return=representation")
      .json(&json!({ "status": to.as_str() }));
    let rows: Vec<Value> = self.send_json("update_status", request).await?;
    Ok(!rows.is_empty())
  }
}

#[async_trait]
impl ProfileStore for RestClient {
  #[instrument(skip(self), err(Display))]
  async fn load_profile(&self, owner_id: Uuid) -> LaundrifyResult<ShopProfile> {
    let request = self
      .http
      .get(self.table_url("laundries"))
      .query(&[("select", "*".to_string()), ("owner_id", format!("eq.{}", owner_id))]);
    let rows: Vec<ShopProfile> = self.send_json("load_profile", request).await?;
    rows
      .into_iter()
      .next()
      .ok_or_else(|| LaundrifyError::NotFound(format!("Shop profile for owner {}", owner_id)))
  }

  #[instrument(skip(self, profile), fields(laundry_id = %profile.id), err(Display))]
  async fn save_profile(&self, profile: &ShopProfile) -> LaundrifyResult<()> {
    let body = json!({
      "name": profile.name,
      "address": profile.address,
      "description": profile.description,
      "contact_details": profile.contact_details,
      "latitude": profile.latitude,
      "longitude": profile.longitude,
      "currency_code": profile.currency_code,
      "open_time": profile.open_time,
      "close_time": profile.close_time,
      "services": profile.services,
    });
    self.patch_laundry("save_profile", profile.id, body).await
  }

  #[instrument(skip(self, token), fields(clearing = token.is_none()), err(Display))]
  async fn set_push_token(&self, laundry_id: Uuid, token: Option<&str>) -> LaundrifyResult<()> {
    self
      .patch_laundry("set_push_token", laundry_id, json!({ "expo_push_token": token }))
      .await
  }

  #[instrument(skip(self, bank), err(Display))]
  async fn save_bank_details(&self, laundry_id: Uuid, bank: &BankDetails) -> LaundrifyResult<()> {
    let body = serde_json::to_value(bank).map_err(|e| LaundrifyError::remote("save_bank_details", e))?;
    self.patch_laundry("save_bank_details", laundry_id, body).await
  }
}

#[async_trait]
impl CustomerNotifier for RestClient {
  #[instrument(skip(self, order), fields(order_id = %order.id), err(Display))]
  async fn notify_status_change(&self, order: &Order) -> LaundrifyResult<()> {
    let request = self
      .http
      .post(self.function_url(ORDER_NOTIFICATION_FUNCTION))
      .json(&json!({ "record": order, "type": "customer_update" }));
    self.send("notify_status_change", request).await.map(|_| ())
  }
}

#[async_trait]
impl SubaccountGateway for RestClient {
  #[instrument(skip_all, err(Display))]
  async fn create_subaccount(&self, request: &SubaccountRequest) -> LaundrifyResult<SubaccountCreated> {
    let call = self.http.post(self.function_url(CREATE_SUBACCOUNT_FUNCTION)).json(request);
    self.send_json("create_subaccount", call).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partition_filters_use_wire_names() {
    assert_eq!(status_filter(Partition::Ongoing), "in.(paid,received,processing)");
    assert_eq!(status_filter(Partition::Completed), "in.(ready,picked_up)");
  }

  #[test]
  fn error_bodies_prefer_the_error_field() {
    assert_eq!(error_message(r#"{"error":"bad bank"}"#), "bad bank");
    assert_eq!(error_message(r#"{"message":"JWT expired"}"#), "JWT expired");
    assert_eq!(error_message("gateway timeout"), "gateway timeout");
  }

  #[test]
  fn urls_are_built_from_the_backend_root() {
    let client = RestClient::new(ClientConfig {
      backend_url: "https://example.supabase.co".to_string(),
      anon_key: "anon".to_string(),
    });
    assert_eq!(client.table_url("orders"), "https://example.supabase.co/rest/v1/orders");
    assert_eq!(
      client.function_url(ORDER_NOTIFICATION_FUNCTION),
      "https://example.supabase.co/functions/v1/send-order-notif"
    );
  }
}
