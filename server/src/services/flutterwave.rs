// src/services/flutterwave.rs

//! Flutterwave subaccount registration for split payouts.

use async_trait::async_trait;
use laundrify::profile::{SubaccountCreated, SubaccountGateway, SubaccountRequest};
use laundrify::{LaundrifyError, LaundrifyResult};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

const CREATION_FAILED: &str = "Flutterwave subaccount creation failed";

/// Fixed fields added to every subaccount the platform registers.
#[derive(Debug, Clone)]
pub struct SubaccountTerms {
  pub country: String,
  pub contact_mobile: String,
  pub split_value: f64,
}

#[derive(Debug, Serialize)]
struct CreateSubaccountBody<'a> {
  account_bank: &'a str,
  account_number: &'a str,
  business_name: &'a str,
  business_email: &'a str,
  business_contact: &'a str,
  business_contact_mobile: &'a str,
  country: &'a str,
  split_type: &'static str,
  split_value: f64,
}

#[derive(Debug, Clone)]
pub struct FlutterwaveClient {
  http: reqwest::Client,
  api_base: String,
  secret_key: String,
  terms: SubaccountTerms,
}

impl FlutterwaveClient {
  pub fn new(api_base: impl Into<String>, secret_key: impl Into<String>, terms: SubaccountTerms) -> Self {
    Self {
      http: reqwest::Client::new(),
      api_base: api_base.into(),
      secret_key: secret_key.into(),
      terms,
    }
  }
}

/// `{status: "success", data: {subaccount_id}}` or the gateway's message.
fn read_reply(reply: &Value) -> LaundrifyResult<SubaccountCreated> {
  let message = || {
    reply
      .get("message")
      .and_then(Value::as_str)
      .filter(|m| !m.is_empty())
      .unwrap_or(CREATION_FAILED)
      .to_string()
  };
  if reply.get("status").and_then(Value::as_str) != Some("success") {
    return Err(LaundrifyError::Validation(message()));
  }
  let subaccount_id = match reply.pointer("/data/subaccount_id") {
    Some(Value::String(id)) => id.clone(),
    Some(Value::Number(id)) => id.to_string(),
    _ => return Err(LaundrifyError::Validation(message())),
  };
  Ok(SubaccountCreated { subaccount_id })
}

#[async_trait]
impl SubaccountGateway for FlutterwaveClient {
  #[instrument(name = "FlutterwaveClient::create_subaccount", skip_all, fields(bank = %request.account_bank), err(Display))]
  async fn create_subaccount(&self, request: &SubaccountRequest) -> LaundrifyResult<SubaccountCreated> {
    let body = CreateSubaccountBody {
      account_bank: &request.account_bank,
      account_number: &request.account_number,
      business_name: &request.business_name,
      business_email: &request.business_email,
      business_contact: &request.business_name,
      business_contact_mobile: &self.terms.contact_mobile,
      country: &self.terms.country,
      split_type: "percentage",
      split_value: self.terms.split_value,
    };

    let reply: Value = self
      .http
      .post(format!("{}/subaccounts", self.api_base))
      .bearer_auth(&self.secret_key)
      .json(&body)
      .send()
      .await
      .map_err(|e| LaundrifyError::remote("create_subaccount", e))?
      .json()
      .await
      .map_err(|e| LaundrifyError::remote("create_subaccount", e))?;

    match read_reply(&reply) {
      Ok(created) => {
        info!(subaccount_id = %created.subaccount_id, "Subaccount created.");
        Ok(created)
      }
      Err(e) => {
        warn!(error = %e, "Gateway refused subaccount.");
        Err(e)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn success_reply_yields_subaccount_id() {
    let reply = json!({ "status": "success", "data": { "subaccount_id": "RS_A1B2C3", "id": 2181 } });
    assert_eq!(read_reply(&reply).unwrap().subaccount_id, "RS_A1B2C3");
  }

  #[test]
  fn error_reply_uses_gateway_message_or_fallback() {
    let refused = json!({ "status": "error", "message": "Sorry, that account number is invalid" });
    assert_eq!(
      read_reply(&refused).unwrap_err().to_string(),
      "Sorry, that account number is invalid"
    );
    assert_eq!(read_reply(&json!({})).unwrap_err().to_string(), CREATION_FAILED);
  }

  #[test]
  fn request_body_carries_platform_terms() {
    let body = CreateSubaccountBody {
      account_bank: "044",
      account_number: "0690000031",
      business_name: "Sparkle Cleaners",
      business_email: "owner@sparkle.ng",
      business_contact: "Sparkle Cleaners",
      business_contact_mobile: "08000000000",
      country: "NG",
      split_type: "percentage",
      split_value: 0.15,
    };
    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(value["split_type"], "percentage");
    assert_eq!(value["split_value"], 0.15);
    assert_eq!(value["business_contact"], "Sparkle Cleaners");
  }
}
