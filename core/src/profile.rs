// core/src/profile.rs

//! The shop (laundry) profile: catalog editing, validation and payout setup.

use crate::error::{LaundrifyError, LaundrifyResult};
use crate::order::DEFAULT_CURRENCY;
use crate::store::ProfileStore;
use async_trait::async_trait;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, instrument};
use uuid::Uuid;

pub const DEFAULT_OPEN_TIME: &str = "08:00";
pub const DEFAULT_CLOSE_TIME: &str = "18:00";
pub const DEFAULT_SERVICE_GROUPS: [&str; 3] = ["Wash and Fold", "Ironing", "Dry Clean"];

/// Payout bank codes for Nigerian banks, keyed by display name.
pub const NIGERIAN_BANKS: &[(&str, &str)] = &[
  ("Access Bank", "044"),
  ("Access Bank (Diamond)", "063"),
  ("Citibank Nigeria", "023"),
  ("EcoBank Nigeria", "050"),
  ("Fidelity Bank", "070"),
  ("First Bank of Nigeria", "011"),
  ("First City Monument Bank (FCMB)", "214"),
  ("Globus Bank", "00103"),
  ("GTBank", "058"),
  ("Heritage Bank", "030"),
  ("Jaiz Bank", "301"),
  ("Keystone Bank", "082"),
  ("Kuda Bank", "50211"),
  ("Lotus Bank", "303"),
  ("Moniepoint MFB", "50515"),
  ("MTN Momo PSB", "120003"),
  ("OPay", "999992"),
  ("Optimus Bank", "107"),
  ("PalmPay", "999991"),
  ("Parallex Bank", "104"),
  ("Polaris Bank", "076"),
  ("PremiumTrust Bank", "105"),
  ("Providus Bank", "101"),
  ("Rubies MFB", "125"),
  ("Safe Haven MFB", "51113"),
  ("Sparkle Microfinance Bank", "51310"),
  ("Stanbic IBTC Bank", "221"),
  ("Standard Chartered Bank", "068"),
  ("Sterling Bank", "232"),
  ("Suntrust Bank", "100"),
  ("TAJ Bank", "302"),
  ("Tangerine Money", "51269"),
  ("Titan Bank", "102"),
  ("Union Bank of Nigeria", "032"),
  ("United Bank For Africa (UBA)", "033"),
  ("Unity Bank", "215"),
  ("VFD Microfinance Bank", "566"),
  ("Wema Bank", "035"),
  ("Zenith Bank", "057"),
];

/// Case-insensitive exact match on the bank's display name.
pub fn resolve_bank_code(bank_name: &str) -> Option<&'static str> {
  let wanted = bank_name.trim();
  NIGERIAN_BANKS
    .iter()
    .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
    .map(|(_, code)| *code)
}

/// Three ASCII letters, returned upper-cased.
pub fn normalize_currency(code: &str) -> LaundrifyResult<String> {
  let code = code.trim();
  if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
    return Err(LaundrifyError::Validation(format!(
      "'{}' is not a valid 3-letter currency code (e.g. USD, NGN)",
      code
    )));
  }
  Ok(code.to_ascii_uppercase())
}

/// Accepts `H:MM` or `HH:MM` and returns the zero-padded form.
pub fn normalize_time(value: &str) -> LaundrifyResult<String> {
  NaiveTime::parse_from_str(value.trim(), "%H:%M")
    .map(|t| t.format("%H:%M").to_string())
    .map_err(|_| LaundrifyError::Validation(format!("'{}' is not a valid HH:MM time", value)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceItem {
  pub name: String,
  pub price: i64,
}

/// Named groups of priced services, serialized as a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceCatalog(BTreeMap<String, Vec<ServiceItem>>);

impl Default for ServiceCatalog {
  fn default() -> Self {
    Self(
      DEFAULT_SERVICE_GROUPS
        .iter()
        .map(|g| ((*g).to_string(), Vec::new()))
        .collect(),
    )
  }
}

impl ServiceCatalog {
  pub fn empty() -> Self {
    Self(BTreeMap::new())
  }

  pub fn groups(&self) -> impl Iterator<Item = (&str, &[ServiceItem])> {
    self.0.iter().map(|(name, items)| (name.as_str(), items.as_slice()))
  }

  pub fn group(&self, name: &str) -> Option<&[ServiceItem]> {
    self.0.get(name).map(Vec::as_slice)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn add_group(&mut self, name: &str) -> LaundrifyResult<()> {
    let name = name.trim();
    if name.is_empty() {
      return Err(LaundrifyError::Validation("Enter a category name".to_string()));
    }
    if self.0.contains_key(name) {
      return Err(LaundrifyError::Validation(format!("Category '{}' already exists", name)));
    }
    self.0.insert(name.to_string(), Vec::new());
    Ok(())
  }

  /// Removes the group and all of its items.
  pub fn remove_group(&mut self, name: &str) -> Option<Vec<ServiceItem>> {
    self.0.remove(name)
  }

  /// Appends an item; `price` must parse as a whole number. Unknown groups are created.
  pub fn add_item(&mut self, group: &str, name: &str, price: &str) -> LaundrifyResult<()> {
    let name = name.trim();
    let price = price.trim();
    if name.is_empty() || price.is_empty() {
      return Err(LaundrifyError::Validation("Enter name and price".to_string()));
    }
    let price = price
      .parse::<i64>()
      .map_err(|_| LaundrifyError::Validation(format!("Price '{}' must be a whole number", price)))?;
    self.0.entry(group.to_string()).or_default().push(ServiceItem {
      name: name.to_string(),
      price,
    });
    Ok(())
  }

  pub fn remove_item(&mut self, group: &str, index: usize) -> Option<ServiceItem> {
    let items = self.0.get_mut(group)?;
    (index < items.len()).then(|| items.remove(index))
  }
}

/// One row of `laundries`, the shop owned by the signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopProfile {
  pub id: Uuid,
  pub owner_id: Uuid,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub address: Option<String>,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub contact_details: Option<String>,
  #[serde(default)]
  pub latitude: Option<f64>,
  #[serde(default)]
  pub longitude: Option<f64>,
  #[serde(default)]
  pub currency_code: Option<String>,
  #[serde(default)]
  pub open_time: Option<String>,
  #[serde(default)]
  pub close_time: Option<String>,
  #[serde(default)]
  pub services: Option<ServiceCatalog>,
  #[serde(default, rename = "expo_push_token")]
  pub push_token: Option<String>,
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default)]
  pub account_name: Option<String>,
  #[serde(default)]
  pub account_number: Option<String>,
  #[serde(default)]
  pub bank_name: Option<String>,
  #[serde(default)]
  pub bank_code: Option<String>,
  #[serde(default)]
  pub subaccount_id: Option<String>,
}

impl ShopProfile {
  pub fn new(id: Uuid, owner_id: Uuid) -> Self {
    Self {
      id,
      owner_id,
      name: None,
      address: None,
      description: None,
      contact_details: None,
      latitude: None,
      longitude: None,
      currency_code: None,
      open_time: None,
      close_time: None,
      services: None,
      push_token: None,
      email: None,
      account_name: None,
      account_number: None,
      bank_name: None,
      bank_code: None,
      subaccount_id: None,
    }
  }

  /// Push is considered on exactly when a device token is stored.
  pub fn notifications_enabled(&self) -> bool {
    self.push_token.as_deref().is_some_and(|t| !t.is_empty())
  }

  pub fn currency(&self) -> &str {
    self.currency_code.as_deref().unwrap_or(DEFAULT_CURRENCY)
  }

  pub fn opening_hours(&self) -> (&str, &str) {
    (
      self.open_time.as_deref().unwrap_or(DEFAULT_OPEN_TIME),
      self.close_time.as_deref().unwrap_or(DEFAULT_CLOSE_TIME),
    )
  }

  /// The stored catalog, or the three default groups when none was saved yet.
  pub fn catalog(&self) -> ServiceCatalog {
    self.services.clone().unwrap_or_default()
  }

  pub fn has_payouts(&self) -> bool {
    self.subaccount_id.is_some()
  }
}

/// Pending edits to a profile; nothing is written until [`ProfileEdit::apply`] succeeds.
#[derive(Debug, Clone, Default)]
pub struct ProfileEdit {
  pub name: Option<String>,
  pub address: Option<String>,
  pub description: Option<String>,
  pub contact_details: Option<String>,
  pub coordinates: Option<(f64, f64)>,
  pub currency_code: Option<String>,
  pub open_time: Option<String>,
  pub close_time: Option<String>,
  pub services: Option<ServiceCatalog>,
}

impl ProfileEdit {
  /// Validates every field first, then returns the edited copy.
  pub fn apply(&self, profile: &ShopProfile) -> LaundrifyResult<ShopProfile> {
    let currency = self.currency_code.as_deref().map(normalize_currency).transpose()?;
    let open_time = self.open_time.as_deref().map(normalize_time).transpose()?;
    let close_time = self.close_time.as_deref().map(normalize_time).transpose()?;
    if let Some((lat, lng)) = self.coordinates {
      if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(LaundrifyError::Validation(format!(
          "Coordinates ({}, {}) are out of range",
          lat, lng
        )));
      }
    }

    let mut edited = profile.clone();
    let text = |v: &Option<String>| v.as_ref().map(|s| s.trim().to_string());
    if let Some(name) = text(&self.name) {
      edited.name = Some(name);
    }
    if let Some(address) = text(&self.address) {
      edited.address = Some(address);
    }
    if let Some(description) = text(&self.description) {
      edited.description = Some(description);
    }
    if let Some(contact) = text(&self.contact_details) {
      edited.contact_details = Some(contact);
    }
    if let Some((lat, lng)) = self.coordinates {
      edited.latitude = Some(lat);
      edited.longitude = Some(lng);
    }
    if currency.is_some() {
      edited.currency_code = currency;
    }
    if open_time.is_some() {
      edited.open_time = open_time;
    }
    if close_time.is_some() {
      edited.close_time = close_time;
    }
    if let Some(services) = &self.services {
      edited.services = Some(services.clone());
    }
    Ok(edited)
  }
}

/// Validates and persists a profile edit, returning the saved row.
#[instrument(skip(profiles, edit), fields(laundry_id = %profile.id), err(Display))]
pub async fn save_profile_edit(
  profiles: &dyn ProfileStore,
  profile: &ShopProfile,
  edit: &ProfileEdit,
) -> LaundrifyResult<ShopProfile> {
  let edited = edit.apply(profile)?;
  profiles.save_profile(&edited).await?;
  info!("Shop profile saved.");
  Ok(edited)
}

/// Bank details as stored on the profile after a payout account is set up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
  pub account_name: Option<String>,
  pub account_number: String,
  pub bank_name: String,
  pub bank_code: String,
  pub currency_code: String,
  pub email: String,
  pub contact_details: Option<String>,
  pub subaccount_id: Option<String>,
}

/// Body of the create-subaccount function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubaccountRequest {
  pub account_bank: String,
  pub account_number: String,
  pub business_name: String,
  pub business_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubaccountCreated {
  pub subaccount_id: String,
}

/// Whatever registers a split-payment subaccount with the gateway.
#[async_trait]
pub trait SubaccountGateway: Send + Sync {
  async fn create_subaccount(&self, request: &SubaccountRequest) -> LaundrifyResult<SubaccountCreated>;
}

/// The payout form as the owner filled it in.
#[derive(Debug, Clone, Default)]
pub struct BankSetup {
  pub account_name: Option<String>,
  pub account_number: String,
  pub bank_name: String,
  pub bank_code: Option<String>,
  pub currency_code: Option<String>,
  pub business_email: String,
  pub business_mobile: Option<String>,
}

impl BankSetup {
  /// Checks the form and fills in the bank code for NGN payouts.
  pub fn prepare(&self, profile: &ShopProfile) -> LaundrifyResult<(SubaccountRequest, BankDetails)> {
    let account_number = self.account_number.trim();
    let bank_name = self.bank_name.trim();
    if account_number.is_empty() || bank_name.is_empty() {
      return Err(LaundrifyError::Validation("Please fill in all bank details.".to_string()));
    }
    let email = self.business_email.trim();
    if email.is_empty() {
      return Err(LaundrifyError::Validation("Business email is required.".to_string()));
    }

    let currency = normalize_currency(self.currency_code.as_deref().unwrap_or_else(|| profile.currency()))?;
    let given_code = self.bank_code.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let bank_code = match (given_code, currency.as_str()) {
      (Some(code), _) => code.to_string(),
      (None, DEFAULT_CURRENCY) => resolve_bank_code(bank_name)
        .ok_or_else(|| {
          LaundrifyError::Validation(format!(
            "Bank '{}' is not recognised; please select your bank from the list.",
            bank_name
          ))
        })?
        .to_string(),
      (None, _) => return Err(LaundrifyError::Validation("A bank code is required.".to_string())),
    };

    let request = SubaccountRequest {
      account_bank: bank_code.clone(),
      account_number: account_number.to_string(),
      business_name: profile.name.clone().unwrap_or_else(|| "Laundry Owner".to_string()),
      business_email: email.to_string(),
    };
    let details = BankDetails {
      account_name: self.account_name.clone().filter(|n| !n.trim().is_empty()),
      account_number: account_number.to_string(),
      bank_name: bank_name.to_string(),
      bank_code,
      currency_code: currency,
      email: email.to_string(),
      contact_details: self.business_mobile.clone(),
      subaccount_id: None,
    };
    Ok((request, details))
  }
}

/// Creates the payout subaccount, then records the bank details on the profile.
///
/// Nothing is saved when validation or the gateway call fails.
#[instrument(skip_all, fields(laundry_id = %profile.id), err(Display))]
pub async fn setup_payouts(
  gateway: &dyn SubaccountGateway,
  profiles: &dyn ProfileStore,
  profile: &ShopProfile,
  form: &BankSetup,
) -> LaundrifyResult<BankDetails> {
  let (request, mut details) = form.prepare(profile)?;
  let created = gateway.create_subaccount(&request).await?;
  details.subaccount_id = Some(created.subaccount_id);
  profiles.save_bank_details(profile.id, &details).await?;
  info!(bank_code = %details.bank_code, "Payout account set up.");
  Ok(details)
}
