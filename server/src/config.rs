// src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;

pub const DEFAULT_FLW_API_BASE: &str = "https://api.flutterwave.com/v3";

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,

  /// Shared secret the gateway sends back in the `verif-hash` header.
  pub flw_secret_hash: String,
  pub flw_secret_key: String,
  pub flw_api_base: String,

  /// Platform's cut of every split payment, as a fraction.
  pub platform_split: f64,
  pub subaccount_country: String,
  pub subaccount_contact_mobile: String,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL")?;

    let flw_secret_hash = get_env("FLW_SECRET_HASH")?;
    if flw_secret_hash.is_empty() {
      return Err(AppError::Config("FLW_SECRET_HASH must not be empty".to_string()));
    }
    let flw_secret_key = get_env("FLW_SECRET_KEY")?;
    let flw_api_base = get_env("FLW_API_BASE")
      .unwrap_or_else(|_| DEFAULT_FLW_API_BASE.to_string())
      .trim_end_matches('/')
      .to_string();

    let platform_split = get_env("PLATFORM_SPLIT")
      .unwrap_or_else(|_| "0.15".to_string())
      .parse::<f64>()
      .map_err(|e| AppError::Config(format!("Invalid PLATFORM_SPLIT: {}", e)))?;
    if !(0.0..1.0).contains(&platform_split) {
      return Err(AppError::Config(format!(
        "PLATFORM_SPLIT must be in [0, 1), got {}",
        platform_split
      )));
    }
    let subaccount_country = get_env("SUBACCOUNT_COUNTRY").unwrap_or_else(|_| "NG".to_string());
    let subaccount_contact_mobile = get_env("SUBACCOUNT_CONTACT_MOBILE").unwrap_or_else(|_| "08000000000".to_string());

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      flw_secret_hash,
      flw_secret_key,
      flw_api_base,
      platform_split,
      subaccount_country,
      subaccount_contact_mobile,
    })
  }
}
