// src/services/mod.rs
pub mod flutterwave;
