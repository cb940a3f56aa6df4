//! Ledger module containing the balance-mutating transaction service

pub mod service;

pub use service::*;
