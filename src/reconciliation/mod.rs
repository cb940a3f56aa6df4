//! Reconciliation module: statement matching, sessions, and backfill

pub mod matcher;
pub mod session;

pub use matcher::*;
pub use session::*;
