//! Business logic services.
//!
//! Services contain the core logic separated from HTTP handlers: the ledger
//! store primitives, the transfer/loan engines, the read-only account query
//! service, and credential/token handling.

pub mod account_service;
pub mod auth_service;
pub mod ledger_service;
pub mod transaction_service;
