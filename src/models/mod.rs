//! Data models representing database entities and API bodies.

use serde::Serialize;

/// User and credential models
pub mod user;
/// Bank account model and statement views
pub mod account;
/// Ledger transaction model and money-movement requests
pub mod transaction;

/// Plain `{message}` body returned by the mutating endpoints.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}
