//! HTTP request handlers (route handlers).
//!
//! Each handler receives request data, delegates to the services, and maps
//! the result to a JSON response.

/// Account statement, transfer, loan, and close endpoints
pub mod accounts;
/// Login and registration endpoints
pub mod auth;
/// Health check endpoint
pub mod health;
