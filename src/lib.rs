//! Banking ledger service.
//!
//! A REST API for a small bank: clients authenticate, view their transaction
//! ledger, transfer funds, and request loans; admins can close accounts. The
//! core of the crate is the ledger/transfer engine, which keeps account
//! balances and the append-only transaction log consistent under concurrent
//! writers.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries, row-level locking)
//! - **Authentication**: signed bearer tokens (HS256, 1 hour expiry)
//! - **Money**: `rust_decimal::Decimal`, never floats

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::auth_service::TokenService;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: db::DbPool,
    pub tokens: TokenService,
}

/// Build the HTTP router.
///
/// Account routes sit behind the bearer-token middleware; login, registration
/// and the health check are public.
pub fn app(state: AppState) -> Router {
    let authenticated_routes = Router::new()
        .route(
            "/accounts/user/{user_id}",
            get(handlers::accounts::get_statement),
        )
        .route(
            "/accounts/{account_id}/transfer",
            post(handlers::accounts::transfer),
        )
        .route(
            "/accounts/{account_id}/loan",
            post(handlers::accounts::request_loan),
        )
        .route(
            "/accounts/by-username",
            delete(handlers::accounts::close_account),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/register", post(handlers::auth::register))
        .merge(authenticated_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
