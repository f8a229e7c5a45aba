//! HTTP layer: Axum router, route handlers, and JSON payloads.
//!
//! Routes cover signup/login, contact CRUD, user CRUD and the report summary.
//! None of them check the issued token.

mod auth;
mod contacts;
mod error;
mod handlers;
mod reports;
mod responses;
mod state;
mod users;


pub use handlers::router;
pub use state::AppState;
