//! tracker-server: HTTP API for the daily tracker
//!
//! Postgres-backed CRUD for tasks, finances, habits, contacts, events,
//! gallery, journal, shopping and study items. Every row belongs to a user;
//! the user id arrives on each request in the `x-user-id` header.

pub mod db;
pub mod http;
pub mod models;

pub use db::{create_pool, create_pool_with_options, DbError};
pub use http::{build_router, run_server, AppState, ServerConfig, ServerError};
