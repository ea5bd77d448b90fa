//! Database layer - connection pool, migrations and repositories
//!
//! Every repository statement is scoped by `user_id`; a row owned by
//! another user behaves exactly like a missing row.

pub mod migrations;
pub mod pool;
pub mod repos;

pub use pool::{create_pool, create_pool_with_options};
pub use repos::DbError;
