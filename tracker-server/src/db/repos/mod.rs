//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Every statement binds `user_id`; other users' rows are invisible
//! - Paginated lists use `COUNT(*) OVER()` for the total (single query)
//! - Uniqueness is enforced by the DB and surfaces as `DbError::Conflict`
//! - Read-modify-write operations run in a transaction with `FOR UPDATE`

pub mod bills;
pub mod contacts;
pub mod debts;
pub mod events;
pub mod gallery;
pub mod habits;
pub mod investments;
pub mod notes;
pub mod shopping;
pub mod study;
pub mod tasks;
pub mod transactions;

pub use bills::{Bill, BillInput, BillRepo};
pub use contacts::{Contact, ContactInput, ContactRepo};
pub use debts::{Debt, DebtInput, DebtRepo};
pub use events::{Event, EventInput, EventRepo};
pub use gallery::{GalleryInput, GalleryItem, GalleryRepo};
pub use habits::{Habit, HabitInput, HabitLog, HabitRepo};
pub use investments::{Investment, InvestmentInput, InvestmentRepo};
pub use notes::{Note, NoteInput, NoteRepo};
pub use shopping::{ShoppingInput, ShoppingItem, ShoppingRepo};
pub use study::{DesignCase, DesignCaseInput, Problem, ProblemInput, StudyRepo};
pub use tasks::{Task, TaskFilter, TaskInput, TaskRepo};
pub use transactions::{Budget, BudgetInput, Transaction, TransactionFilter, TransactionInput, TransactionRepo};

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use crate::models::{Paginated, Pagination};

/// SQLSTATE for a value too wide for its NUMERIC column.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict on {constraint}")]
    Conflict { constraint: String },

    /// CHECK violation or numeric overflow: the input was bad, not the database.
    #[error("rejected by {constraint}")]
    Rejected { constraint: String },

    #[error(transparent)]
    Domain(#[from] tracker_core::TrackerError),
}

impl DbError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return Self::Conflict {
                    constraint: db.constraint().unwrap_or("unique key").to_owned(),
                };
            }
            if db.is_check_violation() {
                return Self::Rejected {
                    constraint: db.constraint().unwrap_or("check constraint").to_owned(),
                };
            }
            if db.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) {
                return Self::Rejected {
                    constraint: "numeric range".to_owned(),
                };
            }
        }
        Self::Sqlx(e)
    }
}

/// Build a page from rows that carry a `total` window column.
pub(crate) fn paginate<T>(rows: Vec<PgRow>, page: Pagination) -> Result<Paginated<T>, DbError>
where
    T: for<'r> FromRow<'r, PgRow>,
{
    let total = match rows.first() {
        Some(row) => row.try_get::<i64, _>("total")?,
        None => 0,
    };
    let items = rows
        .iter()
        .map(T::from_row)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Paginated::new(items, total, page))
}

/// Delete a user-owned row by id; `NotFound` when nothing matched.
pub(crate) async fn delete_owned(
    pool: &PgPool,
    table: &'static str,
    resource: &'static str,
    user_id: Uuid,
    id: Uuid,
) -> Result<(), DbError> {
    let sql = format!("DELETE FROM {table} WHERE id = $1 AND user_id = $2");
    let result = sqlx::query(&sql)
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found(resource, id));
    }
    Ok(())
}

/// Escape `%`, `_` and `\` for use inside an ILIKE pattern.
pub(crate) fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("ann"), "%ann%");
    }

    #[test]
    fn not_found_display() {
        let err = DbError::not_found("task", "abc");
        assert_eq!(err.to_string(), "not found: task 'abc'");
    }
}
