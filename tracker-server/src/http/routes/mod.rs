//! Route handlers organized by resource
//!
//! Every handler under `/api` takes `CurrentUser` and passes its id to the
//! repository; request bodies are validated before any database call.

pub mod ai;
pub mod bills;
pub mod contacts;
pub mod debts;
pub mod events;
pub mod finance;
pub mod gallery;
pub mod habits;
pub mod health;
pub mod investments;
pub mod notes;
pub mod shopping;
pub mod study;
pub mod tasks;

use chrono::{NaiveDate, Utc};
use tracker_core::MonthKey;

/// Today's date (UTC).
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// The month containing today.
pub(crate) fn current_month() -> MonthKey {
    MonthKey::of(today())
}

/// Clamp a look-ahead window given in days.
pub(crate) fn window_days(days: Option<u32>, default: u32, max: u32) -> u32 {
    days.unwrap_or(default).clamp(1, max)
}
