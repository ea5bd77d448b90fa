//! tracker-core: domain types and computations for the daily tracker.
//!
//! Nothing in here touches the network; the server crate feeds rows in and
//! serializes what comes out.

pub mod config;
pub mod dates;
pub mod error;
pub mod finance;
pub mod habits;
pub mod kinds;
pub mod study;

pub use config::TrackerConfig;
pub use dates::MonthKey;
pub use error::{Result, TrackerError};
pub use finance::{BudgetProgress, BudgetStatus, CategoryTotal, LedgerEntry, MonthlySummary};
pub use habits::HabitStats;
pub use kinds::{
    DebtDirection, Difficulty, InvestmentKind, Priority, Recurrence, ReviewOutcome, TaskStatus,
    TransactionKind,
};
pub use study::Schedule;
