//! Text-backed enums shared by the API and the database.
//!
//! Each enum is stored as `TEXT` in Postgres (with a CHECK constraint) and
//! serialized as its snake_case label in JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident as $label:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant, )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Get string representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $text, )+
                }
            }
        }

        impl FromStr for $name {
            type Err = TrackerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok(Self::$variant), )+
                    other => Err(TrackerError::unknown_variant($label, other)),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        #[cfg(feature = "db")]
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "db")]
        impl<'q> sqlx::Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <&str as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }

        #[cfg(feature = "db")]
        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let raw = <&str as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
                Ok(raw.parse::<$name>()?)
            }
        }
    };
}

text_enum! {
    /// Task priority
    pub enum Priority as "priority" {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

text_enum! {
    /// Task workflow state
    pub enum TaskStatus as "task status" {
        Todo => "todo",
        InProgress => "in_progress",
        Done => "done",
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Todo
    }
}

text_enum! {
    /// Direction of money flow for a transaction
    pub enum TransactionKind as "transaction kind" {
        Income => "income",
        Expense => "expense",
    }
}

text_enum! {
    /// How often a bill repeats
    pub enum Recurrence as "recurrence" {
        None => "none",
        Weekly => "weekly",
        Monthly => "monthly",
        Yearly => "yearly",
    }
}

impl Default for Recurrence {
    fn default() -> Self {
        Self::Monthly
    }
}

text_enum! {
    pub enum InvestmentKind as "investment kind" {
        Stock => "stock",
        Etf => "etf",
        Crypto => "crypto",
        Bond => "bond",
        Fund => "fund",
        Other => "other",
    }
}

impl Default for InvestmentKind {
    fn default() -> Self {
        Self::Other
    }
}

text_enum! {
    /// Whether the user owes the money or lent it out
    pub enum DebtDirection as "debt direction" {
        Owed => "owed",
        Lent => "lent",
    }
}

impl Default for DebtDirection {
    fn default() -> Self {
        Self::Owed
    }
}

text_enum! {
    /// Study item difficulty
    pub enum Difficulty as "difficulty" {
        Easy => "easy",
        Medium => "medium",
        Hard => "hard",
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::Medium
    }
}

text_enum! {
    /// Self-graded result of a spaced-repetition review
    pub enum ReviewOutcome as "review outcome" {
        Again => "again",
        Hard => "hard",
        Good => "good",
        Easy => "easy",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_from_str() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), *status);
        }
        for kind in InvestmentKind::ALL {
            assert_eq!(kind.to_string().parse::<InvestmentKind>().unwrap(), *kind);
        }
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = "urgent".parse::<Priority>().unwrap_err();
        assert_eq!(err.to_string(), "invalid priority value: 'urgent'");
    }

    #[test]
    fn serde_uses_snake_case_labels() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");

        let kind: TransactionKind = serde_json::from_str("\"expense\"").unwrap();
        assert_eq!(kind, TransactionKind::Expense);
    }

    #[test]
    fn defaults() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
        assert_eq!(Recurrence::default(), Recurrence::Monthly);
    }
}
