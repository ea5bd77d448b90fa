//! Field-level validation shared by every request type.
//!
//! Text is trimmed before checking. Optional text that is blank after
//! trimming becomes `None`.

use rust_decimal::Decimal;

use super::ValidationError;

/// Limit for names and titles
pub const MAX_TITLE_LEN: usize = 200;

/// Limit for free-form text (descriptions, notes)
pub const MAX_TEXT_LEN: usize = 10_000;

/// Limit for journal bodies
pub const MAX_BODY_LEN: usize = 100_000;

/// Required, trimmed, bounded text.
pub fn required_text(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_owned())
}

/// Optional, trimmed, bounded text.
pub fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong { field, max }),
        Some(v) => Ok(Some(v.to_owned())),
    }
}

/// Shape of a Postgres `NUMERIC(precision, scale)` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Numeric {
    pub precision: u32,
    pub scale: u32,
}

/// `NUMERIC(14, 2)`: every money column.
pub const MONEY: Numeric = Numeric { precision: 14, scale: 2 };

/// `NUMERIC(20, 8)`: investment quantities (fractional shares, crypto).
pub const QUANTITY: Numeric = Numeric { precision: 20, scale: 8 };

/// `NUMERIC(6, 3)`: interest rates in percent.
pub const RATE: Numeric = Numeric { precision: 6, scale: 3 };

impl Numeric {
    /// Reject values the column would round or overflow on.
    /// Trailing zeros do not count towards the scale (`1.50` fits two places).
    pub fn check(self, field: &'static str, value: Decimal) -> Result<Decimal, ValidationError> {
        if value.normalize().scale() > self.scale {
            return Err(ValidationError::TooPrecise {
                field,
                scale: self.scale,
            });
        }
        let limit = Decimal::from(10i64.pow(self.precision - self.scale));
        if value.abs() >= limit {
            return Err(ValidationError::TooLarge { field });
        }
        Ok(value)
    }
}

/// Amount strictly greater than zero that fits `column`.
pub fn positive(field: &'static str, value: Decimal, column: Numeric) -> Result<Decimal, ValidationError> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::NotPositive { field });
    }
    column.check(field, value)
}

/// Amount zero or greater that fits `column`.
pub fn non_negative(field: &'static str, value: Decimal, column: Numeric) -> Result<Decimal, ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::Negative { field });
    }
    column.check(field, value)
}

/// Optional link; must be http(s) when present.
pub fn optional_url(field: &'static str, value: Option<&str>) -> Result<Option<String>, ValidationError> {
    let url = optional_text(field, value, 2048)?;
    if let Some(u) = &url {
        if !(u.starts_with("http://") || u.starts_with("https://")) {
            return Err(ValidationError::InvalidFormat {
                field,
                reason: "must start with http:// or https://",
            });
        }
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn required_text_trims() {
        assert_eq!(required_text("title", "  hi  ", 10).unwrap(), "hi");
        assert_eq!(
            required_text("title", "   ", 10).unwrap_err(),
            ValidationError::Empty { field: "title" }
        );
    }

    #[test]
    fn length_counts_chars_not_bytes() {
        assert!(required_text("title", "ééééé", 5).is_ok());
        assert!(matches!(
            required_text("title", "éééééé", 5),
            Err(ValidationError::TooLong { max: 5, .. })
        ));
    }

    #[test]
    fn optional_text_blank_is_none() {
        assert_eq!(optional_text("notes", Some("  "), 10).unwrap(), None);
        assert_eq!(optional_text("notes", None, 10).unwrap(), None);
        assert_eq!(optional_text("notes", Some(" x "), 10).unwrap(), Some("x".into()));
    }

    #[test]
    fn amounts() {
        assert!(positive("amount", dec!(0.01), MONEY).is_ok());
        assert!(positive("amount", Decimal::ZERO, MONEY).is_err());
        assert!(non_negative("price", Decimal::ZERO, MONEY).is_ok());
        assert!(non_negative("price", dec!(-1), MONEY).is_err());
    }

    #[test]
    fn sub_cent_amounts_rejected() {
        assert_eq!(
            positive("amount", dec!(0.004), MONEY).unwrap_err(),
            ValidationError::TooPrecise { field: "amount", scale: 2 }
        );
        assert_eq!(positive("amount", dec!(12.50), MONEY).unwrap(), dec!(12.50));
        assert_eq!(positive("amount", dec!(12.5000), MONEY).unwrap(), dec!(12.5000));
    }

    #[test]
    fn amounts_beyond_column_rejected() {
        assert!(positive("amount", dec!(999999999999.99), MONEY).is_ok());
        assert_eq!(
            positive("amount", dec!(1000000000000), MONEY).unwrap_err(),
            ValidationError::TooLarge { field: "amount" }
        );
        assert!(non_negative("interest_rate", dec!(999.999), RATE).is_ok());
        assert!(non_negative("interest_rate", dec!(1000), RATE).is_err());
        assert!(positive("quantity", dec!(0.00000001), QUANTITY).is_ok());
        assert!(positive("quantity", dec!(0.000000001), QUANTITY).is_err());
    }

    #[test]
    fn urls() {
        assert!(optional_url("url", Some("https://leetcode.com/problems/two-sum")).is_ok());
        assert!(optional_url("url", Some("ftp://x")).is_err());
        assert_eq!(optional_url("url", Some("")).unwrap(), None);
    }
}
