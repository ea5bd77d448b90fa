//! Hex color validation for habit labels

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// `#rgb` or `#rrggbb`, case-insensitive
static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("invalid color regex")
});

/// Validated color, normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexColor(String);

impl HexColor {
    /// # Example
    /// ```
    /// use tracker_server::models::HexColor;
    ///
    /// assert_eq!(HexColor::new("#22C55E").unwrap().as_str(), "#22c55e");
    /// assert!(HexColor::new("green").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "color" });
        }
        if !HEX_COLOR_RE.is_match(trimmed) {
            return Err(ValidationError::InvalidFormat {
                field: "color",
                reason: "must be a hex color like #22c55e",
            });
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}
