//! Request-side models with validation at construction
//!
//! Invalid input returns ValidationError, not panic.

pub mod color;
pub mod fields;
pub mod pagination;
pub mod validation;

pub use color::HexColor;
pub use pagination::{Paginated, Pagination, PaginationParams};
pub use validation::ValidationError;
