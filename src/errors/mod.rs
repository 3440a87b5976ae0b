//! Domain error types for the slip generator
//!
//! Every error carries enough context (operation name and key identifiers)
//! for a caller to show a meaningful message.
//!
//! # Error Categories
//!
//! - **FormulaError**: store, resolution, validation and scaling failures
//!
//! # Examples
//!
//! ```rust
//! use slip_generator::errors::FormulaError;
//!
//! let err = FormulaError::InvalidWeight(-2.0);
//! assert!(err.is_client_error());
//! assert_eq!(err.error_code(), "INVALID_WEIGHT");
//! ```

pub mod formula;

pub use formula::{FormulaError, StorageContext};

/// Result type alias for formula operations
pub type FormulaResult<T> = Result<T, FormulaError>;
