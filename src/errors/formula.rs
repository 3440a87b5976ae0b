//! Formula error types
//!
//! # Examples
//!
//! ```rust
//! use slip_generator::errors::FormulaError;
//!
//! let err = FormulaError::party_not_found("ABC");
//! assert_eq!(err.to_string(), "Party 'ABC' not found");
//! ```

use sea_orm::DbErr;
use thiserror::Error;

/// Errors raised by the formula store, the grade resolver and the slip scaler
#[derive(Error, Debug)]
pub enum FormulaError {
    /// Party or grade lookup miss on a path where absence is an error
    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    /// Unit outside kg, g and mg
    #[error("Invalid unit '{0}': expected one of kg, g, mg")]
    InvalidUnit(String),

    /// Target weight must be strictly positive
    #[error("Invalid target weight {0}: must be greater than zero")]
    InvalidWeight(f64),

    /// Attempt to save a custom grade without entries
    #[error("Custom grade '{grade}' has no formula entries")]
    EmptyFormula { grade: String },

    /// Entry or party input rejected by validation
    #[error("Invalid {field}: {reason}")]
    InvalidEntry { field: String, reason: String },

    /// Privileged action refused by the injected authoriser
    #[error("Not authorised to {0}")]
    Unauthorised(String),

    /// Underlying persistence error
    #[error("Storage failure during {operation}: {source}")]
    Storage {
        operation: String,
        #[source]
        source: DbErr,
    },
}

impl FormulaError {
    pub fn party_not_found(key: impl Into<String>) -> Self {
        FormulaError::NotFound {
            entity: "Party",
            key: key.into(),
        }
    }

    pub fn grade_not_found(party: impl std::fmt::Display, grade: &str) -> Self {
        FormulaError::NotFound {
            entity: "Grade",
            key: format!("{} (party {})", grade, party),
        }
    }

    pub fn invalid_entry(field: impl Into<String>, reason: impl Into<String>) -> Self {
        FormulaError::InvalidEntry {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error is caused by caller input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FormulaError::NotFound { .. }
                | FormulaError::InvalidUnit(_)
                | FormulaError::InvalidWeight(_)
                | FormulaError::EmptyFormula { .. }
                | FormulaError::InvalidEntry { .. }
                | FormulaError::Unauthorised(_)
        )
    }

    /// Stable error code for display layers
    pub fn error_code(&self) -> &'static str {
        match self {
            FormulaError::NotFound { .. } => "NOT_FOUND",
            FormulaError::InvalidUnit(_) => "INVALID_UNIT",
            FormulaError::InvalidWeight(_) => "INVALID_WEIGHT",
            FormulaError::EmptyFormula { .. } => "EMPTY_FORMULA",
            FormulaError::InvalidEntry { .. } => "INVALID_ENTRY",
            FormulaError::Unauthorised(_) => "UNAUTHORISED",
            FormulaError::Storage { .. } => "STORAGE_FAILURE",
        }
    }
}

/// Attach an operation description to a database error
pub trait StorageContext<T> {
    fn storage(self, operation: impl Into<String>) -> Result<T, FormulaError>;

    fn with_storage<F, S>(self, operation: F) -> Result<T, FormulaError>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> StorageContext<T> for Result<T, DbErr> {
    fn storage(self, operation: impl Into<String>) -> Result<T, FormulaError> {
        self.map_err(|source| FormulaError::Storage {
            operation: operation.into(),
            source,
        })
    }

    fn with_storage<F, S>(self, operation: F) -> Result<T, FormulaError>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|source| FormulaError::Storage {
            operation: operation().into(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_messages() {
        assert_eq!(
            FormulaError::party_not_found("ABC").to_string(),
            "Party 'ABC' not found"
        );
        assert_eq!(
            FormulaError::grade_not_found(3, "250R").to_string(),
            "Grade '250R (party 3)' not found"
        );
    }

    #[test]
    fn test_storage_context() {
        let result: Result<(), DbErr> = Err(DbErr::Custom("disk full".to_string()));
        let err = result.storage("delete party 7").unwrap_err();

        assert_eq!(err.error_code(), "STORAGE_FAILURE");
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("delete party 7"));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_client_errors() {
        assert!(FormulaError::InvalidUnit("lb".into()).is_client_error());
        assert!(FormulaError::Unauthorised("delete party".into()).is_client_error());
        assert_eq!(
            FormulaError::EmptyFormula { grade: "X".into() }.error_code(),
            "EMPTY_FORMULA"
        );
    }
}
