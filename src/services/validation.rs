use crate::errors::{FormulaError, FormulaResult};

/// Service for party and grade input validation
pub struct ValidationService;

impl ValidationService {
    /// Trim and validate a party name
    pub fn validate_party_name(name: &str) -> FormulaResult<String> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(FormulaError::invalid_entry(
                "party name",
                "party name cannot be empty",
            ));
        }

        if trimmed.len() > 100 {
            return Err(FormulaError::invalid_entry(
                "party name",
                "party name is too long (max 100 characters)",
            ));
        }

        Ok(trimmed.to_string())
    }

    /// Validate an optional email; blank input counts as absent
    pub fn validate_email(email: Option<&str>) -> FormulaResult<Option<String>> {
        let email = match email.map(str::trim) {
            None | Some("") => return Ok(None),
            Some(email) => email,
        };

        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() != 2 {
            return Err(FormulaError::invalid_entry(
                "email",
                "must contain exactly one @",
            ));
        }

        let (local_part, domain) = (parts[0], parts[1]);
        if local_part.is_empty() {
            return Err(FormulaError::invalid_entry("email", "local part cannot be empty"));
        }
        if domain.is_empty() || !domain.contains('.') {
            return Err(FormulaError::invalid_entry("email", "domain must contain a dot"));
        }

        Ok(Some(email.to_string()))
    }

    /// Trim and validate a grade name
    pub fn validate_grade_name(name: &str) -> FormulaResult<String> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(FormulaError::invalid_entry(
                "grade name",
                "grade name cannot be empty",
            ));
        }

        if trimmed.len() > 100 {
            return Err(FormulaError::invalid_entry(
                "grade name",
                "grade name is too long (max 100 characters)",
            ));
        }

        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_name() {
        assert_eq!(ValidationService::validate_party_name("  ABC ").unwrap(), "ABC");
        assert!(ValidationService::validate_party_name("   ").is_err());
        assert!(ValidationService::validate_party_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_email() {
        assert_eq!(ValidationService::validate_email(None).unwrap(), None);
        assert_eq!(ValidationService::validate_email(Some("  ")).unwrap(), None);
        assert_eq!(
            ValidationService::validate_email(Some("buyer@abc.in")).unwrap(),
            Some("buyer@abc.in".to_string())
        );
        assert!(ValidationService::validate_email(Some("buyer.abc.in")).is_err());
        assert!(ValidationService::validate_email(Some("@abc.in")).is_err());
        assert!(ValidationService::validate_email(Some("buyer@abc")).is_err());
    }

    #[test]
    fn test_grade_name() {
        assert_eq!(ValidationService::validate_grade_name(" 250R ").unwrap(), "250R");
        assert!(ValidationService::validate_grade_name("").is_err());
    }
}
