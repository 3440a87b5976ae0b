use bcrypt::{hash, verify, DEFAULT_COST};
use strum::Display;
use tracing::warn;

use crate::errors::{FormulaError, FormulaResult};

/// Privileged actions gated by an [`AdminAuthorizer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AdminAction {
    #[strum(serialize = "create party")]
    CreateParty,
    #[strum(serialize = "delete party")]
    DeleteParty,
    #[strum(serialize = "seed formulas")]
    SeedFormula,
}

/// Capability passed into mutating operations that require an administrator
pub trait AdminAuthorizer: Send + Sync {
    fn authorize(&self, action: AdminAction) -> FormulaResult<()>;
}

/// Trusted caller, every action is permitted
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AdminAuthorizer for AllowAll {
    fn authorize(&self, _action: AdminAction) -> FormulaResult<()> {
        Ok(())
    }
}

/// Untrusted caller, every action is refused
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl AdminAuthorizer for DenyAll {
    fn authorize(&self, action: AdminAction) -> FormulaResult<()> {
        Err(FormulaError::Unauthorised(action.to_string()))
    }
}

/// Checks a caller-supplied password against a configured bcrypt hash
pub struct PasswordAuthorizer {
    password_hash: Option<String>,
    supplied: Option<String>,
}

impl PasswordAuthorizer {
    pub fn new(password_hash: Option<String>, supplied: Option<String>) -> Self {
        Self {
            password_hash,
            supplied,
        }
    }

    /// Hash a password for the configuration file
    pub fn hash_password(password: &str) -> anyhow::Result<String> {
        if password.len() < 8 {
            return Err(anyhow::anyhow!(
                "Password must be at least 8 characters long"
            ));
        }

        hash(password, DEFAULT_COST)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
    }
}

impl AdminAuthorizer for PasswordAuthorizer {
    fn authorize(&self, action: AdminAction) -> FormulaResult<()> {
        let (Some(password_hash), Some(supplied)) = (&self.password_hash, &self.supplied) else {
            warn!("Refused {}: no admin password configured or supplied", action);
            return Err(FormulaError::Unauthorised(action.to_string()));
        };

        match verify(supplied, password_hash) {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!("Refused {}: incorrect admin password", action);
                Err(FormulaError::Unauthorised(action.to_string()))
            }
            Err(e) => {
                warn!("Refused {}: unreadable admin password hash: {}", action, e);
                Err(FormulaError::Unauthorised(action.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low cost keeps the tests fast
    fn test_hash(password: &str) -> String {
        hash(password, 4).unwrap()
    }

    #[test]
    fn test_password_authorizer() {
        let hashed = test_hash("correct horse");

        let granted = PasswordAuthorizer::new(Some(hashed.clone()), Some("correct horse".into()));
        assert!(granted.authorize(AdminAction::CreateParty).is_ok());

        let wrong = PasswordAuthorizer::new(Some(hashed.clone()), Some("battery".into()));
        let err = wrong.authorize(AdminAction::DeleteParty).unwrap_err();
        assert_eq!(err.to_string(), "Not authorised to delete party");

        let missing = PasswordAuthorizer::new(Some(hashed), None);
        assert!(missing.authorize(AdminAction::SeedFormula).is_err());
    }

    #[test]
    fn test_unconfigured_hash_refuses() {
        let authorizer = PasswordAuthorizer::new(None, Some("anything".into()));
        assert!(authorizer.authorize(AdminAction::CreateParty).is_err());

        let garbage = PasswordAuthorizer::new(Some("not-a-hash".into()), Some("anything".into()));
        assert!(garbage.authorize(AdminAction::CreateParty).is_err());
    }

    #[test]
    fn test_fixed_capabilities() {
        assert!(AllowAll.authorize(AdminAction::DeleteParty).is_ok());
        assert!(matches!(
            DenyAll.authorize(AdminAction::DeleteParty),
            Err(FormulaError::Unauthorised(_))
        ));
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(PasswordAuthorizer::hash_password("short").is_err());
    }
}
