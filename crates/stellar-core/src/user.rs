//! User accounts.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StellarError};
use crate::types::{Role, UserId};

/// A registered user, as exposed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    /// Login name; stored trimmed and lowercase.
    pub email: String,
    pub role: Role,
}

/// A stored account: the public user plus its salted password digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub user: User,
    pub password_salt: String,
    /// Lowercase hex SHA-256 of `salt:password`.
    pub password_digest: String,
}

/// Insert form of an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub password_salt: String,
    pub password_digest: String,
}

/// Sign-up request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    pub fn validate(&self) -> Result<()> {
        if self.full_name.trim().is_empty() {
            return Err(StellarError::Validation(
                "full_name must not be empty".to_string(),
            ));
        }
        let email = normalize_email(&self.email);
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => {
                return Err(StellarError::Validation(format!(
                    "'{}' is not an email address",
                    self.email
                )))
            }
        }
        if self.password.is_empty() {
            return Err(StellarError::Validation(
                "password must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Login request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Canonical form of an email used for lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(full_name: &str, email: &str, password: &str) -> Registration {
        Registration {
            full_name: full_name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_registration_validate() {
        assert!(registration("Ada Lovelace", "ada@example.org", "secret")
            .validate()
            .is_ok());
        assert!(registration(" ", "ada@example.org", "secret").validate().is_err());
        assert!(registration("Ada", "ada.example.org", "secret").validate().is_err());
        assert!(registration("Ada", "@example.org", "secret").validate().is_err());
        assert!(registration("Ada", "ada@example.org", "").validate().is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.ORG "), "ada@example.org");
    }

    #[test]
    fn test_user_json() {
        let user = User {
            id: 1,
            full_name: "Ada".into(),
            email: "ada@example.org".into(),
            role: Role::User,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["full_name"], "Ada");
        assert!(json.get("password_digest").is_none());
    }
}
