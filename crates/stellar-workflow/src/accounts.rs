//! User accounts: registration and password checks.
//!
//! Passwords are stored as a SHA-256 digest of `salt:password` with a random
//! per-account salt.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use stellar_core::user::normalize_email;
use stellar_core::{Credentials, NewUser, Registration, Result, Role, StellarError, User};
use stellar_store::{Store, UserRepo};
use tracing::info;
use uuid::Uuid;

/// Account operations over the relational store.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Sign up a plain user.
    pub async fn register(&self, registration: Registration) -> Result<User> {
        self.create_account(registration, Role::User).await
    }

    /// Create an account with any role. Used for seeding moderators.
    pub async fn create_account(&self, registration: Registration, role: Role) -> Result<User> {
        registration.validate()?;

        let salt = Uuid::new_v4().simple().to_string();
        let new = NewUser {
            full_name: registration.full_name.trim().to_string(),
            email: normalize_email(&registration.email),
            role,
            password_digest: password_digest(&salt, &registration.password),
            password_salt: salt,
        };

        let mut tx = self.store.begin().await?;
        let user = tx.create_user(new).await?;
        tx.commit().await?;

        info!(user_id = user.id, role = %user.role, "account created");
        Ok(user)
    }

    /// Check a login and return the account's user.
    pub async fn authenticate(&self, credentials: Credentials) -> Result<User> {
        let mut tx = self.store.begin().await?;
        let account = tx.find_account(&normalize_email(&credentials.email)).await?;
        tx.commit().await?;

        match account {
            Some(account)
                if password_digest(&account.password_salt, &credentials.password)
                    == account.password_digest =>
            {
                Ok(account.user)
            }
            _ => Err(StellarError::InvalidCredentials),
        }
    }
}

fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stellar_store::InMemoryStore;

    fn registration(email: &str, password: &str) -> Registration {
        Registration {
            full_name: " Ada Lovelace ".to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let accounts = AccountService::new(Arc::new(InMemoryStore::new()));

        let ada = accounts
            .register(registration("Ada@Example.org", "analytical"))
            .await
            .unwrap();
        assert_eq!(ada.full_name, "Ada Lovelace");
        assert_eq!(ada.email, "ada@example.org");
        assert_eq!(ada.role, Role::User);

        let logged_in = accounts
            .authenticate(credentials(" ADA@example.org", "analytical"))
            .await
            .unwrap();
        assert_eq!(logged_in, ada);
    }

    #[tokio::test]
    async fn test_bad_logins() {
        let accounts = AccountService::new(Arc::new(InMemoryStore::new()));
        accounts
            .register(registration("ada@example.org", "analytical"))
            .await
            .unwrap();

        assert_eq!(
            accounts
                .authenticate(credentials("ada@example.org", "difference"))
                .await,
            Err(StellarError::InvalidCredentials)
        );
        assert_eq!(
            accounts
                .authenticate(credentials("babbage@example.org", "analytical"))
                .await,
            Err(StellarError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let accounts = AccountService::new(Arc::new(InMemoryStore::new()));
        accounts
            .register(registration("ada@example.org", "one"))
            .await
            .unwrap();

        assert_eq!(
            accounts
                .register(registration("ADA@example.org", "two"))
                .await,
            Err(StellarError::EmailTaken("ada@example.org".to_string()))
        );
    }

    #[test]
    fn test_digest_depends_on_salt() {
        assert_ne!(password_digest("a", "secret"), password_digest("b", "secret"));
        assert_eq!(password_digest("a", "secret").len(), 64);
    }
}
