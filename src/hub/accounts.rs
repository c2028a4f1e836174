//! Registration, login and profile management.

use serde::Deserialize;

use crate::auth::{hash_password, verify_password, CredentialVerifier, IssuedToken};
use crate::hub::blocking;
use crate::store::{Account, AccountUpdate, NewAccount, ProfileUpdate, Store};
use crate::types::{AccountId, Error, Result};
use crate::validation::{normalize_email, require, require_exact, validate_password};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A signed-in account with its fresh token.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: IssuedToken,
    pub account: Account,
}

#[derive(Debug, Clone)]
pub struct AccountService {
    store: Store,
    verifier: CredentialVerifier,
    password_rounds: u32,
}

impl AccountService {
    pub fn new(store: Store, verifier: CredentialVerifier, password_rounds: u32) -> Self {
        Self {
            store,
            verifier,
            password_rounds,
        }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<Session> {
        const MISSING: &str = "Please provide all required fields";
        let name = require(req.name.as_deref(), MISSING)?.to_string();
        let email = normalize_email(require(req.email.as_deref(), MISSING)?)?;
        let password = require_exact(req.password.as_deref(), MISSING)?.to_string();
        validate_password(&password)?;

        let rounds = self.password_rounds;
        let password_hash = blocking(move || hash_password(&password, rounds)).await?;

        let store = self.store.clone();
        let account = blocking(move || {
            store.create_account(NewAccount {
                name,
                email,
                password_hash,
            })
        })
        .await?;
        let token = self.verifier.issue(&account.id, account.role)?;

        tracing::info!(account_id = %account.id, "Account registered");
        Ok(Session { token, account })
    }

    pub async fn login(&self, req: LoginRequest) -> Result<Session> {
        const MISSING: &str = "Please provide email and password";
        let email = require(req.email.as_deref(), MISSING)?.to_lowercase();
        let password = require_exact(req.password.as_deref(), MISSING)?.to_string();

        let store = self.store.clone();
        let Some(mut account) = blocking(move || store.find_account_by_email(&email)).await? else {
            tracing::debug!("Login for unknown email");
            return Err(Error::unauthenticated(INVALID_CREDENTIALS));
        };

        let stored = account.password_hash.clone();
        let matches = blocking(move || Ok(verify_password(&password, &stored))).await?;
        if !matches {
            tracing::debug!(account_id = %account.id, "Login with wrong password");
            return Err(Error::unauthenticated(INVALID_CREDENTIALS));
        }
        if !account.is_active {
            return Err(Error::forbidden(
                "Account is deactivated. Please contact support.",
            ));
        }

        let now = chrono::Utc::now();
        let (store, id) = (self.store.clone(), account.id.clone());
        blocking(move || store.record_login(&id, now)).await?;
        account.last_login = Some(now);
        let token = self.verifier.issue(&account.id, account.role)?;

        tracing::info!(account_id = %account.id, "Login successful");
        Ok(Session { token, account })
    }

    pub fn profile(&self, id: &AccountId) -> Result<Account> {
        self.store
            .find_account(id)?
            .ok_or_else(|| Error::not_found("User not found"))
    }

    /// Apply a self-service edit. Blank fields are ignored.
    pub fn update_profile(&self, id: &AccountId, update: ProfileUpdate) -> Result<Account> {
        let update = ProfileUpdate {
            name: update.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            profile_image: update
                .profile_image
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        };
        self.store
            .update_profile(id, &update)?
            .ok_or_else(|| Error::not_found("User not found"))
    }

    pub fn list(&self) -> Result<Vec<Account>> {
        self.store.list_accounts()
    }

    /// Administrative edit of role, plan or activation.
    pub fn update(&self, id: &AccountId, update: &AccountUpdate) -> Result<Account> {
        let account = self
            .store
            .update_account(id, update)?
            .ok_or_else(|| Error::not_found("User not found"))?;
        tracing::info!(
            account_id = %id,
            role = account.role.as_str(),
            plan = account.plan.as_str(),
            active = account.is_active,
            "Account updated by admin"
        );
        Ok(account)
    }
}
